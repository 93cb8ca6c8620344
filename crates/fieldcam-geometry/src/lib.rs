#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Field camera geometry
//!
//! Conversions between the compact camera records exchanged by the capture tools
//! ([`IntrinsicParameters`], [`Pose3D`]) and the dense forms used for projection
//! (a 3x3 camera matrix and a [`glam::DAffine3`] rigid transform), plus the
//! projection of field points into the image.
//!
//! ## Example
//!
//! ```rust
//! use fieldcam_geometry::{field_to_image, IntrinsicParameters, Pose3D};
//! use glam::DVec3;
//!
//! let intrinsics = IntrinsicParameters {
//!     focal_x: 600.0,
//!     focal_y: 600.0,
//!     center_x: 320,
//!     center_y: 240,
//!     img_width: 640,
//!     img_height: 480,
//!     distortion: vec![],
//! };
//! // field origin one unit in front of the camera
//! let pose = Pose3D::new(vec![0.0, 0.0, 0.0], vec![0.0, 0.0, 1.0]);
//!
//! let projection = field_to_image(DVec3::ZERO, &intrinsics, &pose)?;
//! assert!(projection.valid);
//! assert_eq!(projection.point.to_array(), [320.0, 240.0]);
//! # Ok::<(), fieldcam_geometry::GeometryError>(())
//! ```

/// Camera record bundling intrinsics and a single pose.
pub mod camera;

/// Polynomial lens distortion model.
pub mod distortion;

mod error;
pub use error::GeometryError;

/// Intrinsic parameters and the dense camera model.
pub mod intrinsics;

/// Rigid pose records and conversions.
pub mod pose;

/// Field to camera to image projection.
pub mod projection;

pub use camera::CameraMetaInformation;
pub use distortion::PolynomialDistortion;
pub use intrinsics::{intrinsics_from_camera_matrix, CameraModel, ImageSize, IntrinsicParameters};
pub use pose::{pose_to_rigid, rigid_to_pose, Pose3D, RotationEncoding};
pub use projection::{
    field_to_camera, field_to_image, is_point_valid_for_correction, CorrectionParams, Projection,
    Projector,
};
