#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Field camera video index
//!
//! A [`VideoMetaInformation`] carries the intrinsics of a camera, a default pose and the
//! ordered list of its frames. Each [`FrameEntry`] may hold a monotonic and a UTC timestamp,
//! a pose overriding the default one and a [`MotionStatus`].
//!
//! The [`index`] module answers "which frame / which pose at time T" in either clock base,
//! the [`clock`] module translates between the two bases.
//!
//! ## Example
//!
//! ```rust
//! use fieldcam_geometry::{IntrinsicParameters, Pose3D};
//! use fieldcam_video::{FrameEntry, TimeBase, VideoMetaInformation, VideoSourceId};
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
//! let mut video = VideoMetaInformation::new(
//!     VideoSourceId::external("tribune"),
//!     intrinsics,
//!     Pose3D::new(vec![0.0; 3], vec![0.0, 0.0, 5.0]),
//! );
//! for ts in [100, 200, 300] {
//!     video.push_frame(FrameEntry::new(ts));
//! }
//!
//! assert_eq!(video.index_at_or_before(250, TimeBase::Monotonic)?, Some(1));
//! assert_eq!(video.index_at_or_before(50, TimeBase::Monotonic)?, None);
//! # Ok::<(), fieldcam_video::VideoError>(())
//! ```

#[doc(inline)]
pub use fieldcam_geometry as geometry;

/// Translation between the monotonic and the UTC clocks.
pub mod clock;

mod error;
pub use error::VideoError;

/// Timestamp and pose lookups over the frames of a video.
pub mod index;

/// Reading and writing records as json or length-delimited binary.
pub mod io;

mod source;
pub use source::{RobotCameraIdentifier, RobotIdentifier, VideoSource, VideoSourceId};

mod video;
pub use video::{FrameEntry, MotionStatus, VideoMetaInformation};

pub use clock::{CaptureClock, ClockOffset, TimeBase};
pub use index::{PoseResolution, ResolvedPose};
