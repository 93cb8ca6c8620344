use glam::{DAffine3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::{
    CameraModel, GeometryError, ImageSize, IntrinsicParameters, PolynomialDistortion, Pose3D,
};

/// The image position of a projected field point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// The pixel position.
    ///
    /// Always computed, even when `valid` is false. For points behind the camera this is the
    /// image of the point mirrored through the optical center, kept for diagnostics only.
    pub point: DVec2,
    /// True if the point is in front of the camera and lands inside the image.
    pub valid: bool,
}

/// Thresholds used by [`Projector::is_valid_for_correction`].
///
/// Can be read from a config file; missing fields keep their default value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectionParams {
    /// Minimum distance in pixels between the projection and the image border.
    pub border_margin: f64,
    /// Minimum depth along the optical axis, in field units.
    pub min_depth: f64,
    /// Maximum radius in normalized image coordinates (`tan` of the off-axis angle).
    pub max_normalized_radius: f64,
}

impl Default for CorrectionParams {
    fn default() -> Self {
        Self {
            border_margin: 10.0,
            min_depth: 1.0e-3,
            max_normalized_radius: 2.0,
        }
    }
}

/// Convert a point from the field basis to the camera basis.
///
/// The point faces the camera iff the returned `z` is positive.
pub fn field_to_camera(point_in_field: DVec3, field_to_camera: &DAffine3) -> DVec3 {
    field_to_camera.transform_point3(point_in_field)
}

/// Project a field point into the image of a camera.
///
/// # Errors
///
/// * [`GeometryError::InvalidArgument`] if the image size is zero or an input is not finite.
/// * [`GeometryError::MalformedPose`] if the pose record is malformed.
pub fn field_to_image(
    point_in_field: DVec3,
    intrinsics: &IntrinsicParameters,
    pose: &Pose3D,
) -> Result<Projection, GeometryError> {
    Projector::new(intrinsics, pose)?.field_to_image(point_in_field)
}

/// Check whether a field point can serve as a calibration correction sample.
///
/// Uses [`CorrectionParams::default`]; see [`Projector::is_valid_for_correction`].
pub fn is_point_valid_for_correction(
    point_in_field: DVec3,
    pose: &Pose3D,
    intrinsics: &IntrinsicParameters,
) -> Result<bool, GeometryError> {
    Projector::new(intrinsics, pose)?
        .is_valid_for_correction(point_in_field, &CorrectionParams::default())
}

/// A camera ready to project: intrinsics, parsed distortion and the field to camera transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Projector {
    focal_length: DVec2,
    principal_point: DVec2,
    image_size: ImageSize,
    distortion: PolynomialDistortion,
    extrinsic: DAffine3,
}

impl Projector {
    /// Create a projector from the compact camera records.
    ///
    /// # Errors
    ///
    /// Fails fast on a zero image size, non-finite intrinsics, an unsupported distortion vector
    /// or a malformed pose.
    pub fn new(intrinsics: &IntrinsicParameters, pose: &Pose3D) -> Result<Self, GeometryError> {
        let model = CameraModel::from_intrinsics(intrinsics)?;
        Self::from_model(&model, pose.to_rigid()?)
    }

    /// Create a projector from a dense camera model and a field to camera transform.
    pub fn from_model(model: &CameraModel, extrinsic: DAffine3) -> Result<Self, GeometryError> {
        if model.image_size.is_empty() {
            return Err(GeometryError::InvalidArgument(format!(
                "cannot project into an empty image ({}x{})",
                model.image_size.width, model.image_size.height
            )));
        }
        if !extrinsic.is_finite() {
            return Err(GeometryError::InvalidArgument(
                "extrinsic transform must be finite".to_string(),
            ));
        }

        Ok(Self {
            focal_length: model.focal_length(),
            principal_point: model.principal_point(),
            image_size: model.image_size,
            distortion: model.polynomial_distortion()?,
            extrinsic,
        })
    }

    /// The field to camera transform.
    pub fn extrinsic(&self) -> &DAffine3 {
        &self.extrinsic
    }

    /// The image size.
    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    /// Convert a point from the field basis to the camera basis.
    pub fn field_to_camera(&self, point_in_field: DVec3) -> DVec3 {
        field_to_camera(point_in_field, &self.extrinsic)
    }

    /// Project a point given in the camera basis, with distortion.
    ///
    /// No visibility check is done: a point with negative depth yields the image of its mirror
    /// through the optical center, a point with zero depth is projected as if at unit depth.
    pub fn camera_to_image(&self, point_in_camera: DVec3) -> DVec2 {
        let normalized = normalize(point_in_camera);
        let (xd, yd) = self.distortion.distort(normalized.x, normalized.y);
        self.focal_length * DVec2::new(xd, yd) + self.principal_point
    }

    /// Project a field point into the image.
    ///
    /// The returned point is flagged invalid if it lies behind the camera (`z <= 0`) or outside
    /// `[0, width) x [0, height)`.
    ///
    /// # Errors
    ///
    /// [`GeometryError::InvalidArgument`] if the point is not finite.
    pub fn field_to_image(&self, point_in_field: DVec3) -> Result<Projection, GeometryError> {
        check_finite(point_in_field)?;

        let point_in_camera = self.field_to_camera(point_in_field);
        let point = self.camera_to_image(point_in_camera);
        let valid = point_in_camera.z > 0.0 && self.image_size.contains(point);

        Ok(Projection { point, valid })
    }

    /// Stricter check used before taking a point as a calibration correction sample.
    ///
    /// The point must be at least `min_depth` in front of the camera, within
    /// `max_normalized_radius` of the optical axis, in the region where the radial distortion
    /// is still monotonic, and project at least `border_margin` pixels inside the image.
    pub fn is_valid_for_correction(
        &self,
        point_in_field: DVec3,
        params: &CorrectionParams,
    ) -> Result<bool, GeometryError> {
        check_finite(point_in_field)?;

        let point_in_camera = self.field_to_camera(point_in_field);
        if point_in_camera.z <= params.min_depth.max(0.0) {
            log::trace!("correction sample rejected, behind camera: {point_in_camera}");
            return Ok(false);
        }

        let r2 = normalize(point_in_camera).length_squared();
        if r2 > params.max_normalized_radius * params.max_normalized_radius {
            log::trace!("correction sample rejected, too far off axis: r2 = {r2}");
            return Ok(false);
        }
        if self.distortion.radial_factor(r2) <= 0.0 {
            log::trace!("correction sample rejected, distortion folds over at r2 = {r2}");
            return Ok(false);
        }

        let point = self.camera_to_image(point_in_camera);
        Ok(self
            .image_size
            .contains_with_margin(point, params.border_margin))
    }
}

/// Divide by depth; a zero depth leaves the point unscaled.
fn normalize(point_in_camera: DVec3) -> DVec2 {
    let z = point_in_camera.z;
    let inv_z = if z != 0.0 { 1.0 / z } else { 1.0 };
    point_in_camera.truncate() * inv_z
}

fn check_finite(point: DVec3) -> Result<(), GeometryError> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::InvalidArgument(format!(
            "point must be finite, got {point}"
        )))
    }
}
