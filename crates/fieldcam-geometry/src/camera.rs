use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::{GeometryError, ImageSize, IntrinsicParameters, Pose3D, Projection, Projector};

/// A single calibrated view: intrinsics and one pose.
///
/// Used where no temporal indexing is needed, e.g. a static external camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct CameraMetaInformation {
    /// The intrinsic parameters of the camera.
    pub camera_parameters: IntrinsicParameters,
    /// The field to camera pose.
    pub pose: Pose3D,
}

impl CameraMetaInformation {
    /// Creates a new camera record.
    pub fn new(camera_parameters: IntrinsicParameters, pose: Pose3D) -> Self {
        Self {
            camera_parameters,
            pose,
        }
    }

    /// Returns the image size of the camera.
    pub fn image_size(&self) -> ImageSize {
        self.camera_parameters.image_size()
    }

    /// Builds a projector for this view.
    pub fn projector(&self) -> Result<Projector, GeometryError> {
        Projector::new(&self.camera_parameters, &self.pose)
    }

    /// Projects a field point into the image of this view.
    pub fn field_to_image(&self, point_in_field: DVec3) -> Result<Projection, GeometryError> {
        self.projector()?.field_to_image(point_in_field)
    }
}
