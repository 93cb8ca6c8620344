use glam::{DMat3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::{GeometryError, PolynomialDistortion};

/// The compact intrinsic record of a camera, as exchanged between tools.
///
/// # Fields
///
/// * `focal_x`, `focal_y` - The focal lengths in pixels
/// * `center_x`, `center_y` - The principal point in whole pixels
/// * `img_width`, `img_height` - The image size in pixels
/// * `distortion` - Polynomial coefficients in OpenCV order (`k1, k2, p1, p2, k3, ...`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct IntrinsicParameters {
    /// The focal length in the x direction
    pub focal_x: f64,
    /// The focal length in the y direction
    pub focal_y: f64,
    /// The x coordinate of the principal point
    pub center_x: u32,
    /// The y coordinate of the principal point
    pub center_y: u32,
    /// The image width
    pub img_width: u32,
    /// The image height
    pub img_height: u32,
    /// The distortion coefficients
    #[serde(default)]
    pub distortion: Vec<f64>,
}

impl IntrinsicParameters {
    /// Returns the image size declared by the record.
    pub fn image_size(&self) -> ImageSize {
        ImageSize {
            width: self.img_width,
            height: self.img_height,
        }
    }

    /// Converts the record into its dense form.
    ///
    /// See [`CameraModel::from_intrinsics`].
    pub fn to_camera_model(&self) -> Result<CameraModel, GeometryError> {
        CameraModel::from_intrinsics(self)
    }
}

/// Image size in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    /// The width of the image
    pub width: u32,
    /// The height of the image
    pub height: u32,
}

impl ImageSize {
    /// Returns true if either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns true if `point` lies in `[0, width) x [0, height)`.
    pub fn contains(&self, point: DVec2) -> bool {
        self.contains_with_margin(point, 0.0)
    }

    /// Returns true if `point` lies at least `margin` pixels inside the image.
    pub fn contains_with_margin(&self, point: DVec2, margin: f64) -> bool {
        point.x >= margin
            && point.y >= margin
            && point.x < self.width as f64 - margin
            && point.y < self.height as f64 - margin
    }
}

/// The dense camera model: camera matrix, distortion vector and image size.
///
/// The camera matrix has the form `[[fx, 0, cx], [0, fy, cy], [0, 0, 1]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraModel {
    /// The 3x3 camera matrix
    pub camera_matrix: DMat3,
    /// The distortion coefficients, OpenCV order
    pub distortion: Vec<f64>,
    /// The image size
    pub image_size: ImageSize,
}

impl CameraModel {
    /// Create the dense model from an intrinsic record.
    ///
    /// # Errors
    ///
    /// [`GeometryError::InvalidArgument`] if a focal length or a distortion coefficient is not
    /// finite. The image size is not checked here; projection requires it to be non-zero.
    pub fn from_intrinsics(intrinsics: &IntrinsicParameters) -> Result<Self, GeometryError> {
        let IntrinsicParameters {
            focal_x,
            focal_y,
            center_x,
            center_y,
            ..
        } = *intrinsics;

        if !focal_x.is_finite() || !focal_y.is_finite() {
            return Err(GeometryError::InvalidArgument(format!(
                "focal lengths must be finite, got ({focal_x}, {focal_y})"
            )));
        }
        if !intrinsics.distortion.iter().all(|c| c.is_finite()) {
            return Err(GeometryError::InvalidArgument(
                "distortion coefficients must be finite".to_string(),
            ));
        }

        let camera_matrix = DMat3::from_cols(
            DVec3::new(focal_x, 0.0, 0.0),
            DVec3::new(0.0, focal_y, 0.0),
            DVec3::new(center_x as f64, center_y as f64, 1.0),
        );

        Ok(Self {
            camera_matrix,
            distortion: intrinsics.distortion.clone(),
            image_size: intrinsics.image_size(),
        })
    }

    /// Converts back to the compact record, rounding the principal point.
    pub fn to_intrinsics(&self) -> Result<IntrinsicParameters, GeometryError> {
        intrinsics_from_camera_matrix(&self.camera_matrix, &self.distortion, self.image_size)
    }

    /// The focal lengths `(fx, fy)`.
    pub fn focal_length(&self) -> DVec2 {
        DVec2::new(self.camera_matrix.x_axis.x, self.camera_matrix.y_axis.y)
    }

    /// The principal point `(cx, cy)`.
    pub fn principal_point(&self) -> DVec2 {
        self.camera_matrix.z_axis.truncate()
    }

    /// Parses the distortion vector into the polynomial model.
    pub fn polynomial_distortion(&self) -> Result<PolynomialDistortion, GeometryError> {
        PolynomialDistortion::from_coefficients(&self.distortion)
    }
}

/// Build the compact intrinsic record from a dense camera matrix.
///
/// The principal point is rounded to the nearest whole pixel: sub-pixel precision is lost.
/// Skew and the last row of the matrix are ignored.
///
/// # Errors
///
/// [`GeometryError::InvalidArgument`] if a matrix entry is not finite or the rounded principal
/// point does not fit an unsigned pixel coordinate.
pub fn intrinsics_from_camera_matrix(
    camera_matrix: &DMat3,
    distortion: &[f64],
    image_size: ImageSize,
) -> Result<IntrinsicParameters, GeometryError> {
    if !camera_matrix.is_finite() {
        return Err(GeometryError::InvalidArgument(
            "camera matrix must be finite".to_string(),
        ));
    }

    let to_pixel = |v: f64, name: &str| -> Result<u32, GeometryError> {
        let rounded = v.round();
        if rounded < 0.0 || rounded > u32::MAX as f64 {
            return Err(GeometryError::InvalidArgument(format!(
                "principal point {name} = {v} is not a valid pixel coordinate"
            )));
        }
        Ok(rounded as u32)
    };

    Ok(IntrinsicParameters {
        focal_x: camera_matrix.x_axis.x,
        focal_y: camera_matrix.y_axis.y,
        center_x: to_pixel(camera_matrix.z_axis.x, "cx")?,
        center_y: to_pixel(camera_matrix.z_axis.y, "cy")?,
        img_width: image_size.width,
        img_height: image_size.height,
        distortion: distortion.to_vec(),
    })
}
