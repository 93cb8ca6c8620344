use glam::{DMat3, DVec3};

use crate::GeometryError;

/// Represents the polynomial distortion parameters of a camera, in the OpenCV convention.
///
/// The coefficient vector is ordered `k1, k2, p1, p2[, k3[, k4, k5, k6[, s1, s2, s3, s4[, tau_x,
/// tau_y]]]]`, so the accepted lengths are 0, 4, 5, 8, 12 and 14. Missing trailing terms are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolynomialDistortion {
    /// The first radial distortion coefficient
    pub k1: f64,
    /// The second radial distortion coefficient
    pub k2: f64,
    /// The third radial distortion coefficient
    pub k3: f64,
    /// The first radial coefficient of the rational denominator
    pub k4: f64,
    /// The second radial coefficient of the rational denominator
    pub k5: f64,
    /// The third radial coefficient of the rational denominator
    pub k6: f64,
    /// The first tangential distortion coefficient
    pub p1: f64,
    /// The second tangential distortion coefficient
    pub p2: f64,
    /// Thin prism coefficients `s1, s2, s3, s4`
    pub thin_prism: [f64; 4],
    /// Sensor tilt angles `tau_x, tau_y` in radians
    pub tilt: [f64; 2],
}

impl PolynomialDistortion {
    /// Coefficient vector lengths understood by the model.
    pub const SUPPORTED_LENGTHS: [usize; 6] = [0, 4, 5, 8, 12, 14];

    /// Builds the model from an OpenCV ordered coefficient vector.
    ///
    /// # Errors
    ///
    /// [`GeometryError::InvalidArgument`] if the length is not one of
    /// [`SUPPORTED_LENGTHS`](Self::SUPPORTED_LENGTHS) or a coefficient is not finite.
    pub fn from_coefficients(coefficients: &[f64]) -> Result<Self, GeometryError> {
        if !Self::SUPPORTED_LENGTHS.contains(&coefficients.len()) {
            return Err(GeometryError::InvalidArgument(format!(
                "unsupported number of distortion coefficients: {} (expected one of {:?})",
                coefficients.len(),
                Self::SUPPORTED_LENGTHS
            )));
        }
        if !coefficients.iter().all(|c| c.is_finite()) {
            return Err(GeometryError::InvalidArgument(
                "distortion coefficients must be finite".to_string(),
            ));
        }

        let c = |i: usize| coefficients.get(i).copied().unwrap_or(0.0);
        Ok(Self {
            k1: c(0),
            k2: c(1),
            p1: c(2),
            p2: c(3),
            k3: c(4),
            k4: c(5),
            k5: c(6),
            k6: c(7),
            thin_prism: [c(8), c(9), c(10), c(11)],
            tilt: [c(12), c(13)],
        })
    }

    /// Returns true if the model leaves every point unchanged.
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Radial scale applied at squared normalized radius `r2`.
    ///
    /// A non-positive value means the polynomial has folded over and the distorted point no
    /// longer moves away from the optical axis with the undistorted one.
    pub fn radial_factor(&self, r2: f64) -> f64 {
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        (1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6)
            / (1.0 + self.k4 * r2 + self.k5 * r4 + self.k6 * r6)
    }

    /// Distort a point given in normalized image coordinates (`x / z`, `y / z`).
    ///
    /// # Returns
    ///
    /// The distorted normalized coordinates.
    pub fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let kr = self.radial_factor(r2);
        let [s1, s2, s3, s4] = self.thin_prism;

        let a1 = 2.0 * x * y;
        let a2 = r2 + 2.0 * x * x;
        let a3 = r2 + 2.0 * y * y;

        let xd = x * kr + self.p1 * a1 + self.p2 * a2 + s1 * r2 + s2 * r4;
        let yd = y * kr + self.p1 * a3 + self.p2 * a1 + s3 * r2 + s4 * r4;

        if self.tilt == [0.0, 0.0] {
            return (xd, yd);
        }

        let v = tilt_matrix(self.tilt[0], self.tilt[1]) * DVec3::new(xd, yd, 1.0);
        let inv_z = if v.z != 0.0 { 1.0 / v.z } else { 1.0 };
        (v.x * inv_z, v.y * inv_z)
    }
}

fn mat3_from_rows(rows: [[f64; 3]; 3]) -> DMat3 {
    DMat3::from_cols_array_2d(&rows).transpose()
}

/// Projection matrix of a sensor tilted by `tau_x` around x then `tau_y` around y.
fn tilt_matrix(tau_x: f64, tau_y: f64) -> DMat3 {
    let (s_x, c_x) = tau_x.sin_cos();
    let (s_y, c_y) = tau_y.sin_cos();

    let rot_x = mat3_from_rows([[1.0, 0.0, 0.0], [0.0, c_x, s_x], [0.0, -s_x, c_x]]);
    let rot_y = mat3_from_rows([[c_y, 0.0, -s_y], [0.0, 1.0, 0.0], [s_y, 0.0, c_y]]);
    let rot_xy = rot_y * rot_x;

    // third column of rot_xy: (r02, r12, r22)
    let r = rot_xy.z_axis;
    let proj_z = mat3_from_rows([[r.z, 0.0, -r.x], [0.0, r.z, -r.y], [0.0, 0.0, 1.0]]);

    proj_z * rot_xy
}
