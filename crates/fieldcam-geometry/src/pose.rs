use std::fmt;

use glam::{DAffine3, DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// Quaternions shorter than this cannot be normalised into a rotation.
const QUATERNION_NORM_EPSILON: f64 = 1.0e-12;

/// A compact rigid pose record, mapping the field referential to the camera referential.
///
/// The rotation is either a 3 element Rodrigues rotation vector (axis * angle, radians) or a
/// 4 element quaternion ordered `qw, qx, qy, qz`. The translation is the position of the field
/// origin expressed in the camera frame.
///
/// The record is a plain data contract: its lengths are only checked when it is converted
/// with [`pose_to_rigid`].
#[derive(
    Debug, Clone, PartialEq, Default, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Pose3D {
    /// Rodrigues vector `[rx, ry, rz]` or quaternion `[qw, qx, qy, qz]`.
    pub rotation: Vec<f64>,
    /// Translation `[tx, ty, tz]`.
    pub translation: Vec<f64>,
}

/// The rotation encoding written by [`rigid_to_pose`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationEncoding {
    /// 3 element Rodrigues rotation vector, the canonical compact form.
    #[default]
    RotationVector,
    /// 4 element quaternion `qw, qx, qy, qz`.
    Quaternion,
}

impl Pose3D {
    /// Creates a pose record from raw rotation and translation values.
    pub fn new(rotation: Vec<f64>, translation: Vec<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// Creates a pose record from a Rodrigues vector and a translation.
    pub fn from_rvec_tvec(rvec: [f64; 3], tvec: [f64; 3]) -> Self {
        Self::new(rvec.to_vec(), tvec.to_vec())
    }

    /// Creates a pose record from a rigid transform, using the Rodrigues encoding.
    pub fn from_rigid(transform: &DAffine3) -> Self {
        rigid_to_pose(transform, RotationEncoding::RotationVector)
    }

    /// Decodes the record into a rigid transform.
    ///
    /// See [`pose_to_rigid`].
    pub fn to_rigid(&self) -> Result<DAffine3, GeometryError> {
        pose_to_rigid(self)
    }

    /// Returns the pose as a Rodrigues vector and a translation, converting quaternions.
    pub fn to_rvec_tvec(&self) -> Result<([f64; 3], [f64; 3]), GeometryError> {
        let transform = self.to_rigid()?;
        let tvec = transform.translation.to_array();
        if let [rx, ry, rz] = self.rotation.as_slice() {
            return Ok(([*rx, *ry, *rz], tvec));
        }
        Ok((rotation_vector(&transform.matrix3), tvec))
    }

    /// Returns true if the rotation is stored as a quaternion.
    pub fn is_quaternion(&self) -> bool {
        self.rotation.len() == 4
    }
}

impl fmt::Display for Pose3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.rotation.len() {
            3 => "rvec",
            4 => "quat",
            _ => "rotation",
        };
        write!(
            f,
            "{kind}: {:?}, translation: {:?}",
            self.rotation, self.translation
        )
    }
}

/// Decode a pose record into a rigid transform (rotation matrix + translation).
///
/// A 3 element rotation goes through the Rodrigues exponential map, a 4 element one is read as
/// `qw, qx, qy, qz` and normalised.
///
/// # Errors
///
/// * [`GeometryError::MalformedPose`] if the rotation length is not 3 or 4, or the translation
///   length is not 3.
/// * [`GeometryError::InvalidArgument`] if a value is not finite or the quaternion has zero norm.
///
/// Example:
///
/// ```
/// use fieldcam_geometry::{pose_to_rigid, Pose3D};
/// use glam::DVec3;
///
/// let pose = Pose3D::new(vec![0.0, 0.0, std::f64::consts::FRAC_PI_2], vec![1.0, 0.0, 0.0]);
/// let transform = pose_to_rigid(&pose)?;
/// let p = transform.transform_point3(DVec3::X);
/// assert!((p - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-12);
/// # Ok::<(), fieldcam_geometry::GeometryError>(())
/// ```
pub fn pose_to_rigid(pose: &Pose3D) -> Result<DAffine3, GeometryError> {
    let translation = match pose.translation.as_slice() {
        [x, y, z] => DVec3::new(*x, *y, *z),
        values => {
            return Err(GeometryError::MalformedPose(format!(
                "translation has {} values, expected 3",
                values.len()
            )))
        }
    };

    let rotation = match pose.rotation.as_slice() {
        [rx, ry, rz] => {
            check_finite(pose)?;
            DQuat::from_scaled_axis(DVec3::new(*rx, *ry, *rz))
        }
        [qw, qx, qy, qz] => {
            check_finite(pose)?;
            let norm = (qw * qw + qx * qx + qy * qy + qz * qz).sqrt();
            if norm < QUATERNION_NORM_EPSILON {
                return Err(GeometryError::InvalidArgument(
                    "quaternion has zero norm".to_string(),
                ));
            }
            DQuat::from_xyzw(qx / norm, qy / norm, qz / norm, qw / norm)
        }
        values => {
            return Err(GeometryError::MalformedPose(format!(
                "rotation has {} values, expected 3 (rotation vector) or 4 (quaternion)",
                values.len()
            )))
        }
    };

    Ok(DAffine3::from_mat3_translation(
        DMat3::from_quat(rotation),
        translation,
    ))
}

/// Encode a rigid transform as a pose record.
///
/// PRECONDITION: `transform.matrix3` is a rotation matrix (orthonormal, determinant +1).
///
/// The rotation part of the output is canonical but not unique: the Rodrigues vector is chosen
/// with an angle in `[0, pi]`. At exactly `pi` both `axis * pi` and `-axis * pi` describe the same
/// rotation and either may be returned, so a pose round trip reproduces the transform, not
/// necessarily the original encoding.
pub fn rigid_to_pose(transform: &DAffine3, encoding: RotationEncoding) -> Pose3D {
    let translation = transform.translation.to_array().to_vec();
    let rotation = match encoding {
        RotationEncoding::RotationVector => rotation_vector(&transform.matrix3).to_vec(),
        RotationEncoding::Quaternion => {
            let q = canonical_quaternion(&transform.matrix3);
            vec![q.w, q.x, q.y, q.z]
        }
    };
    Pose3D::new(rotation, translation)
}

fn check_finite(pose: &Pose3D) -> Result<(), GeometryError> {
    if pose
        .rotation
        .iter()
        .chain(pose.translation.iter())
        .all(|v| v.is_finite())
    {
        Ok(())
    } else {
        Err(GeometryError::InvalidArgument(format!(
            "pose contains non-finite values: {pose}"
        )))
    }
}

/// Rotation matrix to quaternion with a non-negative scalar part.
fn canonical_quaternion(rotation: &DMat3) -> DQuat {
    let q = DQuat::from_mat3(rotation).normalize();
    if q.w < 0.0 {
        -q
    } else {
        q
    }
}

/// Rotation matrix to Rodrigues vector (logarithm map).
fn rotation_vector(rotation: &DMat3) -> [f64; 3] {
    canonical_quaternion(rotation).to_scaled_axis().to_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::Rng;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_same_transform(a: &DAffine3, b: &DAffine3) {
        let probes = [
            DVec3::ZERO,
            DVec3::X,
            DVec3::Y,
            DVec3::Z,
            DVec3::new(-2.5, 4.0, 0.3),
        ];
        for p in probes {
            let d = a.transform_point3(p) - b.transform_point3(p);
            assert!(d.length() < 1e-9, "transforms differ by {d} at {p}");
        }
    }

    #[test]
    fn test_rotation_vector_decode() -> Result<(), GeometryError> {
        let pose = Pose3D::new(vec![FRAC_PI_2, 0.0, 0.0], vec![1.0, 2.0, 3.0]);
        let transform = pose.to_rigid()?;

        // rotation about x by 90 degrees maps y onto z
        let rotated = transform.matrix3 * DVec3::Y;
        assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rotated.z, 1.0, epsilon = 1e-12);
        assert_eq!(transform.translation, DVec3::new(1.0, 2.0, 3.0));
        Ok(())
    }

    #[test]
    fn test_quaternion_decode_matches_rotation_vector() -> Result<(), GeometryError> {
        let half = FRAC_PI_2 / 2.0;
        // qw, qx, qy, qz for 90 degrees about z, deliberately not unit length
        let quat = Pose3D::new(
            vec![2.0 * half.cos(), 0.0, 0.0, 2.0 * half.sin()],
            vec![0.0, 0.0, 5.0],
        );
        let rvec = Pose3D::new(vec![0.0, 0.0, FRAC_PI_2], vec![0.0, 0.0, 5.0]);
        assert_same_transform(&quat.to_rigid()?, &rvec.to_rigid()?);
        Ok(())
    }

    #[test]
    fn test_malformed_rotation() {
        for len in [0, 1, 2, 5, 9] {
            let pose = Pose3D::new(vec![0.1; len], vec![0.0; 3]);
            assert!(matches!(
                pose_to_rigid(&pose),
                Err(GeometryError::MalformedPose(_))
            ));
        }
    }

    #[test]
    fn test_malformed_translation() {
        let pose = Pose3D::new(vec![0.0; 3], vec![0.0; 2]);
        assert!(matches!(
            pose_to_rigid(&pose),
            Err(GeometryError::MalformedPose(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        let nan = Pose3D::new(vec![f64::NAN, 0.0, 0.0], vec![0.0; 3]);
        assert!(matches!(
            pose_to_rigid(&nan),
            Err(GeometryError::InvalidArgument(_))
        ));
        let zero_quat = Pose3D::new(vec![0.0; 4], vec![0.0; 3]);
        assert!(matches!(
            pose_to_rigid(&zero_quat),
            Err(GeometryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_roundtrip_random_poses() -> Result<(), GeometryError> {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let rvec = [
                rng.random_range(-2.0..2.0),
                rng.random_range(-2.0..2.0),
                rng.random_range(-2.0..2.0),
            ];
            let tvec = [
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
            ];
            let pose = Pose3D::from_rvec_tvec(rvec, tvec);
            let transform = pose.to_rigid()?;

            for encoding in [RotationEncoding::RotationVector, RotationEncoding::Quaternion] {
                let encoded = rigid_to_pose(&transform, encoding);
                assert_same_transform(&encoded.to_rigid()?, &transform);
            }
        }
        Ok(())
    }

    #[test]
    fn test_roundtrip_at_half_turn() -> Result<(), GeometryError> {
        // angle == pi: the sign of the returned axis is not determined
        let pose = Pose3D::new(vec![0.0, PI, 0.0], vec![0.5, 0.0, 0.0]);
        let transform = pose.to_rigid()?;
        let back = Pose3D::from_rigid(&transform);

        assert_relative_eq!(back.rotation[1].abs(), PI, epsilon = 1e-9);
        assert_same_transform(&back.to_rigid()?, &transform);
        Ok(())
    }

    #[test]
    fn test_rigid_to_pose_default_is_rotation_vector() {
        let pose = Pose3D::from_rigid(&DAffine3::IDENTITY);
        assert_eq!(pose.rotation.len(), 3);
        assert!(!pose.is_quaternion());
        assert_eq!(pose.translation, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_to_rvec_tvec_from_quaternion() -> Result<(), GeometryError> {
        let s = (0.3f64).sin();
        let pose = Pose3D::new(vec![(0.3f64).cos(), s, 0.0, 0.0], vec![1.0, 1.0, 1.0]);
        let (rvec, tvec) = pose.to_rvec_tvec()?;
        assert_relative_eq!(rvec[0], 0.6, epsilon = 1e-12);
        assert_relative_eq!(rvec[1], 0.0, epsilon = 1e-12);
        assert_eq!(tvec, [1.0, 1.0, 1.0]);
        Ok(())
    }

    #[test]
    fn test_display() {
        let pose = Pose3D::new(vec![0.0, 0.0, 1.0], vec![1.0, 2.0, 3.0]);
        assert_eq!(
            pose.to_string(),
            "rvec: [0.0, 0.0, 1.0], translation: [1.0, 2.0, 3.0]"
        );
    }
}
