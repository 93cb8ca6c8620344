/// An error type for the geometry module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The pose record does not hold a 3 or 4 element rotation and a 3 element translation.
    #[error("Malformed pose: {0}")]
    MalformedPose(String),

    /// A numeric input is out of its valid domain (zero image size, non-finite value, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
