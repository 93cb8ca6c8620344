use fieldcam_geometry::GeometryError;

use crate::TimeBase;

/// An error type for the video module.
#[derive(thiserror::Error, Debug)]
pub enum VideoError {
    /// The frame index is outside `[0, frame count)`.
    #[error("Frame index {index} out of range for a video of {len} frames")]
    OutOfRange {
        /// The requested index
        index: usize,
        /// The number of frames
        len: usize,
    },

    /// The requested clock field is unset on a frame that was accessed.
    #[error("Frame {index} has no {base} timestamp")]
    MissingTimestamp {
        /// The frame index
        index: usize,
        /// The requested clock
        base: TimeBase,
    },

    /// A frame timestamp is smaller than the one of a preceding frame.
    #[error("The {base} timestamp of frame {index} is smaller than a preceding one")]
    NonMonotonicTimestamps {
        /// The first frame going backwards
        index: usize,
        /// The clock checked
        base: TimeBase,
    },

    /// The camera is shaking around the requested instant.
    #[error("Pose interpolation between frames {before} and {after} is unreliable")]
    UnreliableInterpolation {
        /// The frame at or before the requested instant
        before: usize,
        /// The frame after the requested instant
        after: usize,
    },

    /// Applying the clock offset leaves the representable range.
    #[error("Timestamp {timestamp} shifted by {offset} us is out of the clock range")]
    ClockOverflow {
        /// The timestamp to translate
        timestamp: u64,
        /// The offset applied
        offset: i64,
    },

    /// The system clock is set before the Unix epoch.
    #[error("System clock error: {0}")]
    SystemClock(#[from] std::time::SystemTimeError),

    /// Error from the camera geometry.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Error reading or writing file
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing or writing json
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error encoding a binary record
    #[error("Failed to encode record: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Error decoding a binary record
    #[error("Failed to decode record: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// A record exceeds the largest delimited record size.
    #[error("Record of {0} bytes is too large")]
    RecordTooLarge(usize),
}
