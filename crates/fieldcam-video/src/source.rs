use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a robot, ordered by team and then by robot id.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct RobotIdentifier {
    /// The team number
    pub team_id: u32,
    /// The robot number inside the team, starting at 1
    pub robot_id: u32,
}

/// Identifies one camera of a robot, ordered by robot and then by camera name.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct RobotCameraIdentifier {
    /// The robot carrying the camera
    pub robot_id: RobotIdentifier,
    /// The camera name on the robot
    pub camera_name: String,
}

/// The physical camera a video comes from.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    /// A camera mounted on a robot.
    Robot(RobotCameraIdentifier),
    /// A camera outside the field, identified by an opaque name.
    External(String),
}

impl VideoSource {
    /// Sources are ordered by kind first: robot cameras before external ones.
    fn precedence(&self) -> u8 {
        match self {
            VideoSource::Robot(_) => 0,
            VideoSource::External(_) => 1,
        }
    }
}

impl Ord for VideoSource {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (VideoSource::Robot(a), VideoSource::Robot(b)) => a.cmp(b),
            (VideoSource::External(a), VideoSource::External(b)) => a.cmp(b),
            _ => self.precedence().cmp(&other.precedence()),
        }
    }
}

impl PartialOrd for VideoSource {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Identifies a video: its source and optionally the UTC time it started at.
///
/// Ordered by source, then by start time (an unset start comes first).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct VideoSourceId {
    /// The camera the video comes from.
    pub source: VideoSource,
    /// Start of the video, microseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_start: Option<u64>,
}

impl VideoSourceId {
    /// A video recorded by a robot camera.
    pub fn robot(team_id: u32, robot_id: u32, camera_name: impl Into<String>) -> Self {
        Self {
            source: VideoSource::Robot(RobotCameraIdentifier {
                robot_id: RobotIdentifier { team_id, robot_id },
                camera_name: camera_name.into(),
            }),
            utc_start: None,
        }
    }

    /// A video recorded by an external camera.
    pub fn external(name: impl Into<String>) -> Self {
        Self {
            source: VideoSource::External(name.into()),
            utc_start: None,
        }
    }

    /// Sets the UTC start time.
    pub fn with_utc_start(mut self, utc_start: u64) -> Self {
        self.utc_start = Some(utc_start);
        self
    }
}

impl Ord for VideoSourceId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source
            .cmp(&other.source)
            .then_with(|| self.utc_start.cmp(&other.utc_start))
    }
}

impl PartialOrd for VideoSourceId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RobotIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {} robot {}", self.team_id, self.robot_id)
    }
}

impl fmt::Display for RobotCameraIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} camera '{}'", self.robot_id, self.camera_name)
    }
}

impl fmt::Display for VideoSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            VideoSource::Robot(id) => write!(f, "{id}")?,
            VideoSource::External(name) => write!(f, "external '{name}'")?,
        }
        if let Some(start) = self.utc_start {
            write!(f, " started at {start}")?;
        }
        Ok(())
    }
}
