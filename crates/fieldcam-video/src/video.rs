use fieldcam_geometry::{CameraMetaInformation, IntrinsicParameters, Pose3D, Projector};
use serde::{Deserialize, Serialize};

use crate::{index, ClockOffset, ResolvedPose, TimeBase, VideoError, VideoSourceId};

/// How the camera moved while a frame was captured.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotionStatus {
    /// Nothing is known about the motion.
    #[default]
    Unknown,
    /// The camera did not move: the previous pose can be reused unchanged.
    Static,
    /// The camera moved smoothly: poses can be interpolated.
    Moving,
    /// The camera was shaking: only exact frame poses are trustworthy.
    Shaking,
}

/// One captured frame of a video.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct FrameEntry {
    /// Capture time in microseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_ts: Option<u64>,
    /// Capture time in microseconds since a steady reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monotonic_ts: Option<u64>,
    /// Pose of the camera for this frame, overriding the video default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose: Option<Pose3D>,
    /// Motion of the camera during the frame.
    #[serde(default)]
    pub status: MotionStatus,
}

impl FrameEntry {
    /// A frame captured at the given monotonic time.
    pub fn new(monotonic_ts: u64) -> Self {
        Self {
            monotonic_ts: Some(monotonic_ts),
            ..Default::default()
        }
    }

    /// Sets the UTC capture time.
    pub fn with_utc(mut self, utc_ts: u64) -> Self {
        self.utc_ts = Some(utc_ts);
        self
    }

    /// Sets the pose override.
    pub fn with_pose(mut self, pose: Pose3D) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Sets the motion status.
    pub fn with_status(mut self, status: MotionStatus) -> Self {
        self.status = status;
        self
    }

    /// The capture time in the requested clock, if recorded.
    pub fn timestamp(&self, base: TimeBase) -> Option<u64> {
        match base {
            TimeBase::Monotonic => self.monotonic_ts,
            TimeBase::Utc => self.utc_ts,
        }
    }
}

/// Calibration and per-frame information of one video.
///
/// Frames are stored in capture order and only appended while the video is built; lookups
/// expect the timestamps of each clock, where present, to be non-decreasing (see
/// [`check_monotonic`](Self::check_monotonic)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct VideoMetaInformation {
    /// The camera the video was recorded with.
    pub source_id: VideoSourceId,
    /// Intrinsics, shared by every frame.
    pub camera_parameters: IntrinsicParameters,
    /// Pose used by frames without an override.
    pub default_pose: Pose3D,
    /// The frames, index is capture order.
    #[serde(default)]
    pub frames: Vec<FrameEntry>,
    /// Offset in microseconds such that `monotonic_ts + time_offset = utc_ts`.
    #[serde(default)]
    pub time_offset: i64,
}

impl VideoMetaInformation {
    /// Creates a video without frames.
    pub fn new(
        source_id: VideoSourceId,
        camera_parameters: IntrinsicParameters,
        default_pose: Pose3D,
    ) -> Self {
        Self {
            source_id,
            camera_parameters,
            default_pose,
            frames: Vec::new(),
            time_offset: 0,
        }
    }

    /// Sets the clock offset of the video.
    pub fn with_time_offset(mut self, time_offset: i64) -> Self {
        self.time_offset = time_offset;
        self
    }

    /// Appends a frame.
    pub fn push_frame(&mut self, frame: FrameEntry) {
        self.frames.push(frame);
    }

    /// The number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if the video has no frame.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The monotonic to UTC offset of the video.
    pub fn clock_offset(&self) -> ClockOffset {
        ClockOffset(self.time_offset)
    }

    /// The single view made of the video intrinsics and default pose.
    pub fn default_camera(&self) -> CameraMetaInformation {
        CameraMetaInformation::new(self.camera_parameters.clone(), self.default_pose.clone())
    }

    /// See [`index::timestamp_of`].
    pub fn timestamp(&self, index: usize, base: TimeBase) -> Result<u64, VideoError> {
        index::timestamp_of(self, index, base)
    }

    /// See [`index::index_at_or_before`].
    pub fn index_at_or_before(
        &self,
        timestamp: u64,
        base: TimeBase,
    ) -> Result<Option<usize>, VideoError> {
        index::index_at_or_before(self, timestamp, base)
    }

    /// See [`index::pose_at`].
    pub fn pose_at(&self, timestamp: u64, base: TimeBase) -> Result<&Pose3D, VideoError> {
        index::pose_at(self, timestamp, base)
    }

    /// See [`index::interpolate_pose_at`].
    pub fn interpolate_pose_at(
        &self,
        timestamp: u64,
        base: TimeBase,
    ) -> Result<ResolvedPose, VideoError> {
        index::interpolate_pose_at(self, timestamp, base)
    }

    /// The camera as it was at `timestamp`: video intrinsics and the pose from
    /// [`pose_at`](Self::pose_at).
    pub fn camera_at(
        &self,
        timestamp: u64,
        base: TimeBase,
    ) -> Result<CameraMetaInformation, VideoError> {
        let pose = self.pose_at(timestamp, base)?;
        Ok(CameraMetaInformation::new(
            self.camera_parameters.clone(),
            pose.clone(),
        ))
    }

    /// A projector for the camera as it was at `timestamp`.
    pub fn projector_at(&self, timestamp: u64, base: TimeBase) -> Result<Projector, VideoError> {
        let pose = self.pose_at(timestamp, base)?;
        Ok(Projector::new(&self.camera_parameters, pose)?)
    }

    /// See [`index::check_monotonic`].
    pub fn check_monotonic(&self, base: TimeBase) -> Result<(), VideoError> {
        index::check_monotonic(self, base)
    }
}
