use fieldcam_geometry::{rigid_to_pose, Pose3D, RotationEncoding};
use glam::{DAffine3, DQuat};

use crate::{MotionStatus, TimeBase, VideoError, VideoMetaInformation};

/// How [`interpolate_pose_at`] obtained its pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseResolution {
    /// No frame at or before the instant: the video default pose.
    Default,
    /// A frame was captured exactly at the instant.
    Exact(usize),
    /// The pose of the preceding frame, reused unchanged.
    Held(usize),
    /// Blend of the two frames bounding the instant.
    Interpolated {
        /// The frame before the instant
        before: usize,
        /// The frame after the instant
        after: usize,
        /// Position of the instant between the two frames, in `(0, 1)`
        ratio: f64,
    },
}

/// A pose together with the way it was resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPose {
    /// The pose of the camera.
    pub pose: Pose3D,
    /// Where the pose comes from.
    pub resolution: PoseResolution,
}

/// Returns the timestamp of the frame at `index` in the requested clock.
///
/// # Errors
///
/// * [`VideoError::OutOfRange`] if `index` is not a frame of the video.
/// * [`VideoError::MissingTimestamp`] if the frame has no timestamp in that clock.
pub fn timestamp_of(
    video: &VideoMetaInformation,
    index: usize,
    base: TimeBase,
) -> Result<u64, VideoError> {
    let frame = video.frames.get(index).ok_or(VideoError::OutOfRange {
        index,
        len: video.frames.len(),
    })?;
    frame
        .timestamp(base)
        .ok_or(VideoError::MissingTimestamp { index, base })
}

/// Returns the index of the last frame captured at or before `timestamp`.
///
/// `None` means every frame is later than `timestamp`, which is a regular outcome, not an
/// error.
///
/// PRECONDITION: the timestamps of `base` are non-decreasing over the frames. The lookup is a
/// binary search, only the frames it visits need a timestamp in `base`.
///
/// # Errors
///
/// [`VideoError::MissingTimestamp`] if a visited frame has no timestamp in `base`.
pub fn index_at_or_before(
    video: &VideoMetaInformation,
    timestamp: u64,
    base: TimeBase,
) -> Result<Option<usize>, VideoError> {
    // count the frames with a timestamp <= the query
    let (mut low, mut high) = (0, video.frames.len());
    while low < high {
        let mid = low + (high - low) / 2;
        if timestamp_of(video, mid, base)? <= timestamp {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    Ok(low.checked_sub(1))
}

/// Returns the pose of the camera at `timestamp`.
///
/// The pose of the last frame at or before `timestamp`, or the video default pose if there is
/// no such frame or the frame has no pose override. No interpolation is done, see
/// [`interpolate_pose_at`].
pub fn pose_at(
    video: &VideoMetaInformation,
    timestamp: u64,
    base: TimeBase,
) -> Result<&Pose3D, VideoError> {
    let index = index_at_or_before(video, timestamp, base)?;
    match index.and_then(|i| video.frames.get(i)?.pose.as_ref()) {
        Some(pose) => Ok(pose),
        None => {
            log::debug!(
                "no pose override at {base} {timestamp} (frame {index:?}), using default pose"
            );
            Ok(&video.default_pose)
        }
    }
}

/// Returns the pose of the camera at `timestamp`, interpolating between frames when the motion
/// status of the bounding frames allows it.
///
/// * no frame at or before `timestamp`: the default pose;
/// * a frame exactly at `timestamp`, or no frame after it: that frame's pose;
/// * either bounding frame `SHAKING`: [`VideoError::UnreliableInterpolation`];
/// * either bounding frame `MOVING`: rotation slerp and linear translation between the two
///   frame poses;
/// * otherwise (`STATIC`, `UNKNOWN`): the preceding frame's pose, held.
pub fn interpolate_pose_at(
    video: &VideoMetaInformation,
    timestamp: u64,
    base: TimeBase,
) -> Result<ResolvedPose, VideoError> {
    let frame_pose = |i: usize| video.frames[i].pose.as_ref().unwrap_or(&video.default_pose);

    let Some(before) = index_at_or_before(video, timestamp, base)? else {
        return Ok(ResolvedPose {
            pose: video.default_pose.clone(),
            resolution: PoseResolution::Default,
        });
    };

    let t_before = timestamp_of(video, before, base)?;
    if t_before == timestamp {
        return Ok(ResolvedPose {
            pose: frame_pose(before).clone(),
            resolution: PoseResolution::Exact(before),
        });
    }

    let after = before + 1;
    let held = ResolvedPose {
        pose: frame_pose(before).clone(),
        resolution: PoseResolution::Held(before),
    };
    if after >= video.frames.len() {
        return Ok(held);
    }

    let statuses = (video.frames[before].status, video.frames[after].status);
    match statuses {
        (MotionStatus::Shaking, _) | (_, MotionStatus::Shaking) => {
            return Err(VideoError::UnreliableInterpolation { before, after });
        }
        (MotionStatus::Moving, _) | (_, MotionStatus::Moving) => {}
        _ => {
            log::debug!("frames {before}..{after} are not moving, holding frame {before}");
            return Ok(held);
        }
    }

    let t_after = timestamp_of(video, after, base)?;
    if t_after <= timestamp {
        // only reachable on unordered frames
        return Ok(held);
    }
    let ratio = (timestamp - t_before) as f64 / (t_after - t_before) as f64;

    let start = frame_pose(before).to_rigid()?;
    let end = frame_pose(after).to_rigid()?;
    let rotation = DQuat::from_mat3(&start.matrix3).slerp(DQuat::from_mat3(&end.matrix3), ratio);
    let translation = start.translation.lerp(end.translation, ratio);

    let encoding = if frame_pose(before).is_quaternion() {
        RotationEncoding::Quaternion
    } else {
        RotationEncoding::RotationVector
    };
    log::debug!("interpolating frames {before}..{after} at ratio {ratio:.3}");

    Ok(ResolvedPose {
        pose: rigid_to_pose(
            &DAffine3::from_rotation_translation(rotation, translation),
            encoding,
        ),
        resolution: PoseResolution::Interpolated {
            before,
            after,
            ratio,
        },
    })
}

/// Check that the timestamps of `base` never decrease over the frames.
///
/// Frames without a timestamp in `base` are skipped.
///
/// # Errors
///
/// [`VideoError::NonMonotonicTimestamps`] naming the first frame that goes backwards.
pub fn check_monotonic(video: &VideoMetaInformation, base: TimeBase) -> Result<(), VideoError> {
    let mut previous: Option<u64> = None;
    for (index, frame) in video.frames.iter().enumerate() {
        let Some(ts) = frame.timestamp(base) else {
            continue;
        };
        if previous.is_some_and(|p| ts < p) {
            return Err(VideoError::NonMonotonicTimestamps { index, base });
        }
        previous = Some(ts);
    }
    Ok(())
}
