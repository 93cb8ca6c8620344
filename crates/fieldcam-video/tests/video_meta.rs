use approx::assert_relative_eq;
use fieldcam_geometry::{IntrinsicParameters, Pose3D};
use fieldcam_video::{
    io, FrameEntry, MotionStatus, PoseResolution, TimeBase, VideoError, VideoMetaInformation,
    VideoSourceId,
};
use glam::DVec3;

const OFFSET: i64 = 1_600_000_000_000_000;

fn recorded_video() -> VideoMetaInformation {
    let mut video = VideoMetaInformation::new(
        VideoSourceId::robot(2, 4, "head").with_utc_start(OFFSET as u64),
        IntrinsicParameters {
            focal_x: 400.0,
            focal_y: 400.0,
            center_x: 320,
            center_y: 240,
            img_width: 640,
            img_height: 480,
            distortion: vec![],
        },
        Pose3D::new(vec![0.0; 3], vec![0.0, 0.0, 2.0]),
    )
    .with_time_offset(OFFSET);

    for i in 0..10u64 {
        let monotonic = 33_333 * i;
        let mut frame = FrameEntry::new(monotonic)
            .with_utc(monotonic + OFFSET as u64)
            .with_status(MotionStatus::Moving);
        if i % 3 == 0 {
            frame = frame.with_pose(Pose3D::new(vec![0.0; 3], vec![i as f64 * 0.1, 0.0, 2.0]));
        }
        video.push_frame(frame);
    }
    video
}

#[test]
fn json_round_trip() -> Result<(), VideoError> {
    let dir = tempfile::tempdir()?;
    let video = recorded_video();

    for human in [true, false] {
        let path = dir.path().join(format!("video_{human}.json"));
        io::write_video_meta(&video, &path, human)?;
        let loaded = io::read_video_meta(&path)?;
        assert_eq!(loaded, video);
    }
    Ok(())
}

#[test]
fn binary_round_trip() -> Result<(), VideoError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("video.bin");
    let video = recorded_video();

    io::write_video_meta_binary(&video, &path)?;
    assert_eq!(io::read_video_meta_binary(&path)?, video);
    Ok(())
}

#[test]
fn loader_rejects_unordered_frames() -> Result<(), VideoError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("unordered.json");

    let mut video = recorded_video();
    video.frames.swap(2, 5);
    io::write_video_meta(&video, &path, false)?;

    assert!(matches!(
        io::read_video_meta(&path),
        Err(VideoError::NonMonotonicTimestamps {
            index: 3,
            base: TimeBase::Monotonic
        })
    ));
    Ok(())
}

#[test]
fn minimal_json_uses_defaults() -> Result<(), VideoError> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("minimal.json");
    std::fs::write(
        &path,
        r#"{
            "source_id": {"source": {"external": "tribune"}},
            "camera_parameters": {
                "focal_x": 500.0, "focal_y": 500.0,
                "center_x": 320, "center_y": 240,
                "img_width": 640, "img_height": 480
            },
            "default_pose": {"rotation": [0.0, 0.0, 0.0], "translation": [0.0, 0.0, 1.0]}
        }"#,
    )?;

    let video = io::read_video_meta(&path)?;
    assert!(video.is_empty());
    assert_eq!(video.time_offset, 0);
    assert!(video.camera_parameters.distortion.is_empty());
    assert_eq!(video.index_at_or_before(1_000, TimeBase::Utc)?, None);
    Ok(())
}

#[test]
fn both_clocks_agree() -> Result<(), VideoError> {
    let video = recorded_video();
    let offset = video.clock_offset();

    for query in [0, 40_000, 150_000, 299_997, 1_000_000] {
        let utc = offset.to_utc(query)?;
        assert_eq!(
            video.index_at_or_before(query, TimeBase::Monotonic)?,
            video.index_at_or_before(utc, TimeBase::Utc)?
        );
        assert_eq!(
            video.pose_at(query, TimeBase::Monotonic)?,
            video.pose_at(utc, TimeBase::Utc)?
        );
    }
    Ok(())
}

#[test]
fn projection_follows_the_pose_in_time() -> Result<(), VideoError> {
    let video = recorded_video();
    let point = DVec3::ZERO;

    // frame 3 moves the camera 0.3 along x
    let before = video.projector_at(99_998, TimeBase::Monotonic)?;
    let after = video.projector_at(99_999, TimeBase::Monotonic)?;
    assert_relative_eq!(before.field_to_image(point)?.point.x, 320.0, epsilon = 1e-9);
    assert_relative_eq!(after.field_to_image(point)?.point.x, 380.0, epsilon = 1e-9);

    // frame 4 has no override
    let camera = video.camera_at(140_000, TimeBase::Monotonic)?;
    assert_eq!(camera.pose, video.default_pose);
    Ok(())
}

#[test]
fn interpolation_between_overrides() -> Result<(), VideoError> {
    let video = recorded_video();

    let resolved = video.interpolate_pose_at(33_333 * 3 + 11_111, TimeBase::Monotonic)?;
    let PoseResolution::Interpolated { before, after, ratio } = resolved.resolution else {
        panic!("expected an interpolated pose, got {:?}", resolved.resolution);
    };
    assert_eq!((before, after), (3, 4));
    assert_relative_eq!(ratio, 1.0 / 3.0, epsilon = 1e-4);
    // frame 4 falls back to the default pose at x = 0
    assert_relative_eq!(resolved.pose.translation[0], 0.3 * (1.0 - ratio), epsilon = 1e-9);
    Ok(())
}
