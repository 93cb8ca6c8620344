use argh::FromArgs;
use fieldcam_video::{clock::pretty_duration, geometry::CorrectionParams, io, TimeBase};
use glam::DVec3;

/// Projects a field point into a video frame at a given time
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the video meta information json file
    #[argh(positional)]
    path: String,

    /// timestamp in microseconds
    #[argh(option, short = 't')]
    timestamp: u64,

    /// clock of the timestamp: monotonic or utc
    #[argh(option, short = 'c', default = "TimeBase::Monotonic", from_str_fn(to_time_base))]
    clock: TimeBase,

    /// field point as x,y,z
    #[argh(option, short = 'p', default = "DVec3::ZERO", from_str_fn(to_point))]
    point: DVec3,

    /// interpolate the pose between frames when the camera is moving
    #[argh(switch, short = 'i')]
    interpolate: bool,

    /// json file with the thresholds of the correction sample check
    #[argh(option)]
    correction: Option<String>,
}

fn to_time_base(value: &str) -> Result<TimeBase, String> {
    match value {
        "monotonic" => Ok(TimeBase::Monotonic),
        "utc" => Ok(TimeBase::Utc),
        _ => Err(format!("Invalid clock: {value}")),
    }
}

fn to_point(value: &str) -> Result<DVec3, String> {
    let coords = value
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("{v}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match coords.as_slice() {
        [x, y, z] => Ok(DVec3::new(*x, *y, *z)),
        _ => Err(format!("Expected 3 coordinates, got {}", coords.len())),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let video = io::read_video_meta(&args.path)?;
    log::info!("{}: {} frames", video.source_id, video.len());

    match video.index_at_or_before(args.timestamp, args.clock)? {
        Some(index) => {
            let ts = video.timestamp(index, args.clock)?;
            println!(
                "frame {index} captured {} before the query",
                pretty_duration(args.timestamp - ts)
            );
        }
        None => println!("no frame before the query, using the default pose"),
    }

    let pose = if args.interpolate {
        let resolved = video.interpolate_pose_at(args.timestamp, args.clock)?;
        println!("pose resolution: {:?}", resolved.resolution);
        resolved.pose
    } else {
        video.pose_at(args.timestamp, args.clock)?.clone()
    };
    println!("pose: {pose}");

    let camera = fieldcam_video::geometry::CameraMetaInformation::new(
        video.camera_parameters.clone(),
        pose,
    );
    let projection = camera.field_to_image(args.point)?;
    println!(
        "{} -> ({:.2}, {:.2}) {}",
        args.point,
        projection.point.x,
        projection.point.y,
        if projection.valid { "visible" } else { "not visible" }
    );

    let params: CorrectionParams = match &args.correction {
        Some(path) => io::read_json(path)?,
        None => CorrectionParams::default(),
    };
    let usable = camera
        .projector()?
        .is_valid_for_correction(args.point, &params)?;
    println!("usable as correction sample: {usable}");

    Ok(())
}
