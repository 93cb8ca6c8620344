use std::{
    fs::File,
    io::{BufReader, BufWriter, ErrorKind, Read, Write},
    path::Path,
};

use serde::{de::DeserializeOwned, Serialize};

use crate::{TimeBase, VideoError, VideoMetaInformation};

/// Size of the length prefix of a delimited record, in bytes.
const PREFIX_LEN: usize = 4;

/// Largest payload of a delimited record, in bytes.
pub const MAX_RECORD_LEN: usize = 64 * 1024 * 1024;

fn record_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<MAX_RECORD_LEN>()
}

/// Read a json file into a record.
///
/// # Arguments
///
/// * `path` - The path to the json file.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, VideoError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Write a record as json.
///
/// # Arguments
///
/// * `value` - The record to write.
/// * `path` - The path of the file, created or truncated.
/// * `human` - Pretty print the json if true, write it on a single line otherwise.
pub fn write_json<T: Serialize>(
    value: &T,
    path: impl AsRef<Path>,
    human: bool,
) -> Result<(), VideoError> {
    let mut writer = BufWriter::new(File::create(path)?);
    if human {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the meta information of a video from a json file.
///
/// The timestamps of both clocks are checked to be non-decreasing, as required by the lookups
/// of [`crate::index`].
pub fn read_video_meta(path: impl AsRef<Path>) -> Result<VideoMetaInformation, VideoError> {
    let path = path.as_ref();
    let video: VideoMetaInformation = read_json(path)?;
    validate(&video, path)?;
    log::debug!(
        "loaded {} frames of {} from {}",
        video.len(),
        video.source_id,
        path.display()
    );
    Ok(video)
}

/// Write the meta information of a video to a json file.
pub fn write_video_meta(
    video: &VideoMetaInformation,
    path: impl AsRef<Path>,
    human: bool,
) -> Result<(), VideoError> {
    write_json(video, path, human)
}

/// Read the meta information of a video from a file holding one delimited binary record.
pub fn read_video_meta_binary(
    path: impl AsRef<Path>,
) -> Result<VideoMetaInformation, VideoError> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let video: VideoMetaInformation = read_delimited(&mut reader)?.ok_or_else(|| {
        std::io::Error::new(ErrorKind::UnexpectedEof, "file holds no record")
    })?;
    validate(&video, path)?;
    Ok(video)
}

/// Write the meta information of a video as one delimited binary record.
pub fn write_video_meta_binary(
    video: &VideoMetaInformation,
    path: impl AsRef<Path>,
) -> Result<(), VideoError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_delimited(&mut writer, video)?;
    writer.flush()?;
    Ok(())
}

fn validate(video: &VideoMetaInformation, path: &Path) -> Result<(), VideoError> {
    for base in [TimeBase::Monotonic, TimeBase::Utc] {
        if let Err(err) = video.check_monotonic(base) {
            log::warn!("rejecting {}: {err}", path.display());
            return Err(err);
        }
    }
    Ok(())
}

/// Append a record to a stream: a little endian `u32` byte count followed by the record
/// encoded with the standard bincode configuration.
///
/// Returns the number of bytes written, prefix included. Records above [`MAX_RECORD_LEN`]
/// bytes are refused with [`VideoError::RecordTooLarge`].
pub fn write_delimited<W: Write, T: bincode::Encode>(
    writer: &mut W,
    value: &T,
) -> Result<usize, VideoError> {
    let payload = bincode::encode_to_vec(value, record_config())?;
    if payload.len() > MAX_RECORD_LEN {
        return Err(VideoError::RecordTooLarge(payload.len()));
    }
    let len =
        u32::try_from(payload.len()).map_err(|_| VideoError::RecordTooLarge(payload.len()))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&payload)?;
    Ok(PREFIX_LEN + payload.len())
}

/// Read the next record written by [`write_delimited`].
///
/// Returns `None` on a clean end of stream. A stream ending inside a record is an error, so
/// is a length prefix above [`MAX_RECORD_LEN`]. Decoding is bounded by the same limit: a
/// corrupt container length inside the payload is a [`VideoError::Decode`].
pub fn read_delimited<R: Read, T: bincode::Decode<()>>(
    reader: &mut R,
) -> Result<Option<T>, VideoError> {
    let mut prefix = [0u8; PREFIX_LEN];
    let mut filled = 0;
    while filled < PREFIX_LEN {
        match reader.read(&mut prefix[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(std::io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "stream ends inside a length prefix",
                )
                .into())
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    let len = u32::from_le_bytes(prefix) as usize;
    if len > MAX_RECORD_LEN {
        return Err(VideoError::RecordTooLarge(len));
    }
    let mut payload = Vec::with_capacity(len);
    reader.take(len as u64).read_to_end(&mut payload)?;
    if payload.len() < len {
        return Err(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("stream ends after {} of {len} record bytes", payload.len()),
        )
        .into());
    }

    let (value, read) = bincode::decode_from_slice(&payload, record_config())?;
    if read != len {
        return Err(VideoError::Decode(
            bincode::error::DecodeError::OtherString(format!(
                "record of {len} bytes has {} trailing bytes",
                len - read
            )),
        ));
    }
    Ok(Some(value))
}

/// Read every record of a stream written by [`write_delimited`].
pub fn read_delimited_all<R: Read, T: bincode::Decode<()>>(
    reader: &mut R,
) -> Result<Vec<T>, VideoError> {
    let mut records = Vec::new();
    while let Some(record) = read_delimited(reader)? {
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameEntry, MotionStatus, VideoSourceId};
    use fieldcam_geometry::{IntrinsicParameters, Pose3D};
    use std::io::Cursor;

    fn sample_video() -> VideoMetaInformation {
        let mut video = VideoMetaInformation::new(
            VideoSourceId::robot(4, 1, "main").with_utc_start(1_000),
            IntrinsicParameters {
                focal_x: 320.5,
                focal_y: 321.0,
                center_x: 320,
                center_y: 240,
                img_width: 640,
                img_height: 480,
                distortion: vec![-0.1, 0.01, 0.0, 0.0],
            },
            Pose3D::new(vec![0.1, -0.2, 0.3], vec![1.0, 2.0, 3.0]),
        )
        .with_time_offset(-250);
        video.push_frame(FrameEntry::new(1_250).with_utc(1_000));
        video.push_frame(
            FrameEntry::new(1_283)
                .with_utc(1_033)
                .with_pose(Pose3D::new(vec![1.0, 0.0, 0.0, 0.0], vec![0.0; 3]))
                .with_status(MotionStatus::Moving),
        );
        video
    }

    #[test]
    fn test_delimited_stream() -> Result<(), VideoError> {
        let video = sample_video();
        let mut buffer = Vec::new();
        let first = write_delimited(&mut buffer, &video)?;
        write_delimited(&mut buffer, &video.frames[1])?;
        let prefix = u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
        assert_eq!(prefix as usize, first - PREFIX_LEN);

        let mut reader = Cursor::new(buffer);
        let read: Option<VideoMetaInformation> = read_delimited(&mut reader)?;
        assert_eq!(read.as_ref(), Some(&video));
        let frame: Option<FrameEntry> = read_delimited(&mut reader)?;
        assert_eq!(frame.as_ref(), Some(&video.frames[1]));
        let end: Option<FrameEntry> = read_delimited(&mut reader)?;
        assert!(end.is_none());
        Ok(())
    }

    #[test]
    fn test_read_all() -> Result<(), VideoError> {
        let frames: Vec<FrameEntry> = (0..5).map(|i| FrameEntry::new(i * 10)).collect();
        let mut buffer = Vec::new();
        for frame in &frames {
            write_delimited(&mut buffer, frame)?;
        }
        let read: Vec<FrameEntry> = read_delimited_all(&mut Cursor::new(buffer))?;
        assert_eq!(read, frames);

        let empty: Vec<FrameEntry> = read_delimited_all(&mut Cursor::new(Vec::new()))?;
        assert!(empty.is_empty());
        Ok(())
    }

    #[test]
    fn test_truncated_stream() -> Result<(), VideoError> {
        let mut buffer = Vec::new();
        write_delimited(&mut buffer, &FrameEntry::new(42).with_utc(7))?;

        let mut cut_payload = Cursor::new(buffer[..buffer.len() - 1].to_vec());
        let res: Result<Option<FrameEntry>, _> = read_delimited(&mut cut_payload);
        assert!(matches!(res, Err(VideoError::Io(_))));

        let mut cut_prefix = Cursor::new(buffer[..2].to_vec());
        let res: Result<Option<FrameEntry>, _> = read_delimited(&mut cut_prefix);
        assert!(matches!(res, Err(VideoError::Io(_))));
        Ok(())
    }

    #[test]
    fn test_oversized_length_prefix() {
        let mut stream = Cursor::new(u32::MAX.to_le_bytes().to_vec());
        let res: Result<Option<FrameEntry>, _> = read_delimited(&mut stream);
        assert!(matches!(res, Err(VideoError::RecordTooLarge(len)) if len == u32::MAX as usize));
    }

    #[test]
    fn test_corrupt_container_length() {
        // varint marker for a u64 followed by an element count of 2^56
        let mut payload = vec![253u8];
        payload.extend_from_slice(&(1u64 << 56).to_le_bytes());
        let mut buffer = (payload.len() as u32).to_le_bytes().to_vec();
        buffer.extend_from_slice(&payload);

        let res: Result<Option<Vec<FrameEntry>>, _> = read_delimited(&mut Cursor::new(buffer));
        assert!(matches!(res, Err(VideoError::Decode(_))));
    }

    #[test]
    fn test_trailing_bytes_rejected() -> Result<(), VideoError> {
        let mut buffer = Vec::new();
        write_delimited(&mut buffer, &FrameEntry::new(42))?;
        let len = u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) + 1;
        buffer[..PREFIX_LEN].copy_from_slice(&len.to_le_bytes());
        buffer.push(0);

        let res: Result<Option<FrameEntry>, _> = read_delimited(&mut Cursor::new(buffer));
        assert!(matches!(res, Err(VideoError::Decode(_))));
        Ok(())
    }

    #[test]
    fn test_corrupt_binary_video_file() -> Result<(), VideoError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("corrupt.bin");
        // robot source, team 0, robot 0, camera name of 2^56 bytes
        let mut bytes = 12u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 253]);
        bytes.extend_from_slice(&(1u64 << 56).to_le_bytes());
        std::fs::write(&path, bytes)?;

        assert!(matches!(
            read_video_meta_binary(&path),
            Err(VideoError::Decode(_))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_file_reports_cause() -> Result<(), VideoError> {
        let dir = tempfile::tempdir()?;
        let err = match read_video_meta(dir.path().join("missing.json")) {
            Err(err) => err,
            Ok(_) => panic!("reading a missing file must fail"),
        };
        assert!(matches!(err, VideoError::Io(_)));
        let message = err.to_string();
        assert!(message.starts_with("Io error: "), "{message}");
        assert!(message.len() > "Io error: ".len());
        Ok(())
    }
}
