use std::fmt;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::{FrameEntry, VideoError};

const US_PER_MS: u64 = 1_000;
const US_PER_S: u64 = 1_000 * US_PER_MS;
const US_PER_MIN: u64 = 60 * US_PER_S;
const US_PER_H: u64 = 60 * US_PER_MIN;
const US_PER_DAY: u64 = 24 * US_PER_H;

/// The clock a timestamp is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeBase {
    /// Steady clock, microseconds since an arbitrary reference.
    Monotonic,
    /// Wall clock, microseconds since the Unix epoch.
    Utc,
}

impl fmt::Display for TimeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBase::Monotonic => write!(f, "monotonic"),
            TimeBase::Utc => write!(f, "UTC"),
        }
    }
}

/// Offset in microseconds from the monotonic clock to the UTC clock.
///
/// `monotonic_ts + offset = utc_ts`. The offset is assumed constant over a recording, no drift
/// between the two clocks is modelled.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ClockOffset(pub i64);

impl ClockOffset {
    /// No offset, both clocks agree.
    pub const ZERO: Self = Self(0);

    /// The offset in microseconds.
    #[inline]
    pub fn micros(self) -> i64 {
        self.0
    }

    /// Offset measured from a pair of timestamps taken at the same instant.
    pub fn between(monotonic_ts: u64, utc_ts: u64) -> Result<Self, VideoError> {
        let overflow = || VideoError::ClockOverflow {
            timestamp: monotonic_ts,
            offset: 0,
        };
        let monotonic = i64::try_from(monotonic_ts).map_err(|_| overflow())?;
        let utc = i64::try_from(utc_ts).map_err(|_| overflow())?;
        utc.checked_sub(monotonic).map(Self).ok_or_else(overflow)
    }

    /// Translate a monotonic timestamp to UTC.
    pub fn to_utc(self, monotonic_ts: u64) -> Result<u64, VideoError> {
        monotonic_ts
            .checked_add_signed(self.0)
            .ok_or(VideoError::ClockOverflow {
                timestamp: monotonic_ts,
                offset: self.0,
            })
    }

    /// Translate a UTC timestamp to the monotonic clock.
    pub fn to_monotonic(self, utc_ts: u64) -> Result<u64, VideoError> {
        let shifted = if self.0 >= 0 {
            utc_ts.checked_sub(self.0.unsigned_abs())
        } else {
            utc_ts.checked_add(self.0.unsigned_abs())
        };
        shifted.ok_or(VideoError::ClockOverflow {
            timestamp: utc_ts,
            offset: self.0,
        })
    }

    /// Translate a timestamp from one clock to the other.
    pub fn convert(self, timestamp: u64, from: TimeBase, to: TimeBase) -> Result<u64, VideoError> {
        match (from, to) {
            (TimeBase::Monotonic, TimeBase::Utc) => self.to_utc(timestamp),
            (TimeBase::Utc, TimeBase::Monotonic) => self.to_monotonic(timestamp),
            _ => Ok(timestamp),
        }
    }
}

/// Translate a monotonic timestamp to UTC: `ts + offset`.
pub fn monotonic_to_utc(timestamp: u64, offset: i64) -> Result<u64, VideoError> {
    ClockOffset(offset).to_utc(timestamp)
}

/// Translate a UTC timestamp to the monotonic clock: `ts - offset`.
pub fn utc_to_monotonic(timestamp: u64, offset: i64) -> Result<u64, VideoError> {
    ClockOffset(offset).to_monotonic(timestamp)
}

/// Current wall clock time in microseconds since the Unix epoch.
pub fn utc_now() -> Result<u64, VideoError> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH)?;
    Ok(u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX))
}

/// Clocks of a capturing process.
///
/// Created once at startup and handed to whatever produces fresh timestamps. The steady
/// reference is the creation instant; the offset to the wall clock is measured once and stays
/// fixed for the life of the value, so every frame stamped with it shares one offset.
///
/// # Examples
///
/// ```
/// use fieldcam_video::CaptureClock;
///
/// let clock = CaptureClock::new()?;
/// let frame = clock.stamp_frame()?;
/// assert_eq!(
///     frame.utc_ts,
///     Some(clock.offset().to_utc(frame.monotonic_ts.unwrap_or_default())?)
/// );
/// # Ok::<(), fieldcam_video::VideoError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CaptureClock {
    reference: Instant,
    offset: ClockOffset,
}

impl CaptureClock {
    /// Starts the steady clock and measures its offset to the wall clock.
    pub fn new() -> Result<Self, VideoError> {
        let reference = Instant::now();
        let offset = ClockOffset::between(0, utc_now()?)?;
        log::debug!("capture clock started, steady to UTC offset {} us", offset.0);
        Ok(Self { reference, offset })
    }

    /// Steady to wall clock offset, stable for the life of the clock.
    #[inline]
    pub fn offset(&self) -> ClockOffset {
        self.offset
    }

    /// Steady clock time in microseconds.
    pub fn monotonic_now(&self) -> u64 {
        u64::try_from(self.reference.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    /// Wall clock time derived from the steady clock and the fixed offset.
    pub fn utc_now(&self) -> Result<u64, VideoError> {
        self.offset.to_utc(self.monotonic_now())
    }

    /// A new frame entry stamped with both clocks.
    pub fn stamp_frame(&self) -> Result<FrameEntry, VideoError> {
        let monotonic_ts = self.monotonic_now();
        Ok(FrameEntry::new(monotonic_ts).with_utc(self.offset.to_utc(monotonic_ts)?))
    }
}

/// Show a duration in microseconds as `..d:..h:..m:..s:...ms`.
///
/// Only the non-zero parts are shown; durations below one millisecond give `0ms`.
///
/// # Examples
///
/// ```
/// use fieldcam_video::clock::pretty_duration;
///
/// assert_eq!(pretty_duration(3_723_004_000), "1h:02m:03s:004ms");
/// assert_eq!(pretty_duration(90_000_000), "1m:30s");
/// ```
pub fn pretty_duration(duration_us: u64) -> String {
    let parts = [
        (duration_us / US_PER_DAY, "d", 0),
        (duration_us % US_PER_DAY / US_PER_H, "h", 2),
        (duration_us % US_PER_H / US_PER_MIN, "m", 2),
        (duration_us % US_PER_MIN / US_PER_S, "s", 2),
        (duration_us % US_PER_S / US_PER_MS, "ms", 3),
    ];

    let shown = parts
        .iter()
        .filter(|(value, _, _)| *value > 0)
        .enumerate()
        .map(|(i, (value, unit, width))| {
            let width = if i == 0 { 0 } else { *width };
            format!("{value:0width$}{unit}")
        })
        .collect::<Vec<_>>();

    if shown.is_empty() {
        "0ms".to_string()
    } else {
        shown.join(":")
    }
}
