use serde::{Deserialize, Serialize};

/// Number of camera zoom channels (0 = bottom, 1 = top).
pub const ZOOM_CHANNELS: usize = 2;

/// BPM threshold above which scorable ticks drop from 16th to 8th notes.
const COARSE_TICK_BPM: f64 = 250.0;

/// A BPM / time-signature change anchor.
///
/// Timing points are sorted by `time` and unique at a given time. They are
/// created during chart load and immutable afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingPoint {
    /// Time in milliseconds
    pub time: i64,
    /// Duration of a single beat in milliseconds (60000 / BPM)
    pub beat_duration: f64,
    /// Beats per bar (time signature numerator)
    pub numerator: i32,
    /// Time signature denominator
    pub denominator: i32,
}

impl TimingPoint {
    pub fn new(time: i64, bpm: f64, numerator: i32, denominator: i32) -> Self {
        Self {
            time,
            beat_duration: 60_000.0 / bpm,
            numerator,
            denominator,
        }
    }

    /// Standard 4/4 timing point at the given BPM.
    pub fn common_time(time: i64, bpm: f64) -> Self {
        Self::new(time, bpm, 4, 4)
    }

    pub fn bpm(&self) -> f64 {
        60_000.0 / self.beat_duration
    }

    /// Length of a whole bar in milliseconds.
    pub fn bar_duration(&self) -> f64 {
        self.beat_duration * self.numerator as f64
    }

    /// Scorable tick subdivision of the bar: 8th notes at >= 250 BPM,
    /// 16th notes below.
    pub fn tick_subdivision(&self) -> u32 {
        if self.bpm() >= COARSE_TICK_BPM { 8 } else { 16 }
    }

    /// Interval between scorable hold/laser ticks in milliseconds.
    pub fn tick_interval(&self) -> f64 {
        self.bar_duration() / self.tick_subdivision() as f64
    }
}

/// A camera-zoom control sample.
///
/// Sampled by linear interpolation between the bracketing points of the same
/// channel. Read-only after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomPoint {
    /// Time in milliseconds
    pub time: i64,
    /// Zoom channel (0 = bottom, 1 = top)
    pub channel: usize,
    /// Zoom value
    pub value: f32,
}

impl ZoomPoint {
    pub fn new(time: i64, channel: usize, value: f32) -> Self {
        Self {
            time,
            channel,
            value,
        }
    }
}
