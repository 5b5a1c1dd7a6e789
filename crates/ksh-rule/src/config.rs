use serde::{Deserialize, Serialize};

/// Judgment configuration.
///
/// Immutable for the duration of a session; the engine takes it at
/// construction instead of reading shared globals. Times are milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Good hit window: largest |delta| that still hits a button tick
    pub good_window: i64,
    /// Perfect sub-window: |delta| below this rates Perfect
    pub perfect_window: i64,
    /// Maximum laser-cursor distance from the target that still counts as
    /// tracking
    pub laser_distance_leniency: f32,
    /// Auto-centering assist cap; 0 disables assist entirely
    pub laser_assist_level: u32,
    /// Total gauge budget distributed over the chart's weighted ticks
    pub gauge_total: f32,
    /// Gauge drained by a missed tap note (hold/laser ticks drain a quarter
    /// of this)
    pub short_miss_drain: f32,
    /// Full autoplay: every tick resolves itself
    pub autoplay: bool,
    /// Autoplay for buttons and holds only; lasers stay manual
    pub autoplay_buttons: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            good_window: 75,
            perfect_window: 35,
            laser_distance_leniency: 1.0 / 12.0,
            laser_assist_level: 4,
            gauge_total: 2.1,
            short_miss_drain: 0.02,
            autoplay: false,
            autoplay_buttons: false,
        }
    }
}

impl ScoringConfig {
    pub fn autoplay() -> Self {
        Self {
            autoplay: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_windows() {
        let cfg = ScoringConfig::default();
        assert_eq!(cfg.good_window, 75);
        assert_eq!(cfg.perfect_window, 35);
        assert!(cfg.perfect_window < cfg.good_window);
        assert!(!cfg.autoplay);
    }

    #[test]
    fn serde_round_trip() {
        let cfg = ScoringConfig {
            laser_assist_level: 2,
            autoplay_buttons: true,
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ScoringConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
