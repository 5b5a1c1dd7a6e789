use serde::{Deserialize, Serialize};

use crate::HitRating;

/// Display score scale: a flawless session scores exactly this.
pub const MAX_DISPLAY_SCORE: u32 = 10_000_000;

/// Scale the accumulated hit score to the display range.
pub fn calculate_score(hit_score: u32, max_hit_score: u32) -> u32 {
    if max_hit_score == 0 {
        return 0;
    }
    ((hit_score as f64 / max_hit_score as f64) * MAX_DISPLAY_SCORE as f64).round() as u32
}

/// Six ordered ranks, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    AAA,
    AA,
    A,
    B,
    C,
    D,
}

impl Grade {
    /// Grade from the display score and the gauge in [0, 1]; the gauge
    /// contributes a tenth of the weighting.
    pub fn from_score(score: u32, gauge: f32) -> Grade {
        Grade::from_value(score as f64 * 0.9 + gauge as f64 * 1_000_000.0)
    }

    /// Grade from the combined weighted value.
    pub fn from_value(value: f64) -> Grade {
        if value >= 9_800_000.0 {
            Grade::AAA
        } else if value >= 9_400_000.0 {
            Grade::AA
        } else if value >= 8_900_000.0 {
            Grade::A
        } else if value >= 8_000_000.0 {
            Grade::B
        } else if value >= 7_000_000.0 {
            Grade::C
        } else {
            Grade::D
        }
    }
}

/// Session clear status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClearMark {
    /// Gauge ended below the clear border
    Exited,
    Cleared,
    /// No misses
    FullCombo,
    /// No misses and no Good hits
    Perfect,
}

impl ClearMark {
    pub fn from_results(gauge_cleared: bool, counts: &HitCounts) -> ClearMark {
        if counts.count(HitRating::Miss) == 0 {
            if counts.count(HitRating::Good) == 0 {
                ClearMark::Perfect
            } else {
                ClearMark::FullCombo
            }
        } else if gauge_cleared {
            ClearMark::Cleared
        } else {
            ClearMark::Exited
        }
    }
}

/// Per-rating hit counters split into early and late halves.
///
/// Slot order: Miss, Good, Perfect. Idle whiffs are tracked separately by
/// the engine since they never resolve a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitCounts {
    pub early: [u32; 3],
    pub late: [u32; 3],
}

impl HitCounts {
    pub fn add(&mut self, rating: HitRating, early: bool) {
        let Some(slot) = rating.index() else {
            return;
        };
        if early {
            self.early[slot] += 1;
        } else {
            self.late[slot] += 1;
        }
    }

    pub fn count(&self, rating: HitRating) -> u32 {
        match rating.index() {
            Some(slot) => self.early[slot] + self.late[slot],
            None => 0,
        }
    }

    pub fn total(&self) -> u32 {
        self.early.iter().sum::<u32>() + self.late.iter().sum::<u32>()
    }
}

/// The final numbers of a session, ready for the result screen or the
/// persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: u32,
    pub grade: Grade,
    /// Final gauge in [0, 1]
    pub gauge: f32,
    pub max_combo: u32,
    pub counts: HitCounts,
    pub mark: ClearMark,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_scaling() {
        assert_eq!(calculate_score(0, 100), 0);
        assert_eq!(calculate_score(100, 100), MAX_DISPLAY_SCORE);
        assert_eq!(calculate_score(50, 100), 5_000_000);
        // Rounded, not truncated: 1/3 of the scale.
        assert_eq!(calculate_score(1, 3), 3_333_333);
        assert_eq!(calculate_score(2, 3), 6_666_667);
    }

    #[test]
    fn empty_chart_scores_zero() {
        assert_eq!(calculate_score(0, 0), 0);
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(Grade::from_value(9_800_000.0), Grade::AAA);
        assert_eq!(Grade::from_value(9_799_999.0), Grade::AA);
        assert_eq!(Grade::from_value(9_400_000.0), Grade::AA);
        assert_eq!(Grade::from_value(9_399_999.0), Grade::A);
        assert_eq!(Grade::from_value(8_900_000.0), Grade::A);
        assert_eq!(Grade::from_value(8_899_999.0), Grade::B);
        assert_eq!(Grade::from_value(8_000_000.0), Grade::B);
        assert_eq!(Grade::from_value(7_999_999.0), Grade::C);
        assert_eq!(Grade::from_value(7_000_000.0), Grade::C);
        assert_eq!(Grade::from_value(6_999_999.0), Grade::D);
        assert_eq!(Grade::from_value(0.0), Grade::D);
    }

    #[test]
    fn grade_weighting_includes_gauge() {
        // Full score with full gauge: 9,000,000 + 1,000,000.
        assert_eq!(Grade::from_score(MAX_DISPLAY_SCORE, 1.0), Grade::AAA);
        // Full score with an empty gauge falls short of the top rank.
        assert_eq!(Grade::from_score(MAX_DISPLAY_SCORE, 0.0), Grade::AA);
    }

    #[test]
    fn clear_marks() {
        let mut counts = HitCounts::default();
        counts.add(HitRating::Perfect, false);
        assert_eq!(ClearMark::from_results(true, &counts), ClearMark::Perfect);

        counts.add(HitRating::Good, true);
        assert_eq!(ClearMark::from_results(true, &counts), ClearMark::FullCombo);

        counts.add(HitRating::Miss, false);
        assert_eq!(ClearMark::from_results(true, &counts), ClearMark::Cleared);
        assert_eq!(ClearMark::from_results(false, &counts), ClearMark::Exited);
    }

    #[test]
    fn counts_split_early_late() {
        let mut counts = HitCounts::default();
        counts.add(HitRating::Perfect, true);
        counts.add(HitRating::Perfect, false);
        counts.add(HitRating::Good, true);
        counts.add(HitRating::Idle, true); // ignored
        assert_eq!(counts.count(HitRating::Perfect), 2);
        assert_eq!(counts.count(HitRating::Good), 1);
        assert_eq!(counts.count(HitRating::Idle), 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.early[2], 1);
        assert_eq!(counts.late[2], 1);
    }

    #[test]
    fn summary_serde_round_trip() {
        let summary = ScoreSummary {
            score: 9_123_456,
            grade: Grade::A,
            gauge: 0.82,
            max_combo: 321,
            counts: HitCounts {
                early: [1, 2, 300],
                late: [0, 4, 250],
            },
            mark: ClearMark::Cleared,
        };
        let json = serde_json::to_string(&summary).unwrap();
        let back: ScoreSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
