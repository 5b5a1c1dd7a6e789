// Judgment rules: tick matching, gauge, score/grade, session configuration

mod config;
mod gauge;
mod input;
mod score;
mod scoring;

pub use config::ScoringConfig;
pub use gauge::{CLEAR_BORDER, HealthGauge};
pub use input::{InputEvent, InputFrame, direction_sign};
pub use score::{ClearMark, Grade, HitCounts, MAX_DISPLAY_SCORE, ScoreSummary, calculate_score};
pub use scoring::{HitStat, LANE_COUNT, Scoring, ScoringEvent};

use serde::{Deserialize, Serialize};

/// Rating of a resolved score tick, or of a whiffed press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitRating {
    Miss,
    Good,
    Perfect,
    /// Press with no object in range; neutral feedback, never scored
    Idle,
}

impl HitRating {
    /// Score contribution of a button tick with this rating.
    pub fn score_value(self) -> u32 {
        match self {
            HitRating::Perfect => 2,
            HitRating::Good => 1,
            HitRating::Miss | HitRating::Idle => 0,
        }
    }

    /// Counter slot for this rating; Idle is not a scorable resolution.
    pub fn index(self) -> Option<usize> {
        match self {
            HitRating::Miss => Some(0),
            HitRating::Good => Some(1),
            HitRating::Perfect => Some(2),
            HitRating::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_values() {
        assert_eq!(HitRating::Perfect.score_value(), 2);
        assert_eq!(HitRating::Good.score_value(), 1);
        assert_eq!(HitRating::Miss.score_value(), 0);
        assert_eq!(HitRating::Idle.score_value(), 0);
    }

    #[test]
    fn idle_has_no_counter_slot() {
        assert_eq!(HitRating::Idle.index(), None);
        assert_eq!(HitRating::Miss.index(), Some(0));
    }
}
