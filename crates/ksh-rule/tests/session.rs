//! End-to-end gameplay sessions: cursor, tick intake and judgment driven
//! together the way a game loop would.

use ksh_model::{Chart, ChartBuilder, ChartObject, TimingPoint};
use ksh_playback::PlaybackCursor;
use ksh_rule::{
    ClearMark, Grade, HitRating, InputFrame, MAX_DISPLAY_SCORE, Scoring, ScoringConfig,
};

/// A short chart exercising every object kind:
///
/// - tap at 500ms (lane 0), tap at 1000ms (lane 1)
/// - hold 1500-2000ms (lane 4): 4 ticks
/// - slam at 2200ms into a flat 500ms laser tail (left lane): 4 ticks
fn mixed_chart() -> Chart {
    let mut b = ChartBuilder::new();
    b.timing_point(TimingPoint::common_time(0, 120.0));
    b.object(ChartObject::button(500, 0));
    b.object(ChartObject::button(1000, 1));
    b.object(ChartObject::hold(1500, 4, 500));
    let slam = b.object(ChartObject::slam(2200, 0, 0.2, 0.9));
    let tail = b.object(ChartObject::laser(2200, 0, 500, 0.9, 0.9));
    b.link(slam, tail);
    b.build().unwrap()
}

fn run_session(
    chart: &Chart,
    config: ScoringConfig,
    end_time: i64,
    mut input_for: impl FnMut(i64) -> InputFrame,
) -> Scoring {
    let mut cursor = PlaybackCursor::new();
    assert!(cursor.reset(chart, 0));
    let mut scoring = Scoring::new(config);
    assert!(scoring.reset(chart));

    let mut t = 0;
    while t <= end_time {
        let events = cursor.update(chart, t);
        scoring.apply_playback_events(chart, &events);
        scoring.tick(chart, &cursor, &input_for(t), 0.01);
        t += 10;
    }
    scoring
}

#[test]
fn accurate_manual_play() {
    let chart = mixed_chart();
    let scoring = run_session(&chart, ScoringConfig::default(), 3000, |t| match t {
        // 10ms late press: Perfect.
        510 => InputFrame::press(510, 0),
        // 50ms late press: Good.
        1050 => InputFrame::press(1050, 1),
        // Flick rightward just after the slam.
        2210 => InputFrame::laser(0, 0.4),
        _ if (1500..=2000).contains(&t) => InputFrame::held(&[4]),
        _ => InputFrame::idle(),
    });

    // 2 shorts + 8 chain ticks; 2 + 1 + 8*2 = 19 of 20 points.
    assert_eq!(scoring.max_hit_score(), 20);
    assert_eq!(scoring.hit_score(), 19);
    assert_eq!(scoring.current_score(), 9_500_000);

    assert_eq!(scoring.counts().count(HitRating::Miss), 0);
    assert_eq!(scoring.counts().count(HitRating::Good), 1);
    assert_eq!(scoring.counts().count(HitRating::Perfect), 9);
    assert_eq!(scoring.max_combo(), 10);
    assert_eq!(scoring.combo(), 10);

    // Full gauge budget earned.
    assert!((scoring.gauge() - 1.0).abs() < 1e-6);

    let summary = scoring.summary();
    assert_eq!(summary.mark, ClearMark::FullCombo);
    assert_eq!(summary.grade, Grade::AA);
}

#[test]
fn autoplay_is_flawless() {
    let chart = mixed_chart();
    let scoring = run_session(&chart, ScoringConfig::autoplay(), 3000, |_| {
        InputFrame::idle()
    });

    assert_eq!(scoring.current_score(), MAX_DISPLAY_SCORE);
    assert_eq!(scoring.counts().count(HitRating::Miss), 0);
    assert_eq!(scoring.summary().mark, ClearMark::Perfect);
    assert_eq!(scoring.summary().grade, Grade::AAA);
}

#[test]
fn ignoring_everything_misses_everything() {
    let chart = mixed_chart();
    let scoring = run_session(&chart, ScoringConfig::default(), 3000, |_| {
        InputFrame::idle()
    });

    assert_eq!(scoring.hit_score(), 0);
    assert_eq!(scoring.current_score(), 0);
    assert_eq!(scoring.counts().count(HitRating::Miss), 10);
    assert_eq!(scoring.max_combo(), 0);
    assert_eq!(scoring.summary().mark, ClearMark::Exited);
    assert_eq!(scoring.summary().grade, Grade::D);
}

#[test]
fn miss_resets_combo_midway() {
    let chart = mixed_chart();
    // Hit the first tap, drop the second, then play the rest cleanly.
    let scoring = run_session(&chart, ScoringConfig::default(), 3000, |t| match t {
        500 => InputFrame::press(500, 0),
        2210 => InputFrame::laser(0, 0.4),
        _ if (1500..=2000).contains(&t) => InputFrame::held(&[4]),
        _ => InputFrame::idle(),
    });

    assert_eq!(scoring.counts().count(HitRating::Miss), 1);
    // 1 before the miss, 8 after.
    assert_eq!(scoring.max_combo(), 8);
    assert_eq!(scoring.combo(), 8);
    assert_eq!(scoring.summary().mark, ClearMark::Cleared);
}

#[test]
fn restart_produces_identical_results() {
    let chart = mixed_chart();
    let a = run_session(&chart, ScoringConfig::autoplay(), 3000, |_| {
        InputFrame::idle()
    });

    // Same engine, reset and rerun.
    let mut cursor = PlaybackCursor::new();
    assert!(cursor.reset(&chart, 0));
    let mut b = Scoring::new(ScoringConfig::autoplay());
    assert!(b.reset(&chart));
    let mut t = 0;
    while t <= 3000 {
        let events = cursor.update(&chart, t);
        b.apply_playback_events(&chart, &events);
        b.tick(&chart, &cursor, &InputFrame::idle(), 0.01);
        t += 10;
    }
    assert!(cursor.reset(&chart, 0));
    assert!(b.reset(&chart));
    let mut t = 0;
    while t <= 3000 {
        let events = cursor.update(&chart, t);
        b.apply_playback_events(&chart, &events);
        b.tick(&chart, &cursor, &InputFrame::idle(), 0.01);
        t += 10;
    }

    assert_eq!(a.current_score(), b.current_score());
    assert_eq!(a.max_combo(), b.max_combo());
    assert_eq!(a.counts(), b.counts());
}
