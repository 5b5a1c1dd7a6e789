use criterion::{Criterion, criterion_group, criterion_main};

use ksh_model::{Chart, ChartBuilder, ChartObject, TimingPoint};
use ksh_playback::PlaybackCursor;
use ksh_rule::{InputFrame, Scoring, ScoringConfig};

/// A dense synthetic chart: taps on the primary lanes, holds on an
/// auxiliary lane, short laser sweeps.
fn dense_chart() -> Chart {
    let mut b = ChartBuilder::new();
    b.timing_point(TimingPoint::common_time(0, 160.0));
    for i in 0..2000i64 {
        let t = i * 60;
        match i % 5 {
            2 => {
                b.object(ChartObject::hold(t, 4, 240));
            }
            3 => {
                b.object(ChartObject::laser(t, 0, 240, 0.0, 1.0));
            }
            _ => {
                b.object(ChartObject::button(t, (i % 4) as usize));
            }
        }
    }
    b.build().unwrap()
}

fn bench_autoplay_session(c: &mut Criterion) {
    let chart = dense_chart();
    let end_time = 2000 * 60 + 1000;

    c.bench_function("autoplay_session", |b| {
        b.iter(|| {
            let mut cursor = PlaybackCursor::new();
            assert!(cursor.reset(&chart, 0));
            let mut scoring = Scoring::new(ScoringConfig::autoplay());
            assert!(scoring.reset(&chart));

            let idle = InputFrame::idle();
            let mut t = 0;
            while t < end_time {
                let events = cursor.update(&chart, t);
                scoring.apply_playback_events(&chart, &events);
                scoring.tick(&chart, &cursor, &idle, 0.008);
                t += 8;
            }
            scoring.current_score()
        })
    });
}

fn bench_session_reset(c: &mut Criterion) {
    let chart = dense_chart();
    c.bench_function("session_reset", |b| {
        b.iter(|| {
            let mut scoring = Scoring::new(ScoringConfig::default());
            assert!(scoring.reset(&chart));
            scoring.max_hit_score()
        })
    });
}

criterion_group!(benches, bench_autoplay_session, bench_session_reset);
criterion_main!(benches);
