//! Judgment engine.
//!
//! Consumes playback-cursor notifications to materialize per-lane tick
//! queues, matches ticks against input within timing windows, and maintains
//! combo, gauge, score and engagement state for presentation.
//!
//! Per-frame order: laser position integration, discrete input consumption,
//! then the tick sweep. Every tick resolves exactly once (Hit or Miss) and
//! is destroyed on resolution.

use std::collections::{HashMap, VecDeque};

use log::warn;

use ksh_model::{BUTTON_LANE_COUNT, Chart, ChartObject, LASER_LANE_COUNT, ObjectKind};
use ksh_playback::{
    PlaybackCursor, PlaybackEvent, ScoreTick, TickFlags, button_tick, compute_hold_ticks,
    compute_laser_ticks,
};

use crate::HitRating;
use crate::config::ScoringConfig;
use crate::gauge::HealthGauge;
use crate::input::{InputFrame, direction_sign};
use crate::score::{ClearMark, Grade, HitCounts, ScoreSummary, calculate_score};

/// Judgment lanes: 4 buttons + 2 auxiliary + 2 lasers.
pub const LANE_COUNT: usize = 8;

/// Queue index of the first laser lane.
const LASER_LANE_BASE: usize = BUTTON_LANE_COUNT;

/// Hold/laser tick hits are worth a flat 2 points.
const CHAIN_TICK_SCORE: u32 = 2;

/// Per-object judgment record, keyed by the chain root for holds/lasers.
///
/// Created when the object's first tick is materialized; lives until the
/// session is reset.
#[derive(Debug, Clone, PartialEq)]
pub struct HitStat {
    /// Chain-root object index
    pub object: usize,
    /// Signed delta of the last input-driven resolution (ms)
    pub delta: i64,
    pub rating: HitRating,
    /// Hold/laser ticks hit so far
    pub hold: u32,
    /// Hold/laser ticks belonging to the chain
    pub hold_max: u32,
    /// Whether any sub-tick of the chain has missed
    pub has_missed: bool,
}

impl HitStat {
    fn new(object: usize) -> Self {
        Self {
            object,
            delta: 0,
            rating: HitRating::Idle,
            hold: 0,
            hold_max: 0,
            has_missed: false,
        }
    }
}

/// Notifications produced by [`Scoring::tick`], drained once per frame by
/// presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoringEvent {
    /// A button tick resolved as a hit, or a press whiffed (`rating` Idle,
    /// no object).
    ButtonHit {
        lane: usize,
        rating: HitRating,
        delta: i64,
        object: Option<usize>,
    },
    /// A button or hold tick missed.
    ButtonMiss { lane: usize, object: Option<usize> },
    /// A slam resolved as a hit.
    LaserSlamHit { lane: usize, object: usize },
    ComboChanged(u32),
    ScoreChanged(u32),
}

enum Resolution {
    Hit(HitRating, i64),
    Miss,
    Defer,
}

/// The judgment engine.
///
/// Single-threaded and frame-driven: feed it the cursor's events, then call
/// [`Scoring::tick`] once per game-loop iteration. Reset together with the
/// playback cursor.
pub struct Scoring {
    config: ScoringConfig,

    // Per-lane pending ticks, time-ordered
    ticks: [VecDeque<ScoreTick>; LANE_COUNT],

    // Lane -> currently engaged hold/laser chain root
    held: [Option<usize>; LANE_COUNT],

    // Laser tracking
    laser_pending: [VecDeque<usize>; LASER_LANE_COUNT],
    laser_active: [Option<usize>; LASER_LANE_COUNT],
    laser_position: [f32; LASER_LANE_COUNT],
    laser_target: [Option<f32>; LASER_LANE_COUNT],
    laser_input: [f32; LASER_LANE_COUNT],
    time_since_laser_used: [f32; LASER_LANE_COUNT],
    assist_ticks: [u32; LASER_LANE_COUNT],

    // Score state
    combo: u32,
    max_combo: u32,
    hit_score: u32,
    max_hit_score: u32,
    counts: HitCounts,
    idle_hits: u32,
    gauge: HealthGauge,
    hit_stats: HashMap<usize, HitStat>,

    initialized: bool,
}

impl Scoring {
    pub fn new(config: ScoringConfig) -> Self {
        let gauge = HealthGauge::new(config.gauge_total, config.short_miss_drain, 0, 0);
        Self {
            config,
            ticks: Default::default(),
            held: [None; LANE_COUNT],
            laser_pending: Default::default(),
            laser_active: [None; LASER_LANE_COUNT],
            laser_position: [0.0, 1.0],
            laser_target: [None; LASER_LANE_COUNT],
            laser_input: [0.0; LASER_LANE_COUNT],
            time_since_laser_used: [0.0; LASER_LANE_COUNT],
            assist_ticks: [0; LASER_LANE_COUNT],
            combo: 0,
            max_combo: 0,
            hit_score: 0,
            max_hit_score: 0,
            counts: HitCounts::default(),
            idle_hits: 0,
            gauge,
            hit_stats: HashMap::new(),
            initialized: false,
        }
    }

    /// Re-initialize for a session on `chart`. Counts the chart's weighted
    /// ticks once to fix the gauge gains and the maximum hit score.
    ///
    /// Returns false for a chart with no objects or no timing points; play
    /// must not proceed in that case. Must be called together with the
    /// playback cursor's reset.
    #[must_use]
    pub fn reset(&mut self, chart: &Chart) -> bool {
        if chart.objects.is_empty() || chart.timing_points.is_empty() {
            warn!("cannot start scoring session on an empty chart");
            self.initialized = false;
            return false;
        }

        let mut shorts: u32 = 0;
        let mut chain_ticks: u32 = 0;
        for (index, obj) in chart.objects.iter().enumerate() {
            match &obj.kind {
                ObjectKind::Button(_) => shorts += 1,
                ObjectKind::Hold(_) => {
                    chain_ticks += compute_hold_ticks(chart, index).len() as u32;
                }
                ObjectKind::Laser(laser) => {
                    if laser.prev.is_none() {
                        chain_ticks += compute_laser_ticks(chart, index).len() as u32;
                    }
                }
                ObjectKind::Event(_) => {}
            }
        }

        self.max_hit_score = 2 * (shorts + chain_ticks);
        self.gauge = HealthGauge::new(
            self.config.gauge_total,
            self.config.short_miss_drain,
            shorts,
            chain_ticks,
        );

        for queue in &mut self.ticks {
            queue.clear();
        }
        self.held = [None; LANE_COUNT];
        for queue in &mut self.laser_pending {
            queue.clear();
        }
        self.laser_active = [None; LASER_LANE_COUNT];
        self.laser_position = [0.0, 1.0];
        self.laser_target = [None; LASER_LANE_COUNT];
        self.laser_input = [0.0; LASER_LANE_COUNT];
        self.time_since_laser_used = [0.0; LASER_LANE_COUNT];
        self.assist_ticks = [0; LASER_LANE_COUNT];
        self.combo = 0;
        self.max_combo = 0;
        self.hit_score = 0;
        self.counts = HitCounts::default();
        self.idle_hits = 0;
        self.hit_stats.clear();
        self.initialized = true;
        true
    }

    /// Feed the playback cursor's notifications for this frame. Entering
    /// objects materialize their ticks; leaving objects release engagement.
    pub fn apply_playback_events(&mut self, chart: &Chart, events: &[PlaybackEvent]) {
        if !self.initialized {
            return;
        }
        for event in events {
            match event {
                PlaybackEvent::ObjectEntered { index } => self.enqueue_object(chart, *index),
                PlaybackEvent::ObjectLeft { index } => self.release_expired(chart, *index),
                _ => {}
            }
        }
    }

    /// Per-frame update: integrate laser positions, consume discrete input,
    /// sweep the lane queues. `delta_time` is the frame duration in seconds.
    pub fn tick(
        &mut self,
        chart: &Chart,
        cursor: &PlaybackCursor,
        input: &InputFrame,
        delta_time: f32,
    ) -> Vec<ScoringEvent> {
        let mut events = Vec::new();
        if !self.initialized {
            return events;
        }
        let time = cursor.time();
        self.integrate_lasers(chart, time, input, delta_time);
        self.process_input_events(chart, input, &mut events);
        self.sweep_ticks(chart, time, input, &mut events);
        events
    }

    fn enqueue_object(&mut self, chart: &Chart, index: usize) {
        match &chart.objects[index].kind {
            ObjectKind::Button(button) => {
                self.ticks[button.lane].push_back(button_tick(chart, index));
            }
            ObjectKind::Hold(hold) => {
                let ticks = compute_hold_ticks(chart, index);
                let root = chart.chain_root(index);
                self.stat_mut(root).hold_max += ticks.len() as u32;
                self.ticks[hold.lane].extend(ticks);
            }
            ObjectKind::Laser(laser) => {
                if laser.prev.is_none() {
                    let ticks = compute_laser_ticks(chart, index);
                    self.stat_mut(index).hold_max += ticks.len() as u32;
                    self.ticks[LASER_LANE_BASE + laser.lane].extend(ticks);
                }
                self.laser_pending[laser.lane].push_back(index);
            }
            ObjectKind::Event(_) => {}
        }
    }

    fn release_expired(&mut self, chart: &Chart, index: usize) {
        let obj = &chart.objects[index];
        let Some(lane) = queue_lane(obj) else {
            return;
        };
        if chart.next_in_chain(index).is_some() {
            return;
        }
        let root = chart.chain_root(index);
        if self.held[lane] == Some(root) {
            self.held[lane] = None;
        }
        if let ObjectKind::Laser(laser) = &obj.kind
            && self.laser_active[laser.lane] == Some(index)
        {
            self.laser_active[laser.lane] = None;
            self.laser_target[laser.lane] = None;
        }
    }

    /// Move the visible laser cursors toward their targets.
    fn integrate_lasers(&mut self, chart: &Chart, time: i64, input: &InputFrame, delta_time: f32) {
        for lane in 0..LASER_LANE_COUNT {
            self.laser_input[lane] = input.lasers[lane];

            // Promote pending segments that have started.
            while let Some(&front) = self.laser_pending[lane].front() {
                if chart.objects[front].time <= time {
                    self.laser_active[lane] = Some(front);
                    self.laser_pending[lane].pop_front();
                } else {
                    break;
                }
            }
            // A finished segment with no continuation stops governing.
            if let Some(active) = self.laser_active[lane]
                && time > chart.objects[active].end_time()
                && chart.next_in_chain(active).is_none()
            {
                self.laser_active[lane] = None;
            }

            let Some(active) = self.laser_active[lane] else {
                self.laser_target[lane] = None;
                self.time_since_laser_used[lane] += delta_time;
                continue;
            };
            let obj = &chart.objects[active];
            let ObjectKind::Laser(laser) = &obj.kind else {
                continue;
            };
            let target = laser.sample(time - obj.time);
            self.laser_target[lane] = Some(target);
            self.time_since_laser_used[lane] = 0.0;

            if self.config.autoplay {
                self.laser_position[lane] = target;
                continue;
            }

            let (lo, hi) = laser.position_range();
            let mut position = (self.laser_position[lane] + input.lasers[lane]).clamp(lo, hi);
            let remaining = target - position;
            // Flat segments always snap; otherwise auto-centering requires
            // earned assist.
            let flat = !laser.instant && laser.direction() == 0;
            if remaining.abs() <= self.config.laser_distance_leniency
                && (flat || self.assist_ticks[lane] > 0)
            {
                position = target;
            }
            self.laser_position[lane] = position;
        }
    }

    /// Consume discrete press events against pending button / hold-start
    /// ticks; a press with nothing in range reports an Idle whiff.
    fn process_input_events(
        &mut self,
        chart: &Chart,
        input: &InputFrame,
        events: &mut Vec<ScoringEvent>,
    ) {
        for input_event in &input.events {
            if !input_event.pressed || input_event.lane >= BUTTON_LANE_COUNT {
                continue;
            }
            let lane = input_event.lane;

            let mut best: Option<(usize, i64)> = None;
            for (queue_index, tick) in self.ticks[lane].iter().enumerate() {
                let delta = input_event.time - tick.time;
                if delta.abs() > self.config.good_window {
                    if tick.time > input_event.time {
                        break;
                    }
                    continue;
                }
                let consumable = tick.flags.has(TickFlags::BUTTON)
                    || (tick.flags.has(TickFlags::HOLD) && tick.flags.has(TickFlags::START));
                if !consumable {
                    continue;
                }
                match best {
                    Some((_, best_delta)) if delta.abs() >= best_delta.abs() => {}
                    _ => best = Some((queue_index, delta)),
                }
            }

            match best {
                Some((queue_index, delta)) => {
                    if let Some(tick) = self.ticks[lane].remove(queue_index) {
                        let rating = if delta.abs() <= self.config.perfect_window {
                            HitRating::Perfect
                        } else {
                            HitRating::Good
                        };
                        self.apply_hit(chart, lane, &tick, rating, delta, events);
                    }
                }
                None => {
                    self.idle_hits += 1;
                    events.push(ScoringEvent::ButtonHit {
                        lane,
                        rating: HitRating::Idle,
                        delta: 0,
                        object: None,
                    });
                }
            }
        }
    }

    /// Resolve every due tick, in time order per lane.
    fn sweep_ticks(
        &mut self,
        chart: &Chart,
        time: i64,
        input: &InputFrame,
        events: &mut Vec<ScoringEvent>,
    ) {
        for lane in 0..LANE_COUNT {
            loop {
                let Some(&tick) = self.ticks[lane].front() else {
                    break;
                };
                let delta = time - tick.time;
                if delta < 0 {
                    break;
                }
                match self.resolve_tick(chart, lane, &tick, delta, input) {
                    Resolution::Hit(rating, hit_delta) => {
                        self.ticks[lane].pop_front();
                        self.apply_hit(chart, lane, &tick, rating, hit_delta, events);
                    }
                    Resolution::Miss => {
                        self.ticks[lane].pop_front();
                        self.apply_miss(chart, lane, &tick, events);
                    }
                    Resolution::Defer => break,
                }
            }
        }
    }

    fn resolve_tick(
        &self,
        chart: &Chart,
        lane: usize,
        tick: &ScoreTick,
        delta: i64,
        input: &InputFrame,
    ) -> Resolution {
        let config = &self.config;

        if tick.flags.has(TickFlags::BUTTON) {
            if config.autoplay || config.autoplay_buttons {
                return Resolution::Hit(HitRating::Perfect, 0);
            }
            // Pending until a press consumes it or the window closes.
            if delta > config.good_window {
                return Resolution::Miss;
            }
            return Resolution::Defer;
        }

        if tick.flags.has(TickFlags::HOLD) {
            // Presence is sampled, not timed.
            let held = lane < BUTTON_LANE_COUNT && input.buttons[lane];
            if config.autoplay || config.autoplay_buttons || held {
                return Resolution::Hit(HitRating::Perfect, 0);
            }
            if delta > config.good_window {
                return Resolution::Miss;
            }
            return Resolution::Defer;
        }

        if tick.flags.has(TickFlags::SLAM) {
            if config.autoplay {
                return Resolution::Hit(HitRating::Perfect, 0);
            }
            let ObjectKind::Laser(laser) = &chart.objects[tick.object].kind else {
                return Resolution::Miss;
            };
            let direction = laser.direction();
            if delta > 0
                && direction != 0
                && direction_sign(self.laser_input[laser.lane]) == direction
            {
                return Resolution::Hit(HitRating::Perfect, delta);
            }
            if delta > config.good_window {
                return Resolution::Miss;
            }
            return Resolution::Defer;
        }

        if tick.flags.has(TickFlags::LASER) {
            if config.autoplay {
                return Resolution::Hit(HitRating::Perfect, 0);
            }
            let laser_lane = lane - LASER_LANE_BASE;
            if let Some(target) = self.laser_target[laser_lane]
                && (self.laser_position[laser_lane] - target).abs()
                    <= config.laser_distance_leniency
            {
                return Resolution::Hit(HitRating::Perfect, 0);
            }
            if delta > config.good_window {
                return Resolution::Miss;
            }
            return Resolution::Defer;
        }

        Resolution::Miss
    }

    fn apply_hit(
        &mut self,
        chart: &Chart,
        lane: usize,
        tick: &ScoreTick,
        rating: HitRating,
        delta: i64,
        events: &mut Vec<ScoringEvent>,
    ) {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);

        let is_short = tick.flags.has(TickFlags::BUTTON);
        self.hit_score += if is_short {
            rating.score_value()
        } else {
            CHAIN_TICK_SCORE
        };
        self.gauge.on_hit(is_short);
        self.counts.add(rating, delta < 0);

        let assist_cap = self.config.laser_assist_level;
        let root = chart.chain_root(tick.object);
        {
            let stat = self.stat_mut(root);
            if is_short {
                stat.delta = delta;
                stat.rating = rating;
            } else {
                stat.hold += 1;
                if tick.flags.has(TickFlags::SLAM) || tick.flags.has(TickFlags::START) {
                    stat.delta = delta;
                }
                stat.rating = if stat.has_missed {
                    HitRating::Good
                } else {
                    HitRating::Perfect
                };
            }
        }

        if tick.flags.has(TickFlags::SLAM) {
            if let ObjectKind::Laser(laser) = &chart.objects[tick.object].kind {
                // A hit slam yanks the cursor to its landing position.
                self.laser_position[laser.lane] = laser.end;
                events.push(ScoringEvent::LaserSlamHit {
                    lane: laser.lane,
                    object: tick.object,
                });
            }
        } else if tick.flags.has(TickFlags::LASER) {
            let laser_lane = lane - LASER_LANE_BASE;
            // Assist is earned by ticks tracked without fresh input and
            // spent by ticks that needed it.
            if self.laser_input[laser_lane] == 0.0 {
                self.assist_ticks[laser_lane] = (self.assist_ticks[laser_lane] + 1).min(assist_cap);
            } else {
                self.assist_ticks[laser_lane] = self.assist_ticks[laser_lane].saturating_sub(1);
            }
            self.held[lane] = Some(root);
        }

        if tick.flags.has(TickFlags::HOLD) {
            self.held[lane] = Some(root);
        }

        // Press feedback for taps and hold entries.
        if is_short || (tick.flags.has(TickFlags::HOLD) && tick.flags.has(TickFlags::START)) {
            events.push(ScoringEvent::ButtonHit {
                lane,
                rating,
                delta,
                object: Some(tick.object),
            });
        }
        events.push(ScoringEvent::ComboChanged(self.combo));
        events.push(ScoringEvent::ScoreChanged(self.current_score()));
    }

    fn apply_miss(
        &mut self,
        chart: &Chart,
        lane: usize,
        tick: &ScoreTick,
        events: &mut Vec<ScoringEvent>,
    ) {
        if self.combo != 0 {
            self.combo = 0;
            events.push(ScoringEvent::ComboChanged(0));
        }
        let is_short = tick.flags.has(TickFlags::BUTTON);
        self.gauge.on_miss(is_short);
        self.counts.add(HitRating::Miss, false);

        let root = chart.chain_root(tick.object);
        {
            let stat = self.stat_mut(root);
            stat.has_missed = true;
            stat.rating = if is_short || stat.hold == 0 {
                HitRating::Miss
            } else {
                HitRating::Good
            };
        }
        if self.held[lane] == Some(root) {
            self.held[lane] = None;
        }

        if is_short || tick.flags.has(TickFlags::HOLD) {
            events.push(ScoringEvent::ButtonMiss {
                lane,
                object: Some(tick.object),
            });
        }
    }

    fn stat_mut(&mut self, root: usize) -> &mut HitStat {
        self.hit_stats
            .entry(root)
            .or_insert_with(|| HitStat::new(root))
    }

    // --- Getters ---

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    /// Accumulated raw hit score.
    pub fn hit_score(&self) -> u32 {
        self.hit_score
    }

    pub fn max_hit_score(&self) -> u32 {
        self.max_hit_score
    }

    /// Display score in [0, 10,000,000].
    pub fn current_score(&self) -> u32 {
        calculate_score(self.hit_score, self.max_hit_score)
    }

    pub fn current_grade(&self) -> Grade {
        Grade::from_score(self.current_score(), self.gauge.value())
    }

    pub fn gauge(&self) -> f32 {
        self.gauge.value()
    }

    pub fn counts(&self) -> &HitCounts {
        &self.counts
    }

    /// Presses that matched no pending tick.
    pub fn idle_hits(&self) -> u32 {
        self.idle_hits
    }

    /// Whether a lane currently has an engaged hold/laser chain.
    pub fn is_object_held(&self, lane: usize) -> bool {
        lane < LANE_COUNT && self.held[lane].is_some()
    }

    pub fn held_object(&self, lane: usize) -> Option<usize> {
        self.held.get(lane).copied().flatten()
    }

    /// Visible laser cursor positions.
    pub fn laser_positions(&self) -> [f32; LASER_LANE_COUNT] {
        self.laser_position
    }

    /// Target position of the active segment on a laser lane, if any.
    pub fn laser_target(&self, lane: usize) -> Option<f32> {
        self.laser_target.get(lane).copied().flatten()
    }

    /// Seconds since a laser lane last had an active segment; presentation
    /// fades the pointer on this.
    pub fn time_since_laser_used(&self, lane: usize) -> f32 {
        self.time_since_laser_used.get(lane).copied().unwrap_or(0.0)
    }

    /// Judgment record for an object (chain segments share their root's).
    pub fn hit_stat(&self, chart: &Chart, object: usize) -> Option<&HitStat> {
        self.hit_stats.get(&chart.chain_root(object))
    }

    /// Pending tick count for a lane.
    pub fn pending_ticks(&self, lane: usize) -> usize {
        self.ticks.get(lane).map(|q| q.len()).unwrap_or(0)
    }

    /// Snapshot of the session's final numbers.
    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary {
            score: self.current_score(),
            grade: self.current_grade(),
            gauge: self.gauge.value(),
            max_combo: self.max_combo,
            counts: self.counts.clone(),
            mark: ClearMark::from_results(self.gauge.is_clear(), &self.counts),
        }
    }
}

fn queue_lane(obj: &ChartObject) -> Option<usize> {
    match &obj.kind {
        ObjectKind::Button(b) => Some(b.lane),
        ObjectKind::Hold(h) => Some(h.lane),
        ObjectKind::Laser(l) => Some(LASER_LANE_BASE + l.lane),
        ObjectKind::Event(_) => None,
    }
}
