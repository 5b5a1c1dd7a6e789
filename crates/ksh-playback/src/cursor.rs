//! Playback cursor: tracks which timing points, chart objects and zoom
//! points are relevant to the present audio position.
//!
//! The cursor is driven by an externally supplied current time once per
//! frame. It holds indices only; the chart is passed into every call, so the
//! same cursor state never aliases chart storage.

use log::{trace, warn};

use ksh_model::{Chart, EventData, ObjectKind, ZOOM_CHANNELS};

/// Look-ahead for event objects so their values are visible before they are
/// needed (milliseconds).
const EVENT_LOOKAHEAD: i64 = 2;

/// Default forward-look for objects entering the hittable set, matching the
/// Good hit window (milliseconds).
const DEFAULT_HITTABLE_THRESHOLD: i64 = 75;

/// Notifications produced by [`PlaybackCursor::update`], drained once per
/// frame by the subscribing layers.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// The active timing point changed to `timing_points[index]`.
    TimingPointChanged { index: usize },
    /// `objects[index]` entered the hittable window.
    ObjectEntered { index: usize },
    /// `objects[index]` left the hittable window.
    ObjectLeft { index: usize },
    /// The active window of hold `objects[index]` began; the audio layer
    /// makes its effect audible.
    FxBegin { index: usize },
    /// The active window of hold `objects[index]` ended.
    FxEnd { index: usize },
    /// An event object became current.
    Event { data: EventData },
}

/// Monotonic cursor over a chart's sorted arrays.
///
/// All pointers only ever advance; resynchronization requires a full
/// [`PlaybackCursor::reset`]. An `update` presenting a time earlier than the
/// last seen one is absorbed as a no-op (audio clocks may jitter backward).
#[derive(Debug, Clone, Default)]
pub struct PlaybackCursor {
    time: i64,
    timing_index: usize,
    object_index: usize,
    /// Per-channel zoom point indices (into `zoom_lanes`), pointing at the
    /// first point strictly after `time`
    zoom_cursor: [usize; ZOOM_CHANNELS],
    /// Per-channel indices into the chart's zoom point array
    zoom_lanes: [Vec<usize>; ZOOM_CHANNELS],
    /// Objects currently inside the hittable window
    hittable: Vec<usize>,
    /// Hold objects whose FxBegin has fired but not FxEnd
    fx_active: Vec<usize>,
    bar_time: f32,
    hittable_threshold: i64,
    initialized: bool,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self {
            hittable_threshold: DEFAULT_HITTABLE_THRESHOLD,
            ..Self::default()
        }
    }

    /// Override the forward-look used for the hittable window.
    pub fn set_hittable_threshold(&mut self, threshold: i64) {
        self.hittable_threshold = threshold;
    }

    /// Re-initialize all pointers to `start_time`.
    ///
    /// Returns false when the chart has zero objects or zero timing points;
    /// play must not proceed in that case.
    #[must_use]
    pub fn reset(&mut self, chart: &Chart, start_time: i64) -> bool {
        if chart.objects.is_empty() || chart.timing_points.is_empty() {
            warn!(
                "cannot start playback: {} objects, {} timing points",
                chart.objects.len(),
                chart.timing_points.len()
            );
            self.initialized = false;
            return false;
        }

        self.time = start_time;
        self.timing_index = chart.timing_point_at(start_time);
        self.object_index = chart.objects.partition_point(|o| o.time < start_time);
        self.hittable.clear();
        self.fx_active.clear();
        self.bar_time = 0.0;

        self.zoom_lanes = Default::default();
        for (i, zp) in chart.zoom_points.iter().enumerate() {
            if zp.channel < ZOOM_CHANNELS {
                self.zoom_lanes[zp.channel].push(i);
            }
        }
        for channel in 0..ZOOM_CHANNELS {
            self.zoom_cursor[channel] = self.zoom_lanes[channel]
                .partition_point(|&i| chart.zoom_points[i].time <= start_time);
        }

        self.initialized = true;
        true
    }

    /// Advance the cursor to `new_time` and report everything that changed.
    ///
    /// Backward time is never valid input and leaves all state unchanged.
    pub fn update(&mut self, chart: &Chart, new_time: i64) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        if !self.initialized {
            return events;
        }
        if new_time < self.time {
            trace!(
                "ignoring backward playback time {new_time} < {}",
                self.time
            );
            return events;
        }

        // Beat phase of the bar under the currently active timing point.
        {
            let tp = &chart.timing_points[self.timing_index];
            let bar = tp.bar_duration();
            let phase = (new_time - tp.time) as f64 / bar;
            self.bar_time = (phase - phase.floor()) as f32;
        }

        // Advance the timing point.
        let old_timing = self.timing_index;
        while self.timing_index + 1 < chart.timing_points.len()
            && chart.timing_points[self.timing_index + 1].time <= new_time
        {
            self.timing_index += 1;
        }
        if self.timing_index != old_timing {
            events.push(PlaybackEvent::TimingPointChanged {
                index: self.timing_index,
            });
        }

        // Admit objects into the hittable window.
        while self.object_index < chart.objects.len()
            && chart.objects[self.object_index].time <= new_time + self.hittable_threshold
        {
            self.hittable.push(self.object_index);
            events.push(PlaybackEvent::ObjectEntered {
                index: self.object_index,
            });
            self.object_index += 1;
        }

        // Hold active windows drive the FX begin/end notifications.
        for &index in &self.hittable {
            let obj = &chart.objects[index];
            if !obj.is_hold() {
                continue;
            }
            let active = self.fx_active.contains(&index);
            if !active && obj.time <= new_time && new_time <= obj.end_time() {
                self.fx_active.push(index);
                events.push(PlaybackEvent::FxBegin { index });
            } else if active && new_time > obj.end_time() {
                self.fx_active.retain(|&i| i != index);
                events.push(PlaybackEvent::FxEnd { index });
            }
        }

        // Fire event objects slightly ahead of their time; they never
        // produce ticks and leave the hittable set silently.
        self.hittable.retain(|&index| {
            let obj = &chart.objects[index];
            if let ObjectKind::Event(data) = &obj.kind {
                if obj.time <= new_time + EVENT_LOOKAHEAD {
                    events.push(PlaybackEvent::Event { data: *data });
                    return false;
                }
            }
            true
        });

        // Expire objects whose end of life is past the threshold.
        self.hittable.retain(|&index| {
            let obj = &chart.objects[index];
            if obj.end_time() < new_time - self.hittable_threshold {
                events.push(PlaybackEvent::ObjectLeft { index });
                false
            } else {
                true
            }
        });

        // Advance the zoom interpolation endpoints.
        for channel in 0..ZOOM_CHANNELS {
            let lane = &self.zoom_lanes[channel];
            while self.zoom_cursor[channel] < lane.len()
                && chart.zoom_points[lane[self.zoom_cursor[channel]]].time <= new_time
            {
                self.zoom_cursor[channel] += 1;
            }
        }

        self.time = new_time;
        events
    }

    /// Current playback time in milliseconds.
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Fractional beat-phase of the current bar, in [0, 1).
    pub fn bar_time(&self) -> f32 {
        self.bar_time
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn timing_index(&self) -> usize {
        self.timing_index
    }

    pub fn current_timing_point<'c>(&self, chart: &'c Chart) -> &'c ksh_model::TimingPoint {
        &chart.timing_points[self.timing_index]
    }

    /// Objects currently inside the hittable window.
    pub fn hittable_objects(&self) -> &[usize] {
        &self.hittable
    }

    /// Hold/laser objects still active plus upcoming objects within `range`
    /// milliseconds ahead of the cursor. Presentation-facing; scoring uses
    /// the event stream instead.
    pub fn objects_in_range(&self, chart: &Chart, range: i64) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .hittable
            .iter()
            .copied()
            .filter(|&i| {
                let obj = &chart.objects[i];
                (obj.is_hold() || obj.is_laser()) && obj.end_time() >= self.time
            })
            .collect();
        for index in self.object_index..chart.objects.len() {
            if chart.objects[index].time >= self.time + range {
                break;
            }
            out.push(index);
        }
        out
    }

    /// Number of beat boundaries (subdivided by `multiplier`) in
    /// `[start, start + range)` under the timing point active at `start`,
    /// plus the bar-relative index of the first counted beat.
    pub fn count_beats(
        &self,
        chart: &Chart,
        start: i64,
        range: i64,
        multiplier: u32,
    ) -> (u32, u32) {
        let tp = &chart.timing_points[chart.timing_point_at(start)];
        let multiplier = multiplier.max(1);
        let beat = tp.beat_duration / multiplier as f64;
        let delta = (start - tp.time) as f64;

        let first = (delta / beat).ceil() as i64;
        let end = ((delta + range as f64) / beat).ceil() as i64;
        let count = (end - first).max(0) as u32;

        let beats_per_bar = (tp.numerator as i64 * multiplier as i64).max(1);
        let first_index = first.rem_euclid(beats_per_bar) as u32;
        (count, first_index)
    }

    /// Camera zoom for a channel at the cursor's time, linearly interpolated
    /// between the bracketing zoom points. 0.0 for an empty channel.
    pub fn zoom_at(&self, chart: &Chart, channel: usize) -> f32 {
        let lane = &self.zoom_lanes[channel];
        if lane.is_empty() {
            return 0.0;
        }
        let next = self.zoom_cursor[channel];
        if next == 0 {
            return chart.zoom_points[lane[0]].value;
        }
        if next >= lane.len() {
            return chart.zoom_points[lane[lane.len() - 1]].value;
        }
        let a = &chart.zoom_points[lane[next - 1]];
        let b = &chart.zoom_points[lane[next]];
        if b.time == a.time {
            return b.value;
        }
        let f = (self.time - a.time) as f32 / (b.time - a.time) as f32;
        a.value + (b.value - a.value) * f
    }
}
