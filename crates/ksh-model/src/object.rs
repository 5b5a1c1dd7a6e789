use serde::{Deserialize, Serialize};

/// Number of button lanes (4 primary + 2 auxiliary FX lanes).
pub const BUTTON_LANE_COUNT: usize = 6;

/// Number of laser lanes.
pub const LASER_LANE_COUNT: usize = 2;

/// Filter type applied to audio while a laser on the controlling lane is
/// active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LaserEffectType {
    None,
    #[default]
    Peaking,
    LowPass,
    HighPass,
    Bitcrush,
}

/// How strongly the track rolls with laser movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackRollBehaviour {
    Zero,
    #[default]
    Normal,
    Bigger,
    Biggest,
    Manual,
}

/// Chart events are consumed as they become current and never produce ticks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EventData {
    LaserEffectType(LaserEffectType),
    /// Effect wet/dry mix in [0, 1]
    LaserEffectMix(f32),
    /// Slam sample volume in [0, 1]
    SlamVolume(f32),
    TrackRollBehaviour(TrackRollBehaviour),
}

/// A single tap note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonObject {
    /// Lane index (0-5)
    pub lane: usize,
}

/// A sustained note. One logical hold may be split into a chain of segments
/// at effect-parameter changes; segments are linked by arena indices into the
/// chart's object array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldObject {
    /// Lane index (0-5)
    pub lane: usize,
    /// Duration in milliseconds
    pub duration: i64,
    /// Index of the preceding segment of the same logical hold
    pub prev: Option<usize>,
    /// Index of the continuation segment of the same logical hold
    pub next: Option<usize>,
}

/// A laser segment. Contiguous segments form a chain via `prev`/`next`;
/// the chain root (no `prev`) anchors tick generation for the whole chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserObject {
    /// Laser lane (0 = left, 1 = right)
    pub lane: usize,
    /// Duration in milliseconds (0 for slams)
    pub duration: i64,
    /// Start position; [0, 1], or [-0.5, 1.5] when `extended`
    pub start: f32,
    /// End position, same range as `start`
    pub end: f32,
    /// Slam: near-zero-duration segment with a large position jump
    pub instant: bool,
    /// Extended horizontal range
    pub extended: bool,
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

impl LaserObject {
    /// Sign of the position sweep: 1 rightward, -1 leftward, 0 flat.
    pub fn direction(&self) -> i32 {
        if self.end > self.start {
            1
        } else if self.end < self.start {
            -1
        } else {
            0
        }
    }

    /// Target position `at` milliseconds after the segment start, clamped to
    /// the segment's span. Slams report their end position.
    pub fn sample(&self, at: i64) -> f32 {
        if self.duration <= 0 {
            return self.end;
        }
        let f = (at as f32 / self.duration as f32).clamp(0.0, 1.0);
        self.start + (self.end - self.start) * f
    }

    /// Position range covered by this segment's lane.
    pub fn position_range(&self) -> (f32, f32) {
        if self.extended { (-0.5, 1.5) } else { (0.0, 1.0) }
    }
}

/// The payload of a chart object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectKind {
    Button(ButtonObject),
    Hold(HoldObject),
    Laser(LaserObject),
    Event(EventData),
}

/// A chart object: a point in time plus a variant-specific payload.
///
/// Objects are sorted by `time`; simultaneous objects place slam laser
/// segments first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartObject {
    /// Time in milliseconds
    pub time: i64,
    pub kind: ObjectKind,
}

impl ChartObject {
    pub fn button(time: i64, lane: usize) -> Self {
        Self {
            time,
            kind: ObjectKind::Button(ButtonObject { lane }),
        }
    }

    pub fn hold(time: i64, lane: usize, duration: i64) -> Self {
        Self {
            time,
            kind: ObjectKind::Hold(HoldObject {
                lane,
                duration,
                prev: None,
                next: None,
            }),
        }
    }

    pub fn laser(time: i64, lane: usize, duration: i64, start: f32, end: f32) -> Self {
        Self {
            time,
            kind: ObjectKind::Laser(LaserObject {
                lane,
                duration,
                start,
                end,
                instant: false,
                extended: false,
                prev: None,
                next: None,
            }),
        }
    }

    /// A slam: instantaneous position jump on a laser lane.
    pub fn slam(time: i64, lane: usize, start: f32, end: f32) -> Self {
        Self {
            time,
            kind: ObjectKind::Laser(LaserObject {
                lane,
                duration: 0,
                start,
                end,
                instant: true,
                extended: false,
                prev: None,
                next: None,
            }),
        }
    }

    pub fn event(time: i64, data: EventData) -> Self {
        Self {
            time,
            kind: ObjectKind::Event(data),
        }
    }

    /// Duration in milliseconds; 0 for instantaneous objects.
    pub fn duration(&self) -> i64 {
        match &self.kind {
            ObjectKind::Hold(h) => h.duration,
            ObjectKind::Laser(l) => l.duration,
            _ => 0,
        }
    }

    /// End-of-life time: `time + duration`, or just `time` for
    /// instantaneous objects.
    pub fn end_time(&self) -> i64 {
        self.time + self.duration()
    }

    /// Button/hold lane, or laser lane for laser segments.
    pub fn lane(&self) -> Option<usize> {
        match &self.kind {
            ObjectKind::Button(b) => Some(b.lane),
            ObjectKind::Hold(h) => Some(h.lane),
            ObjectKind::Laser(l) => Some(l.lane),
            ObjectKind::Event(_) => None,
        }
    }

    pub fn is_button(&self) -> bool {
        matches!(self.kind, ObjectKind::Button(_))
    }

    pub fn is_hold(&self) -> bool {
        matches!(self.kind, ObjectKind::Hold(_))
    }

    pub fn is_laser(&self) -> bool {
        matches!(self.kind, ObjectKind::Laser(_))
    }

    pub fn is_event(&self) -> bool {
        matches!(self.kind, ObjectKind::Event(_))
    }

    pub fn is_instant_laser(&self) -> bool {
        matches!(&self.kind, ObjectKind::Laser(l) if l.instant)
    }

    /// Link indices of a chained object, `(prev, next)`.
    pub fn chain_links(&self) -> (Option<usize>, Option<usize>) {
        match &self.kind {
            ObjectKind::Hold(h) => (h.prev, h.next),
            ObjectKind::Laser(l) => (l.prev, l.next),
            _ => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laser_direction() {
        let up = ChartObject::slam(0, 0, 0.2, 0.9);
        let down = ChartObject::slam(0, 0, 0.9, 0.2);
        let flat = ChartObject::laser(0, 0, 100, 0.5, 0.5);
        let dir = |o: &ChartObject| match &o.kind {
            ObjectKind::Laser(l) => l.direction(),
            _ => unreachable!(),
        };
        assert_eq!(dir(&up), 1);
        assert_eq!(dir(&down), -1);
        assert_eq!(dir(&flat), 0);
    }

    #[test]
    fn laser_sample_interpolates() {
        let obj = ChartObject::laser(0, 0, 100, 0.0, 1.0);
        let ObjectKind::Laser(l) = &obj.kind else {
            unreachable!()
        };
        assert!((l.sample(0) - 0.0).abs() < 1e-6);
        assert!((l.sample(50) - 0.5).abs() < 1e-6);
        assert!((l.sample(100) - 1.0).abs() < 1e-6);
        // Clamped past the end
        assert!((l.sample(250) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn slam_samples_end_position() {
        let obj = ChartObject::slam(0, 1, 0.0, 0.8);
        let ObjectKind::Laser(l) = &obj.kind else {
            unreachable!()
        };
        assert!((l.sample(0) - 0.8).abs() < 1e-6);
        assert!(l.instant);
    }

    #[test]
    fn end_time_per_variant() {
        assert_eq!(ChartObject::button(100, 0).end_time(), 100);
        assert_eq!(ChartObject::hold(100, 0, 400).end_time(), 500);
        assert_eq!(ChartObject::slam(100, 0, 0.0, 1.0).end_time(), 100);
    }

    #[test]
    fn event_has_no_lane() {
        let ev = ChartObject::event(0, EventData::SlamVolume(0.5));
        assert_eq!(ev.lane(), None);
        assert!(ev.is_event());
    }
}
