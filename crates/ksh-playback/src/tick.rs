//! Score-tick generation.
//!
//! Ticks are the discrete scorable instants derived from chart objects:
//! one per tap note, a BPM-relative sequence for holds, and a chain-anchored
//! sequence for lasers. The subdivision comes from the timing point
//! governing the object's start (8th notes at >= 250 BPM, 16th below).

use std::ops::BitOr;

use ksh_model::{Chart, ObjectKind};

/// Bitset describing what a score tick is and where it sits in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickFlags(u8);

impl TickFlags {
    pub const NONE: TickFlags = TickFlags(0);
    /// First tick of a hold/laser chain
    pub const START: TickFlags = TickFlags(1);
    /// Last tick of a hold/laser chain
    pub const END: TickFlags = TickFlags(1 << 1);
    pub const HOLD: TickFlags = TickFlags(1 << 2);
    pub const BUTTON: TickFlags = TickFlags(1 << 3);
    pub const LASER: TickFlags = TickFlags(1 << 4);
    /// Instantaneous laser direction flick
    pub const SLAM: TickFlags = TickFlags(1 << 5);

    /// True when all bits of `other` are set.
    pub fn has(self, other: TickFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: TickFlags) -> TickFlags {
        TickFlags(self.0 | other.0)
    }
}

impl BitOr for TickFlags {
    type Output = TickFlags;

    fn bitor(self, rhs: TickFlags) -> TickFlags {
        self.with(rhs)
    }
}

/// A discrete scorable instant.
///
/// Created when the owning object enters the hittable window, destroyed on
/// resolution; never persisted in the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTick {
    /// Time in milliseconds
    pub time: i64,
    /// Arena index of the owning chart object (the slam segment for slam
    /// ticks, the section-start segment for other laser ticks)
    pub object: usize,
    pub flags: TickFlags,
}

impl ScoreTick {
    pub fn new(time: i64, object: usize, flags: TickFlags) -> Self {
        Self {
            time,
            object,
            flags,
        }
    }
}

/// The single tick of a tap note.
pub fn button_tick(chart: &Chart, index: usize) -> ScoreTick {
    ScoreTick::new(chart.objects[index].time, index, TickFlags::BUTTON)
}

/// Ticks of one hold segment.
///
/// `floor(duration / interval)` ticks, minimum 1 (the entry tick always
/// exists even for very short holds). `START`/`END` are set only on the
/// boundary segments of a split hold, so a chain judges as one continuous
/// run.
pub fn compute_hold_ticks(chart: &Chart, index: usize) -> Vec<ScoreTick> {
    let obj = &chart.objects[index];
    let ObjectKind::Hold(hold) = &obj.kind else {
        return Vec::new();
    };

    let tp = &chart.timing_points[chart.timing_point_at(obj.time)];
    let interval = tp.tick_interval();

    let count = ((hold.duration as f64 / interval) as usize).max(1);
    let mut ticks = Vec::with_capacity(count);
    for i in 0..count {
        let mut flags = TickFlags::HOLD;
        if i == 0 && hold.prev.is_none() {
            flags = flags | TickFlags::START;
        }
        if i == count - 1 && hold.next.is_none() {
            flags = flags | TickFlags::END;
        }
        ticks.push(ScoreTick::new(
            obj.time + (interval * i as f64) as i64,
            index,
            flags,
        ));
    }
    ticks
}

/// Ticks of a whole laser chain, anchored at its root segment.
///
/// Non-instant segments accumulate their durations into sections delimited
/// by slams; each section flushes `floor(accumulated / interval)` ticks from
/// its start, skipping the section's first tick when a slam immediately
/// precedes it. Every slam produces exactly one `SLAM` tick and resets the
/// accumulator. The first produced tick is tagged `START`, the last `END`.
///
/// Anchoring at the root keeps a chain that was split across edited
/// segments ticking as one continuous musical pattern.
pub fn compute_laser_ticks(chart: &Chart, root: usize) -> Vec<ScoreTick> {
    let root_obj = &chart.objects[root];
    let ObjectKind::Laser(root_laser) = &root_obj.kind else {
        return Vec::new();
    };
    debug_assert!(root_laser.prev.is_none(), "laser ticks anchor at the root");

    let tp = &chart.timing_points[chart.timing_point_at(root_obj.time)];
    let interval = tp.tick_interval();

    let mut ticks = Vec::new();
    let mut section_object = root;
    let mut section_start = root_obj.time;
    let mut accumulated: i64 = 0;
    let mut after_slam = false;

    let flush = |ticks: &mut Vec<ScoreTick>,
                 section_object: usize,
                 section_start: i64,
                 accumulated: i64,
                 after_slam: bool| {
        let count = (accumulated as f64 / interval) as usize;
        for i in 0..count {
            if after_slam && i == 0 {
                continue;
            }
            ticks.push(ScoreTick::new(
                section_start + (interval * i as f64) as i64,
                section_object,
                TickFlags::LASER,
            ));
        }
    };

    let mut cursor = Some(root);
    while let Some(index) = cursor {
        let obj = &chart.objects[index];
        let ObjectKind::Laser(laser) = &obj.kind else {
            break;
        };
        if laser.instant {
            flush(
                &mut ticks,
                section_object,
                section_start,
                accumulated,
                after_slam,
            );
            ticks.push(ScoreTick::new(
                obj.time,
                index,
                TickFlags::LASER | TickFlags::SLAM,
            ));
            after_slam = true;
            accumulated = 0;
            section_object = laser.next.unwrap_or(index);
            section_start = laser
                .next
                .map(|n| chart.objects[n].time)
                .unwrap_or(obj.time);
        } else {
            if accumulated == 0 {
                section_object = index;
                section_start = obj.time;
            }
            accumulated += laser.duration;
        }
        cursor = laser.next;
    }
    flush(
        &mut ticks,
        section_object,
        section_start,
        accumulated,
        after_slam,
    );

    if let Some(first) = ticks.first_mut() {
        first.flags = first.flags | TickFlags::START;
    }
    if let Some(last) = ticks.last_mut() {
        last.flags = last.flags | TickFlags::END;
    }
    ticks
}
