use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::object::{ChartObject, ObjectKind};
use crate::timing::{TimingPoint, ZOOM_CHANNELS, ZoomPoint};

/// Chart metadata for select/result screens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartMeta {
    pub title: String,
    pub artist: String,
    /// Chart author
    pub effector: String,
    /// Displayed BPM text (may be a range like "140-280")
    pub bpm_text: String,
    /// Audio offset in milliseconds
    pub audio_offset: i64,
    pub level: i32,
}

/// A loaded chart: timing points, chart objects and zoom points, all sorted
/// by time and immutable after load.
///
/// The chart exclusively owns its arrays; the playback cursor and the
/// judgment engine refer into them by index and must not outlive it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chart {
    pub meta: ChartMeta,
    pub timing_points: Vec<TimingPoint>,
    pub objects: Vec<ChartObject>,
    pub zoom_points: Vec<ZoomPoint>,
}

impl Chart {
    /// Index of the timing point governing `time` (the last one at or before
    /// it, or the first point when `time` precedes all of them).
    ///
    /// The chart must have at least one timing point.
    pub fn timing_point_at(&self, time: i64) -> usize {
        let idx = self.timing_points.partition_point(|tp| tp.time <= time);
        idx.saturating_sub(1)
    }

    /// Walk `prev` links to the root of a hold/laser chain.
    pub fn chain_root(&self, mut index: usize) -> usize {
        while let (Some(prev), _) = self.objects[index].chain_links() {
            index = prev;
        }
        index
    }

    /// End time of the last segment of the chain containing `index`.
    pub fn chain_end_time(&self, index: usize) -> i64 {
        let mut index = index;
        while let (_, Some(next)) = self.objects[index].chain_links() {
            index = next;
        }
        self.objects[index].end_time()
    }

    pub fn next_in_chain(&self, index: usize) -> Option<usize> {
        self.objects[index].chain_links().1
    }

    pub fn prev_in_chain(&self, index: usize) -> Option<usize> {
        self.objects[index].chain_links().0
    }

    /// Number of tap notes in the chart.
    pub fn total_buttons(&self) -> usize {
        self.objects.iter().filter(|o| o.is_button()).count()
    }

    /// Indices of objects with `time` in `[from, to)`.
    pub fn objects_in(&self, from: i64, to: i64) -> Vec<usize> {
        let start = self.objects.partition_point(|o| o.time < from);
        self.objects[start..]
            .iter()
            .take_while(|o| o.time < to)
            .enumerate()
            .map(|(i, _)| start + i)
            .collect()
    }
}

/// Load-time chart assembly.
///
/// The external chart loader feeds objects in any order, records chain links
/// between the handles returned by [`ChartBuilder::object`], and calls
/// [`ChartBuilder::build`], which sorts everything (slam laser segments
/// first among simultaneous objects), rewrites the links as arena indices
/// into the sorted array, and validates chain invariants.
#[derive(Debug, Default)]
pub struct ChartBuilder {
    meta: ChartMeta,
    timing_points: Vec<TimingPoint>,
    zoom_points: Vec<ZoomPoint>,
    objects: Vec<ChartObject>,
    links: Vec<(usize, usize)>,
}

impl ChartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meta(&mut self, meta: ChartMeta) -> &mut Self {
        self.meta = meta;
        self
    }

    pub fn timing_point(&mut self, tp: TimingPoint) -> &mut Self {
        self.timing_points.push(tp);
        self
    }

    pub fn zoom_point(&mut self, zp: ZoomPoint) -> &mut Self {
        self.zoom_points.push(zp);
        self
    }

    /// Add an object, returning a handle usable with [`ChartBuilder::link`].
    pub fn object(&mut self, obj: ChartObject) -> usize {
        self.objects.push(obj);
        self.objects.len() - 1
    }

    /// Record that `to` continues the hold/laser chain started by `from`.
    pub fn link(&mut self, from: usize, to: usize) -> &mut Self {
        self.links.push((from, to));
        self
    }

    pub fn build(mut self) -> Result<Chart> {
        self.timing_points.sort_by_key(|tp| tp.time);
        for w in self.timing_points.windows(2) {
            if w[0].time == w[1].time {
                bail!("duplicate timing point at {}ms", w[0].time);
            }
        }

        for zp in &self.zoom_points {
            if zp.channel >= ZOOM_CHANNELS {
                bail!("zoom point channel {} out of range", zp.channel);
            }
        }
        self.zoom_points.sort_by_key(|zp| zp.time);

        // Stable sort: by time, slam laser segments before anything
        // simultaneous.
        let mut order: Vec<usize> = (0..self.objects.len()).collect();
        order.sort_by_key(|&i| {
            let o = &self.objects[i];
            (o.time, if o.is_instant_laser() { 0 } else { 1 })
        });

        let mut old_to_new = vec![0usize; self.objects.len()];
        for (new_idx, &old_idx) in order.iter().enumerate() {
            old_to_new[old_idx] = new_idx;
        }
        let mut objects: Vec<ChartObject> = order.iter().map(|&i| self.objects[i].clone()).collect();

        for &(from_old, to_old) in &self.links {
            if from_old >= objects.len() || to_old >= objects.len() {
                bail!("chain link references unknown object handle");
            }
            let from = old_to_new[from_old];
            let to = old_to_new[to_old];

            let (from_end, from_lane) = {
                let o = &objects[from];
                (o.end_time(), o.lane())
            };
            let (to_time, to_lane) = {
                let o = &objects[to];
                (o.time, o.lane())
            };

            match (&objects[from].kind, &objects[to].kind) {
                (ObjectKind::Hold(_), ObjectKind::Hold(_))
                | (ObjectKind::Laser(_), ObjectKind::Laser(_)) => {}
                _ => bail!("chain link between incompatible object kinds"),
            }
            if from_lane != to_lane {
                bail!("chain link across lanes at {to_time}ms");
            }
            if to_time != from_end {
                bail!("chain segment at {to_time}ms does not continue from {from_end}ms");
            }

            match &mut objects[from].kind {
                ObjectKind::Hold(h) => {
                    if h.next.is_some() {
                        bail!("object already has a chain successor");
                    }
                    h.next = Some(to);
                }
                ObjectKind::Laser(l) => {
                    if l.next.is_some() {
                        bail!("object already has a chain successor");
                    }
                    l.next = Some(to);
                }
                _ => unreachable!(),
            }
            match &mut objects[to].kind {
                ObjectKind::Hold(h) => {
                    if h.prev.is_some() {
                        bail!("object already has a chain predecessor");
                    }
                    h.prev = Some(from);
                }
                ObjectKind::Laser(l) => {
                    if l.prev.is_some() {
                        bail!("object already has a chain predecessor");
                    }
                    l.prev = Some(from);
                }
                _ => unreachable!(),
            }
        }

        Ok(Chart {
            meta: self.meta,
            timing_points: self.timing_points,
            objects,
            zoom_points: self.zoom_points,
        })
    }
}
