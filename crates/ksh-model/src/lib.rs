// Chart data model: timing points, playable objects, camera zoom points

mod chart;
mod object;
mod timing;

pub use chart::{Chart, ChartBuilder, ChartMeta};
pub use object::{
    BUTTON_LANE_COUNT, ButtonObject, ChartObject, EventData, HoldObject, LASER_LANE_COUNT,
    LaserEffectType, LaserObject, ObjectKind, TrackRollBehaviour,
};
pub use timing::{TimingPoint, ZOOM_CHANNELS, ZoomPoint};
