// Playback cursor and score-tick generation

mod cursor;
mod tick;

pub use cursor::{PlaybackCursor, PlaybackEvent};
pub use tick::{ScoreTick, TickFlags, button_tick, compute_hold_ticks, compute_laser_ticks};
