//! Playback timing: the elapsed-time frame clock and the refresh ticker that drives it.

pub mod clock;
pub mod ticker;
