use std::time::Duration;

use tokio::time::Instant;

use crate::foundation::core::Fps;
use crate::playback::ticker::FrameTicker;

/// Lifecycle of one playback session.
///
/// `Idle → Loading → Ready → Playing → (Looping | Ended)`; `Ended` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackPhase {
    /// Nothing started yet, or torn down.
    #[default]
    Idle,
    /// Manifest, frames and audio are being prepared.
    Loading,
    /// Frames loaded and audio buffered; clock not started.
    Ready,
    /// First pass through the frames.
    Playing,
    /// Wrapped past the last frame at least once.
    Looping,
    /// Reached the last frame without looping.
    Ended,
}

/// Mutable playback state of a session, owned by the controller.
#[derive(Debug, Default)]
pub struct PlaybackState {
    pub(crate) started_at: Option<Instant>,
    pub(crate) last_drawn: Option<usize>,
    pub(crate) scheduled: Option<FrameTicker>,
    pub(crate) phase: PlaybackPhase,
}

impl PlaybackState {
    /// Current phase.
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Index of the frame on screen, if any.
    pub fn last_drawn(&self) -> Option<usize> {
        self.last_drawn
    }

    /// Instant the clock was anchored at.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Return `true` while frames advance.
    pub fn is_playing(&self) -> bool {
        matches!(self.phase, PlaybackPhase::Playing | PlaybackPhase::Looping)
    }

    /// Return `true` while a next tick is scheduled.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.is_some()
    }

    /// Time since the clock was anchored, or zero before it was.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started_at
            .map(|s| now.saturating_duration_since(s))
            .unwrap_or_default()
    }

    /// Drop the pending tick. Returns `false` if none was scheduled.
    pub fn cancel_scheduled(&mut self) -> bool {
        self.scheduled.take().is_some()
    }
}

/// What one clock step asks the controller to do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tick {
    /// Frame to draw, when it differs from the one on screen.
    pub draw: Option<usize>,
    /// Audio reached its end during a looping pass and must restart from zero.
    pub restart_audio: bool,
    /// Playback just ended; signal completion and stop scheduling.
    pub ended: bool,
}

/// Maps elapsed time since the start anchor to the frame that should be visible.
///
/// The index is always `floor(elapsed * fps)` of absolute elapsed time, never a running counter,
/// so skipped or late ticks cannot make frames drift from the audio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackClock {
    frame_count: usize,
    fps: Fps,
    looping: bool,
}

impl PlaybackClock {
    /// Create a clock over `frame_count` frames.
    pub fn new(frame_count: usize, fps: Fps, looping: bool) -> Self {
        Self {
            frame_count,
            fps,
            looping,
        }
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Unwrapped frame position after `elapsed`.
    pub fn position(&self, elapsed: Duration) -> u64 {
        self.fps.secs_to_frames_floor(elapsed.as_secs_f64())
    }

    /// Anchor the clock at `now` and mark frame 0 as drawn.
    ///
    /// Returns the index the caller must draw.
    pub fn start(&self, state: &mut PlaybackState, now: Instant) -> usize {
        state.started_at = Some(now);
        state.last_drawn = Some(0);
        state.phase = PlaybackPhase::Playing;
        0
    }

    /// Advance to `elapsed` since the anchor.
    ///
    /// `audio_ended` reports whether the audio track has played to its end.
    pub fn advance(&self, state: &mut PlaybackState, elapsed: Duration, audio_ended: bool) -> Tick {
        let mut tick = Tick::default();
        if state.phase == PlaybackPhase::Ended {
            return tick;
        }
        if self.frame_count == 0 {
            state.phase = PlaybackPhase::Ended;
            state.scheduled = None;
            tick.ended = true;
            return tick;
        }

        let n = self.frame_count as u64;
        let position = self.position(elapsed);
        let index = if position < n {
            position as usize
        } else if self.looping {
            state.phase = PlaybackPhase::Looping;
            tick.restart_audio = audio_ended;
            (position % n) as usize
        } else {
            state.phase = PlaybackPhase::Ended;
            state.scheduled = None;
            tick.ended = true;
            self.frame_count - 1
        };

        if state.last_drawn != Some(index) {
            state.last_drawn = Some(index);
            tick.draw = Some(index);
        }
        tick
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/clock.rs"]
mod tests;
