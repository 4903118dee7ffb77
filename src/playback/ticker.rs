use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::foundation::error::{PlayerError, PlayerResult};

/// Default display refresh rate driving playback ticks.
pub const DEFAULT_REFRESH_HZ: f64 = 60.0;

/// Display-refresh-driven tick source.
///
/// Ticks that cannot be delivered on time are skipped, never bunched up; frame selection does not
/// depend on how many ticks ran. Dropping the ticker cancels the pending tick.
#[derive(Debug)]
pub struct FrameTicker {
    interval: Interval,
}

impl FrameTicker {
    /// Start ticking at `refresh_hz`, first tick one period from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(refresh_hz: f64) -> PlayerResult<Self> {
        let period = refresh_period(refresh_hz)?;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Ok(Self { interval })
    }

    /// Time between ticks.
    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Wait for the next tick and return its instant.
    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }
}

/// Validate `refresh_hz` and convert it to a tick period.
pub fn refresh_period(refresh_hz: f64) -> PlayerResult<Duration> {
    if !refresh_hz.is_finite() || refresh_hz <= 0.0 {
        return Err(PlayerError::validation(format!(
            "refresh rate must be finite and > 0 (got {refresh_hz})"
        )));
    }
    let period = Duration::from_secs_f64(1.0 / refresh_hz);
    if period.is_zero() {
        return Err(PlayerError::validation(format!(
            "refresh rate {refresh_hz} is too high"
        )));
    }
    Ok(period)
}

#[cfg(test)]
#[path = "../../tests/unit/playback/ticker.rs"]
mod tests;
