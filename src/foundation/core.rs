use crate::foundation::error::{PlayerError, PlayerResult};

/// Frame rate used when neither the config nor the manifest names one.
pub const DEFAULT_FPS: f64 = 25.0;

/// Canvas width used when neither the config nor the manifest names one.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1280;

/// Playback rate in frames per second.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Fps(f64);

impl Fps {
    /// Create a validated rate; must be finite and `> 0`.
    pub fn new(value: f64) -> PlayerResult<Self> {
        if !value.is_finite() || value <= 0.0 {
            return Err(PlayerError::validation(format!(
                "fps must be finite and > 0 (got {value})"
            )));
        }
        Ok(Self(value))
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        1.0 / self.0
    }

    /// Convert seconds to a frame count using floor semantics.
    ///
    /// Negative or non-finite input maps to frame 0.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        let frames = (secs * self.0).floor();
        if frames.is_finite() && frames > 0.0 {
            frames as u64
        } else {
            0
        }
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self(DEFAULT_FPS)
    }
}

/// Output surface dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Resolve the effective canvas size.
    ///
    /// Width: `width_override`, else `manifest_width`, else [`DEFAULT_CANVAS_WIDTH`].
    /// Height: `manifest_height`, else `width * 9 / 16`. Fractional values are floored; a derived
    /// height is never less than 1 pixel.
    pub fn resolve(
        width_override: Option<u32>,
        manifest_width: Option<f64>,
        manifest_height: Option<f64>,
    ) -> PlayerResult<Self> {
        let width = match (width_override, manifest_width) {
            (Some(0), _) => {
                return Err(PlayerError::validation("canvas width must be >= 1 pixel"));
            }
            (Some(w), _) => w,
            (None, Some(w)) => floor_px("width", w)?,
            (None, None) => DEFAULT_CANVAS_WIDTH,
        };
        let height = match manifest_height {
            Some(h) => floor_px("height", h)?,
            None => ((u64::from(width) * 9) / 16).max(1) as u32,
        };
        Ok(Self { width, height })
    }

    /// Number of pixels covered by the canvas.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

fn floor_px(what: &str, value: f64) -> PlayerResult<u32> {
    if !value.is_finite() || value <= 0.0 {
        return Err(PlayerError::validation(format!(
            "canvas {what} must be finite and > 0 (got {value})"
        )));
    }
    let px = value.floor();
    if px < 1.0 || px > f64::from(u32::MAX) {
        return Err(PlayerError::validation(format!(
            "canvas {what} out of range (got {value})"
        )));
    }
    Ok(px as u32)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
