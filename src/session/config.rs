use std::fmt;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use reqwest::Url;

use crate::assets::decode::DecodeOpts;
use crate::assets::fetch::MAX_CONCURRENT;
use crate::assets::source::parse_location;
use crate::foundation::error::{PlayerError, PlayerResult};
use crate::manifest::model::ManifestOverrides;
use crate::playback::ticker::{DEFAULT_REFRESH_HZ, refresh_period};

/// Host-supplied options for one playback session.
///
/// Two configs that compare equal describe the same session; the host only restarts playback when
/// the config changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerConfig {
    /// Manifest location: http(s) URL, `file://` URL, or filesystem path.
    pub manifest_url: String,
    /// Overrides the manifest frame rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    /// Overrides the manifest width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_width: Option<u32>,
    /// Wrap back to the first frame instead of ending.
    #[serde(default, rename = "loop")]
    pub looping: bool,
}

impl PlayerConfig {
    /// Config for `manifest_url` with no overrides, not looping.
    pub fn new(manifest_url: impl Into<String>) -> Self {
        Self {
            manifest_url: manifest_url.into(),
            fps: None,
            canvas_width: None,
            looping: false,
        }
    }

    /// Set the frame rate override.
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Set the canvas width override.
    pub fn with_canvas_width(mut self, width: u32) -> Self {
        self.canvas_width = Some(width);
        self
    }

    /// Set looping.
    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Overrides applied on top of the manifest.
    pub fn overrides(&self) -> ManifestOverrides {
        ManifestOverrides {
            fps: self.fps,
            canvas_width: self.canvas_width,
        }
    }

    /// Parse [`PlayerConfig::manifest_url`] into an absolute URL.
    pub fn manifest_location(&self) -> PlayerResult<Url> {
        parse_location(&self.manifest_url)
    }
}

/// Pipeline tuning shared by every session a player starts.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineOpts {
    /// Upper bound on concurrently outstanding frame fetches.
    pub max_concurrent: usize,
    /// Display refresh rate driving playback ticks.
    pub refresh_hz: f64,
    /// Per-request timeout for network sources.
    pub request_timeout_ms: u64,
    /// Frame decoding options.
    pub decode: DecodeOpts,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            max_concurrent: MAX_CONCURRENT,
            refresh_hz: DEFAULT_REFRESH_HZ,
            request_timeout_ms: 30_000,
            decode: DecodeOpts::default(),
        }
    }
}

impl PipelineOpts {
    /// Read options from a JSON file; absent fields keep their defaults.
    pub fn from_path(path: &Path) -> PlayerResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read pipeline options '{}'", path.display()))?;
        let opts: Self = serde_json::from_str(&text).map_err(|e| {
            PlayerError::validation(format!("parse pipeline options '{}': {e}", path.display()))
        })?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reject options the pipeline cannot run with.
    pub fn validate(&self) -> PlayerResult<()> {
        if self.max_concurrent == 0 {
            return Err(PlayerError::validation("maxConcurrent must be >= 1"));
        }
        refresh_period(self.refresh_hz)?;
        if self.request_timeout_ms == 0 {
            return Err(PlayerError::validation("requestTimeoutMs must be >= 1"));
        }
        if self.decode.max_bitmap_pixels == 0 {
            return Err(PlayerError::validation("decode.maxBitmapPixels must be >= 1"));
        }
        Ok(())
    }

    /// [`PipelineOpts::request_timeout_ms`] as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

type Notify = Box<dyn FnOnce() + Send>;
type NotifyError = Box<dyn FnOnce(PlayerError) + Send>;

/// Lifecycle notifications for one session. Each fires at most once.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) on_ready: Option<Notify>,
    pub(crate) on_end: Option<Notify>,
    pub(crate) on_error: Option<NotifyError>,
}

impl Callbacks {
    /// No callbacks; failures are only logged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called after the first frame is drawn and audio has started.
    pub fn on_ready(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_ready = Some(Box::new(f));
        self
    }

    /// Called when a non-looping session reaches its last frame.
    pub fn on_end(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    /// Called with the failure cause when setup or playback fails.
    pub fn on_error(mut self, f: impl FnOnce(PlayerError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub(crate) fn ready(&mut self) {
        if let Some(f) = self.on_ready.take() {
            f();
        }
    }

    pub(crate) fn end(&mut self) {
        if let Some(f) = self.on_end.take() {
            f();
        }
    }

    pub(crate) fn error(&mut self, err: PlayerError) {
        match self.on_error.take() {
            Some(f) => f(err),
            None => tracing::error!(error = %err, "playback failed"),
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_ready", &self.on_ready.is_some())
            .field("on_end", &self.on_end.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
