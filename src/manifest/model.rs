use anyhow::Context;
use reqwest::Url;

use crate::foundation::core::{Canvas, DEFAULT_FPS, Fps};
use crate::foundation::error::{PlayerError, PlayerResult};

/// Manifest document exactly as it appears on the wire.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDoc {
    /// URL prefix all identifiers are resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    /// Frame identifiers in playback order.
    pub frames: Vec<String>,
    /// Playback rate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    /// Native frame width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Native frame height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Audio track identifier.
    pub audio: String,
    /// Archive holding every frame, when frames are packed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

/// Host-supplied values that take precedence over the manifest.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ManifestOverrides {
    /// Replaces the manifest `fps`.
    pub fps: Option<f64>,
    /// Replaces the manifest `width`.
    pub canvas_width: Option<u32>,
}

/// Validated manifest with defaults applied and a resolved base URL.
///
/// Immutable once loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct Manifest {
    base_url: Url,
    frames: Vec<String>,
    fps: Fps,
    canvas: Canvas,
    audio: String,
    zip: Option<String>,
}

impl Manifest {
    /// Validate `doc` fetched from `manifest_url` and apply defaults and `overrides`.
    pub fn from_doc(
        doc: ManifestDoc,
        manifest_url: &Url,
        overrides: ManifestOverrides,
    ) -> PlayerResult<Self> {
        if doc.frames.is_empty() {
            return Err(PlayerError::manifest("manifest lists no frames"));
        }
        if doc.audio.trim().is_empty() {
            return Err(PlayerError::manifest("manifest audio must be non-empty"));
        }

        let fps = Fps::new(overrides.fps.or(doc.fps).unwrap_or(DEFAULT_FPS))
            .map_err(into_manifest_error)?;
        let canvas = Canvas::resolve(overrides.canvas_width, doc.width, doc.height)
            .map_err(into_manifest_error)?;
        let base_url = resolve_base_url(manifest_url, doc.base_path.as_deref())?;

        Ok(Self {
            base_url,
            frames: doc.frames,
            fps,
            canvas,
            audio: doc.audio,
            zip: doc.zip.filter(|z| !z.trim().is_empty()),
        })
    }

    /// URL identifiers are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Frame identifiers in playback order.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Number of frames; never zero.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Effective playback rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Effective canvas size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Audio identifier as written in the manifest.
    pub fn audio(&self) -> &str {
        &self.audio
    }

    /// Archive identifier, when frames are packed.
    pub fn zip(&self) -> Option<&str> {
        self.zip.as_deref()
    }

    /// Resolve an identifier against the base URL.
    pub fn resolve(&self, id: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(id)
            .with_context(|| format!("cannot resolve '{id}' against {}", self.base_url))
    }

    /// Absolute URL of every frame, in manifest order.
    pub fn frame_urls(&self) -> PlayerResult<Vec<Url>> {
        self.frames
            .iter()
            .map(|f| self.resolve(f).map_err(|e| PlayerError::asset(format!("{e:#}"))))
            .collect()
    }

    /// Absolute URL of the audio track.
    pub fn audio_url(&self) -> PlayerResult<Url> {
        self.resolve(&self.audio)
            .map_err(|e| PlayerError::audio(format!("{e:#}")))
    }

    /// Absolute URL of the frame archive, if the manifest names one.
    pub fn archive_url(&self) -> Option<PlayerResult<Url>> {
        self.zip.as_deref().map(|z| {
            self.resolve(z)
                .map_err(|e| PlayerError::asset(format!("{e:#}")))
        })
    }
}

fn into_manifest_error(e: PlayerError) -> PlayerError {
    match e {
        PlayerError::Validation(msg) => PlayerError::Manifest(msg),
        other => other,
    }
}

fn resolve_base_url(manifest_url: &Url, base_path: Option<&str>) -> PlayerResult<Url> {
    let Some(base) = base_path.map(str::trim).filter(|b| !b.is_empty()) else {
        return Ok(manifest_url.clone());
    };

    // A base without a trailing slash would have its last segment replaced on join.
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    manifest_url.join(&base).map_err(|e| {
        PlayerError::manifest(format!("invalid basePath '{base}' for {manifest_url}: {e}"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/model.rs"]
mod tests;
