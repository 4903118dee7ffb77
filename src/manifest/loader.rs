use std::sync::Arc;

use reqwest::Url;

use crate::assets::source::AssetSource;
use crate::foundation::error::{PlayerError, PlayerResult};
use crate::manifest::model::{Manifest, ManifestDoc, ManifestOverrides};

/// Fetches and validates the manifest document.
#[derive(Clone)]
pub struct ManifestLoader {
    source: Arc<dyn AssetSource>,
}

impl ManifestLoader {
    /// Create a loader reading through `source`.
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }

    /// Fetch `url`, parse it, and apply defaults and `overrides`.
    ///
    /// Every failure (transport, JSON, validation) is reported as [`PlayerError::Manifest`].
    #[tracing::instrument(skip_all, fields(url = %url))]
    pub async fn load(&self, url: &Url, overrides: ManifestOverrides) -> PlayerResult<Manifest> {
        let bytes = self
            .source
            .fetch(url)
            .await
            .map_err(|e| PlayerError::manifest(format!("fetch {url}: {e:#}")))?;
        let doc = parse_manifest(&bytes)
            .map_err(|e| PlayerError::manifest(format!("parse {url}: {e}")))?;
        let manifest = Manifest::from_doc(doc, url, overrides)?;

        tracing::debug!(
            frames = manifest.frame_count(),
            fps = manifest.fps().as_f64(),
            width = manifest.canvas().width,
            height = manifest.canvas().height,
            archive = manifest.zip().is_some(),
            "manifest loaded"
        );
        Ok(manifest)
    }
}

/// Parse manifest JSON bytes into the wire document.
pub fn parse_manifest(bytes: &[u8]) -> Result<ManifestDoc, serde_json::Error> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/loader.rs"]
mod tests;
