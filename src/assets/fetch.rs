use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::assets::archive;
use crate::assets::decode::{DrawableImage, FrameDecoder};
use crate::assets::source::AssetSource;
use crate::assets::store::FrameStore;
use crate::foundation::error::{PlayerError, PlayerResult};
use crate::manifest::model::Manifest;

/// Default upper bound on concurrently outstanding frame fetches.
pub const MAX_CONCURRENT: usize = 8;

/// Loads every frame named by a manifest, individually or from one archive.
#[derive(Clone)]
pub struct AssetFetcher {
    source: Arc<dyn AssetSource>,
    decoder: Arc<dyn FrameDecoder>,
    max_concurrent: usize,
}

impl AssetFetcher {
    /// Create a fetcher allowing at most `max_concurrent` outstanding fetches (minimum 1).
    pub fn new(
        source: Arc<dyn AssetSource>,
        decoder: Arc<dyn FrameDecoder>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            source,
            decoder,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Load all frames of `manifest` into a [`FrameStore`].
    ///
    /// Archive mode is used when the manifest names a `zip`. The store is returned only when every
    /// frame decoded; the first failure aborts the load. `cancel` is checked before results are
    /// committed, so a disposed session never receives late frames.
    #[tracing::instrument(skip_all, fields(frames = manifest.frame_count()))]
    pub async fn load(
        &self,
        manifest: &Manifest,
        cancel: &CancellationToken,
    ) -> PlayerResult<FrameStore> {
        let frames = match manifest.archive_url() {
            Some(url) => {
                self.load_archive(url?, manifest.frames().to_vec(), cancel)
                    .await?
            }
            None => self.load_individual(manifest.frame_urls()?, cancel).await?,
        };

        if frames.len() != manifest.frame_count() {
            return Err(PlayerError::asset(format!(
                "loaded {} frames, manifest lists {}",
                frames.len(),
                manifest.frame_count()
            )));
        }
        Ok(FrameStore::new(frames))
    }

    /// Fetch and decode each URL with a bounded pool of workers.
    ///
    /// Workers claim indices from one shared counter; results are placed by index, so the output
    /// order is the input order no matter which fetch finishes first.
    pub async fn load_individual(
        &self,
        urls: Vec<Url>,
        cancel: &CancellationToken,
    ) -> PlayerResult<Vec<DrawableImage>> {
        let count = urls.len();
        let workers = self.max_concurrent.min(count);
        tracing::debug!(count, workers, "fetching frames");

        let next = AtomicUsize::new(0);
        let urls = urls.as_slice();
        let batches = futures::future::try_join_all(
            (0..workers).map(|_| self.run_worker(urls, &next, cancel)),
        )
        .await?;

        let mut slots: Vec<Option<DrawableImage>> = std::iter::repeat_with(|| None)
            .take(count)
            .collect();
        for (index, image) in batches.into_iter().flatten() {
            slots[index] = Some(image);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| PlayerError::asset(format!("frame {i} was never loaded")))
            })
            .collect()
    }

    async fn run_worker(
        &self,
        urls: &[Url],
        next: &AtomicUsize,
        cancel: &CancellationToken,
    ) -> PlayerResult<Vec<(usize, DrawableImage)>> {
        let mut done = Vec::new();
        loop {
            let index = next.fetch_add(1, Ordering::Relaxed);
            let Some(url) = urls.get(index) else {
                return Ok(done);
            };
            let image = self.fetch_frame(index, url).await?;
            if cancel.is_cancelled() {
                return Err(PlayerError::Cancelled);
            }
            done.push((index, image));
        }
    }

    async fn fetch_frame(&self, index: usize, url: &Url) -> PlayerResult<DrawableImage> {
        let bytes = self
            .source
            .fetch(url)
            .await
            .map_err(|e| PlayerError::asset(format!("fetch frame {index} ({url}): {e:#}")))?;

        let decoder = Arc::clone(&self.decoder);
        let image = tokio::task::spawn_blocking(move || decoder.decode(&bytes))
            .await
            .map_err(|e| PlayerError::asset(format!("decode task for frame {index}: {e}")))?
            .map_err(|e| PlayerError::asset(format!("decode frame {index} ({url}): {e}")))?;
        tracing::trace!(index, "frame ready");
        Ok(image)
    }

    /// Fetch one archive and decode the entries named by `names`, in order.
    pub async fn load_archive(
        &self,
        url: Url,
        names: Vec<String>,
        cancel: &CancellationToken,
    ) -> PlayerResult<Vec<DrawableImage>> {
        let bytes = self
            .source
            .fetch(&url)
            .await
            .map_err(|e| PlayerError::asset(format!("fetch archive ({url}): {e:#}")))?;
        tracing::debug!(%url, size = bytes.len(), entries = names.len(), "archive fetched");

        let decoder = Arc::clone(&self.decoder);
        let frames = tokio::task::spawn_blocking(move || {
            archive::decode_archive(&bytes, &names, decoder.as_ref())
        })
        .await
        .map_err(|e| PlayerError::asset(format!("archive decode task: {e}")))??;

        if cancel.is_cancelled() {
            return Err(PlayerError::Cancelled);
        }
        Ok(frames)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fetch.rs"]
mod tests;
