use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use tokio::time::Instant;

use crate::assets::source::AssetSource;
use crate::foundation::error::{PlayerError, PlayerResult};

/// One streamable audio handle bound to a manifest's audio asset.
#[async_trait::async_trait]
pub trait AudioTrack: Send {
    /// Wait until the track can play through without stalling.
    async fn buffer(&mut self) -> PlayerResult<()>;

    /// Begin playback from the current position.
    async fn play(&mut self) -> PlayerResult<()>;

    /// Seek to zero and play again.
    async fn restart(&mut self) -> PlayerResult<()>;

    /// Return `true` once playback reached the end of the track.
    fn has_ended(&self) -> bool;

    /// Stop playback. Returns `false` if the track was not playing.
    fn pause(&mut self) -> bool;
}

/// Opens audio tracks for a session.
pub trait AudioBackend: Send + Sync {
    /// Create an unbuffered track for `url`.
    fn open(&self, url: Url) -> PlayerResult<Box<dyn AudioTrack>>;
}

/// Backend that keeps time without producing sound.
///
/// With a source attached, buffering fetches the audio bytes so a missing or unreachable track fails
/// setup the same way an audible backend would.
#[derive(Clone, Default)]
pub struct SilentAudio {
    source: Option<Arc<dyn AssetSource>>,
    duration: Option<Duration>,
}

impl SilentAudio {
    /// Fetch audio through `source` while buffering.
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source: Some(source),
            duration: None,
        }
    }

    /// Never touch the network; buffering succeeds immediately.
    pub fn muted() -> Self {
        Self::default()
    }

    /// Report the track as ended after `duration` of playback.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

impl AudioBackend for SilentAudio {
    fn open(&self, url: Url) -> PlayerResult<Box<dyn AudioTrack>> {
        Ok(Box::new(SilentTrack {
            url,
            source: self.source.clone(),
            duration: self.duration,
            buffered: None,
            started_at: None,
        }))
    }
}

struct SilentTrack {
    url: Url,
    source: Option<Arc<dyn AssetSource>>,
    duration: Option<Duration>,
    /// Size of the buffered audio, once buffering finished.
    buffered: Option<usize>,
    started_at: Option<Instant>,
}

#[async_trait::async_trait]
impl AudioTrack for SilentTrack {
    async fn buffer(&mut self) -> PlayerResult<()> {
        let size = match &self.source {
            Some(source) => source
                .fetch(&self.url)
                .await
                .map_err(|e| PlayerError::audio(format!("load '{}': {e:#}", self.url)))?
                .len(),
            None => 0,
        };
        tracing::debug!(url = %self.url, size, "audio buffered");
        self.buffered = Some(size);
        Ok(())
    }

    async fn play(&mut self) -> PlayerResult<()> {
        if self.buffered.is_none() {
            return Err(PlayerError::audio("play called before buffering"));
        }
        self.started_at = Some(Instant::now());
        Ok(())
    }

    async fn restart(&mut self) -> PlayerResult<()> {
        self.play().await
    }

    fn has_ended(&self) -> bool {
        match (self.started_at, self.duration) {
            (Some(started), Some(duration)) => started.elapsed() >= duration,
            _ => false,
        }
    }

    fn pause(&mut self) -> bool {
        self.started_at.take().is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/track.rs"]
mod tests;
