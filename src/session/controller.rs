use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument as _;

use crate::assets::decode::{FrameDecoder, ImageDecoder};
use crate::assets::fetch::AssetFetcher;
use crate::assets::source::{AssetSource, DefaultSource};
use crate::assets::store::FrameStore;
use crate::audio::track::{AudioBackend, AudioTrack, SilentAudio};
use crate::foundation::error::{PlayerError, PlayerResult};
use crate::manifest::loader::ManifestLoader;
use crate::playback::clock::{PlaybackClock, PlaybackPhase, PlaybackState};
use crate::playback::ticker::FrameTicker;
use crate::render::renderer::Renderer;
use crate::render::surface::{SharedSurface, lock_surface};
use crate::session::config::{Callbacks, PipelineOpts, PlayerConfig};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// What teardown actually released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Releasable frames released.
    pub frames_released: usize,
    /// A pending tick was cancelled.
    pub tick_cancelled: bool,
    /// Audio was playing and got paused.
    pub audio_paused: bool,
}

/// Starts playback sessions onto one surface.
///
/// Every session runs as its own tokio task; [`Player::start`] must be called from within a runtime.
pub struct Player {
    surface: SharedSurface,
    opts: PipelineOpts,
    source: Arc<dyn AssetSource>,
    decoder: Arc<dyn FrameDecoder>,
    audio: Option<Arc<dyn AudioBackend>>,
}

impl Player {
    /// Create a player with the default network/file source, image decoder and silent audio.
    pub fn new(surface: SharedSurface, opts: PipelineOpts) -> PlayerResult<Self> {
        opts.validate()?;
        let source = Arc::new(DefaultSource::new(opts.request_timeout())?);
        Ok(Self {
            surface,
            opts,
            source,
            decoder: Arc::new(ImageDecoder::new(opts.decode)),
            audio: None,
        })
    }

    /// Fetch manifests, frames and (for the default audio backend) audio through `source`.
    pub fn with_source(mut self, source: Arc<dyn AssetSource>) -> Self {
        self.source = source;
        self
    }

    /// Decode frames with `decoder`.
    pub fn with_decoder(mut self, decoder: Arc<dyn FrameDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Play audio through `audio` instead of the silent backend.
    pub fn with_audio(mut self, audio: Arc<dyn AudioBackend>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Pipeline options in effect.
    pub fn opts(&self) -> &PipelineOpts {
        &self.opts
    }

    /// Start one session.
    ///
    /// Setup runs in the background. Its outcome reaches the host only through `callbacks`; the
    /// session keeps its resources until the returned handle is stopped or dropped.
    pub fn start(&self, config: PlayerConfig, callbacks: Callbacks) -> SessionHandle {
        let id = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let audio = self
            .audio
            .clone()
            .unwrap_or_else(|| Arc::new(SilentAudio::new(Arc::clone(&self.source))));
        let session = Session {
            config,
            surface: Arc::clone(&self.surface),
            loader: ManifestLoader::new(Arc::clone(&self.source)),
            fetcher: AssetFetcher::new(
                Arc::clone(&self.source),
                Arc::clone(&self.decoder),
                self.opts.max_concurrent,
            ),
            audio,
            refresh_hz: self.opts.refresh_hz,
        };

        let span = tracing::info_span!("session", id);
        let task = tokio::spawn(run_session(session, callbacks, cancel.clone()).instrument(span));
        SessionHandle {
            id,
            cancel,
            task: Some(task),
        }
    }

    /// Stop `handle` and wait for its teardown.
    pub async fn stop(&self, mut handle: SessionHandle) -> TeardownReport {
        handle.stop().await
    }
}

/// Owner-side handle of a running session.
///
/// Dropping the handle cancels the session; its task then tears down on its own.
#[derive(Debug)]
pub struct SessionHandle {
    id: u64,
    cancel: CancellationToken,
    task: Option<JoinHandle<TeardownReport>>,
}

impl SessionHandle {
    /// Process-unique session id, also recorded on the session's tracing span.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Return `true` once [`SessionHandle::stop`] has run.
    pub fn is_stopped(&self) -> bool {
        self.task.is_none()
    }

    /// Cancel the session and wait for teardown.
    ///
    /// Safe at any point, including before setup finished. A second call returns an empty report.
    pub async fn stop(&mut self) -> TeardownReport {
        self.cancel.cancel();
        let Some(task) = self.task.take() else {
            return TeardownReport::default();
        };
        match task.await {
            Ok(report) => {
                tracing::debug!(session = self.id, ?report, "session stopped");
                report
            }
            Err(e) => {
                tracing::error!(session = self.id, error = %e, "session task failed");
                TeardownReport::default()
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Session {
    config: PlayerConfig,
    surface: SharedSurface,
    loader: ManifestLoader,
    fetcher: AssetFetcher,
    audio: Arc<dyn AudioBackend>,
    refresh_hz: f64,
}

/// Everything a session acquires; only [`SessionResources::teardown`] gives it back.
#[derive(Default)]
struct SessionResources {
    frames: FrameStore,
    audio: Option<Box<dyn AudioTrack>>,
    state: PlaybackState,
}

impl SessionResources {
    fn teardown(&mut self) -> TeardownReport {
        let tick_cancelled = self.state.cancel_scheduled();
        let audio_paused = self.audio.take().is_some_and(|mut a| a.pause());
        let frames_released = self.frames.release_all();
        self.state = PlaybackState::default();
        TeardownReport {
            frames_released,
            tick_cancelled,
            audio_paused,
        }
    }
}

async fn run_session(
    session: Session,
    mut callbacks: Callbacks,
    cancel: CancellationToken,
) -> TeardownReport {
    let mut res = SessionResources::default();
    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => Err(PlayerError::Cancelled),
        r = session.play(&mut res, &mut callbacks, &cancel) => r,
    };
    match outcome {
        Ok(()) => tracing::debug!("playback finished"),
        Err(PlayerError::Cancelled) => tracing::debug!(phase = ?res.state.phase(), "cancelled"),
        Err(e) => callbacks.error(e),
    }

    // Resources stay with the session until the host stops it.
    cancel.cancelled().await;
    let report = res.teardown();
    tracing::debug!(?report, "teardown complete");
    report
}

impl Session {
    async fn play(
        &self,
        res: &mut SessionResources,
        callbacks: &mut Callbacks,
        cancel: &CancellationToken,
    ) -> PlayerResult<()> {
        res.state.phase = PlaybackPhase::Loading;
        let url = self.config.manifest_location()?;
        let manifest = self.loader.load(&url, self.config.overrides()).await?;
        let canvas = manifest.canvas();
        lock_surface(&self.surface).configure(canvas)?;

        res.frames = self.fetcher.load(&manifest, cancel).await?;
        if cancel.is_cancelled() {
            return Err(PlayerError::Cancelled);
        }

        let track = res.audio.insert(self.audio.open(manifest.audio_url()?)?);
        track.buffer().await?;
        res.state.phase = PlaybackPhase::Ready;
        track.play().await?;

        let clock = PlaybackClock::new(res.frames.len(), manifest.fps(), self.config.looping);
        let renderer = Renderer::new(canvas);
        let first = clock.start(&mut res.state, Instant::now());
        renderer.draw(&mut *lock_surface(&self.surface), &res.frames, first)?;
        res.state.scheduled = Some(FrameTicker::new(self.refresh_hz)?);
        tracing::info!(
            frames = res.frames.len(),
            fps = manifest.fps().as_f64(),
            width = canvas.width,
            height = canvas.height,
            looping = self.config.looping,
            "playback started"
        );
        callbacks.ready();

        while let Some(ticker) = res.state.scheduled.as_mut() {
            ticker.tick().await;
            let elapsed = res.state.elapsed(Instant::now());
            let audio_ended = res.audio.as_ref().is_some_and(|a| a.has_ended());
            let tick = clock.advance(&mut res.state, elapsed, audio_ended);

            if let Some(index) = tick.draw {
                renderer.draw(&mut *lock_surface(&self.surface), &res.frames, index)?;
            }
            if tick.restart_audio
                && let Some(track) = res.audio.as_mut()
            {
                tracing::debug!("audio ended, restarting");
                track.restart().await?;
            }
            if tick.ended {
                tracing::info!(last = ?res.state.last_drawn(), "playback ended");
                callbacks.end();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/controller.rs"]
mod tests;
