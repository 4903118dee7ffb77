use std::io::Write as _;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use reqwest::Url;
use tokio::process::{Child, Command};
use tokio::time::Instant;

use crate::assets::source::AssetSource;
use crate::audio::track::{AudioBackend, AudioTrack};
use crate::foundation::error::{PlayerError, PlayerResult};

/// Audible backend playing through `ffplay` (requires `ffplay` and `ffprobe` on PATH).
///
/// Audio bytes are spooled to a temporary file that lives as long as the track.
#[derive(Clone)]
pub struct FfplayAudio {
    source: Arc<dyn AssetSource>,
}

impl FfplayAudio {
    /// Fetch audio through `source`.
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source }
    }
}

impl AudioBackend for FfplayAudio {
    fn open(&self, url: Url) -> PlayerResult<Box<dyn AudioTrack>> {
        Ok(Box::new(FfplayTrack {
            url,
            source: Arc::clone(&self.source),
            file: None,
            duration: None,
            child: Mutex::new(None),
            started_at: None,
        }))
    }
}

struct FfplayTrack {
    url: Url,
    source: Arc<dyn AssetSource>,
    file: Option<tempfile::NamedTempFile>,
    duration: Option<Duration>,
    child: Mutex<Option<Child>>,
    started_at: Option<Instant>,
}

impl FfplayTrack {
    fn child_exited(&self) -> bool {
        let mut child = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        match child.as_mut().map(Child::try_wait) {
            Some(Ok(Some(status))) => {
                tracing::trace!(%status, "ffplay exited");
                true
            }
            Some(Ok(None)) | None => false,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "ffplay status unavailable");
                false
            }
        }
    }

    fn kill(&mut self) -> bool {
        let child = self.child.get_mut().unwrap_or_else(PoisonError::into_inner);
        match child.take() {
            Some(mut child) => {
                if let Err(e) = child.start_kill() {
                    tracing::debug!(error = %e, "ffplay already exited");
                }
                true
            }
            None => false,
        }
    }
}

#[async_trait::async_trait]
impl AudioTrack for FfplayTrack {
    async fn buffer(&mut self) -> PlayerResult<()> {
        let bytes = self
            .source
            .fetch(&self.url)
            .await
            .map_err(|e| PlayerError::audio(format!("load '{}': {e:#}", self.url)))?;

        let suffix = Path::new(self.url.path())
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let file = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let mut file = tempfile::Builder::new()
                .prefix("framecast-audio-")
                .suffix(&suffix)
                .tempfile()
                .context("create audio spool file")?;
            file.write_all(&bytes).context("write audio spool file")?;
            file.flush().context("flush audio spool file")?;
            Ok(file)
        })
        .await
        .map_err(|e| PlayerError::audio(format!("spool task: {e}")))?
        .map_err(|e| PlayerError::audio(format!("{e:#}")))?;

        self.duration = probe_duration(file.path()).await?;
        tracing::debug!(url = %self.url, duration = ?self.duration, "audio buffered");
        self.file = Some(file);
        Ok(())
    }

    async fn play(&mut self) -> PlayerResult<()> {
        let Some(file) = &self.file else {
            return Err(PlayerError::audio("play called before buffering"));
        };
        let child = Command::new("ffplay")
            .args(["-nodisp", "-autoexit", "-loglevel", "error"])
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlayerError::audio(format!("failed to run ffplay: {e}")))?;
        *self.child.get_mut().unwrap_or_else(PoisonError::into_inner) = Some(child);
        self.started_at = Some(Instant::now());
        Ok(())
    }

    async fn restart(&mut self) -> PlayerResult<()> {
        self.kill();
        self.play().await
    }

    fn has_ended(&self) -> bool {
        let Some(started) = self.started_at else {
            return false;
        };
        // `-autoexit` ends the process at end of stream; the probed duration may be unknown.
        self.child_exited() || self.duration.is_some_and(|d| started.elapsed() >= d)
    }

    fn pause(&mut self) -> bool {
        self.started_at = None;
        self.kill()
    }
}

async fn probe_duration(path: &Path) -> PlayerResult<Option<Duration>> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| PlayerError::audio(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(PlayerError::audio(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(parse_duration(&String::from_utf8_lossy(&out.stdout)))
}

fn parse_duration(s: &str) -> Option<Duration> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(Duration::from_secs_f64)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/ffplay.rs"]
mod tests;
