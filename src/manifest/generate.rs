use std::path::Path;

use anyhow::Context;

use crate::foundation::core::DEFAULT_FPS;
use crate::foundation::error::{PlayerError, PlayerResult};
use crate::manifest::model::ManifestDoc;

/// File extensions picked up as frames.
pub const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// File extensions picked up as the audio track.
pub const AUDIO_EXTENSIONS: &[&str] = &["ogg", "mp3", "wav", "m4a", "aac"];

/// Options for [`generate_manifest`].
#[derive(Clone, Debug)]
pub struct GenerateOpts {
    /// Playback rate written to the manifest.
    pub fps: f64,
    /// Audio file name; defaults to the first audio file in the directory.
    pub audio: Option<String>,
    /// `basePath` written to the manifest; omitted when `None`.
    pub base_path: Option<String>,
}

impl Default for GenerateOpts {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            audio: None,
            base_path: None,
        }
    }
}

/// Build a manifest describing the frames and audio found in `dir`.
///
/// Frames are listed in lexicographic file-name order, which is the playback order. Width and
/// height come from the first frame.
pub fn generate_manifest(dir: &Path, opts: &GenerateOpts) -> PlayerResult<ManifestDoc> {
    if !opts.fps.is_finite() || opts.fps <= 0.0 {
        return Err(PlayerError::validation("fps must be finite and > 0"));
    }

    let mut frames = Vec::new();
    let mut audio_files = Vec::new();
    let rd = std::fs::read_dir(dir)
        .with_context(|| format!("read frame directory '{}'", dir.display()))?;
    for entry in rd {
        let entry = entry.with_context(|| format!("list '{}'", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = %path.display(), "skipping non-utf8 file name");
            continue;
        };
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if FRAME_EXTENSIONS.contains(&ext.as_str()) {
            frames.push(name.to_string());
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            audio_files.push(name.to_string());
        }
    }
    frames.sort();
    audio_files.sort();

    let first = frames.first().ok_or_else(|| {
        PlayerError::validation(format!("no frame images found in '{}'", dir.display()))
    })?;
    let (width, height) = image::image_dimensions(dir.join(first))
        .with_context(|| format!("read dimensions of '{first}'"))?;

    let audio = match &opts.audio {
        Some(a) => a.clone(),
        None => audio_files.into_iter().next().ok_or_else(|| {
            PlayerError::validation(format!("no audio file found in '{}'", dir.display()))
        })?,
    };

    tracing::info!(frames = frames.len(), width, height, %audio, "manifest generated");
    Ok(ManifestDoc {
        base_path: opts.base_path.clone(),
        frames,
        fps: Some(opts.fps),
        width: Some(f64::from(width)),
        height: Some(f64::from(height)),
        audio,
        zip: None,
    })
}

/// Write `doc` as pretty-printed JSON to `path`, creating parent directories.
pub fn write_manifest(path: &Path, doc: &ManifestDoc) -> PlayerResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let json = serde_json::to_vec_pretty(doc).context("serialize manifest")?;
    std::fs::write(path, json).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/manifest/generate.rs"]
mod tests;
