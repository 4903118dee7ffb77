//! Framecast plays a pre-recorded "talking avatar": a sequence of still frames shown in lock-step
//! with one audio track, as described by a JSON manifest.
//!
//! # Pipeline overview
//!
//! 1. **Manifest**: fetch and resolve the [`Manifest`] (defaults and host overrides applied)
//! 2. **Surface**: size the output [`Surface`] to the resolved [`Canvas`]
//! 3. **Frames**: [`AssetFetcher`] loads every frame into a [`FrameStore`], either with a bounded
//!    pool of concurrent fetches or from one zip archive
//! 4. **Audio**: open an [`AudioTrack`], wait until it is buffered, start it
//! 5. **Clock**: draw frame 0, then on every refresh tick the [`PlaybackClock`] maps elapsed time to
//!    `floor(elapsed * fps)` and the [`Renderer`] draws any new index
//!
//! [`Player::start`] runs all of this as one session and returns a [`SessionHandle`]; stopping the
//! handle cancels the pending tick, pauses audio and releases every decoded frame.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Drift-free**: the frame index derives from absolute elapsed time, never from a tick count.
//! - **Fail-fast setup**: the first failing stage aborts the session with a [`PlayerError`].
//! - **Premultiplied RGBA8**: bitmaps and surfaces hold premultiplied pixels.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod audio;
mod foundation;
mod manifest;
mod playback;
mod render;
mod session;

pub use assets::archive::{decode_archive, extract_entries};
pub use assets::decode::{
    Bitmap, DecodeOpts, DrawableImage, FrameDecoder, ImageDecoder, ImageElement, decode_bitmap,
    decode_element,
};
pub use assets::fetch::{AssetFetcher, MAX_CONCURRENT};
pub use assets::source::{AssetSource, DefaultSource, FileSource, HttpSource, parse_location};
pub use assets::store::FrameStore;
#[cfg(feature = "media-ffmpeg")]
pub use audio::ffplay::FfplayAudio;
pub use audio::track::{AudioBackend, AudioTrack, SilentAudio};
pub use foundation::core::{Canvas, DEFAULT_CANVAS_WIDTH, DEFAULT_FPS, Fps};
pub use foundation::error::{PlayerError, PlayerResult};
pub use manifest::generate::{
    AUDIO_EXTENSIONS, FRAME_EXTENSIONS, GenerateOpts, generate_manifest, write_manifest,
};
pub use manifest::loader::{ManifestLoader, parse_manifest};
pub use manifest::model::{Manifest, ManifestDoc, ManifestOverrides};
pub use playback::clock::{PlaybackClock, PlaybackPhase, PlaybackState, Tick};
pub use playback::ticker::{DEFAULT_REFRESH_HZ, FrameTicker, refresh_period};
pub use render::renderer::Renderer;
pub use render::surface::{FrameBuffer, SharedSurface, Surface, lock_surface};
pub use session::config::{Callbacks, PipelineOpts, PlayerConfig};
pub use session::controller::{Player, SessionHandle, TeardownReport};
pub use session::host::PlayerHost;
