//! Audio tracks played alongside the frames.
//!
//! The `media-ffmpeg` feature adds an audible backend built on `ffplay`.

#[cfg(feature = "media-ffmpeg")]
pub mod ffplay;
pub mod track;
