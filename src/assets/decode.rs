use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{PlayerError, PlayerResult};

/// Surface-ready raster in premultiplied RGBA8 form.
///
/// Holds its pixel memory until [`Bitmap::release`] is called.
#[derive(Debug)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba8_premul: Option<Arc<Vec<u8>>>,
}

impl Bitmap {
    /// Wrap premultiplied, row-major, tightly packed RGBA8 pixels.
    pub fn from_premul(width: u32, height: u32, rgba8_premul: Vec<u8>) -> PlayerResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if expected != Some(rgba8_premul.len()) {
            return Err(PlayerError::asset(format!(
                "bitmap {width}x{height} needs {} bytes, got {}",
                expected.unwrap_or(usize::MAX),
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Some(Arc::new(rgba8_premul)),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel bytes, or `None` once released.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.rgba8_premul.as_deref().map(Vec::as_slice)
    }

    /// Return `true` once [`Bitmap::release`] has run.
    pub fn is_released(&self) -> bool {
        self.rgba8_premul.is_none()
    }

    /// Free the pixel memory. Returns `false` if it was already released.
    pub fn release(&mut self) -> bool {
        self.rgba8_premul.take().is_some()
    }
}

/// Plain decoded image in straight-alpha RGBA8; freed by ownership only.
///
/// A premultiplied copy is built once at construction and reused by every draw.
#[derive(Debug)]
pub struct ImageElement {
    image: image::RgbaImage,
    premul: Vec<u8>,
}

impl ImageElement {
    /// Wrap a decoded straight-alpha image.
    pub fn new(image: image::RgbaImage) -> Self {
        let mut premul = image.as_raw().clone();
        premultiply_rgba8_in_place(&mut premul);
        Self { image, premul }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the straight-alpha pixels.
    pub fn as_rgba(&self) -> &image::RgbaImage {
        &self.image
    }

    /// Borrow the premultiplied copy of the pixels.
    pub fn premul_pixels(&self) -> &[u8] {
        &self.premul
    }
}

/// A decoded frame the renderer can draw.
///
/// Only the [`DrawableImage::Releasable`] variant holds memory that must be released explicitly.
#[derive(Debug)]
pub enum DrawableImage {
    /// Bitmap-path decode; released by the frame store at teardown.
    Releasable(Bitmap),
    /// Fallback decode; dropped with its owner.
    NonReleasable(ImageElement),
}

impl DrawableImage {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        match self {
            Self::Releasable(b) => b.width(),
            Self::NonReleasable(e) => e.width(),
        }
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        match self {
            Self::Releasable(b) => b.height(),
            Self::NonReleasable(e) => e.height(),
        }
    }

    /// Return `true` for the releasable variant.
    pub fn is_releasable(&self) -> bool {
        matches!(self, Self::Releasable(_))
    }

    /// Release held memory. Returns `true` only when something was actually released.
    pub fn release(&mut self) -> bool {
        match self {
            Self::Releasable(b) => b.release(),
            Self::NonReleasable(_) => false,
        }
    }

    /// Premultiplied RGBA8 pixels ready to composite, or `None` for a released bitmap.
    pub fn premul_pixels(&self) -> Option<&[u8]> {
        match self {
            Self::Releasable(b) => b.pixels(),
            Self::NonReleasable(e) => Some(e.premul_pixels()),
        }
    }
}

/// Turns encoded bytes into a [`DrawableImage`].
///
/// Called from blocking worker threads.
pub trait FrameDecoder: Send + Sync {
    /// Decode one encoded image.
    fn decode(&self, bytes: &[u8]) -> PlayerResult<DrawableImage>;
}

/// Options for [`ImageDecoder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecodeOpts {
    /// Try the bitmap path first.
    pub bitmap: bool,
    /// Largest image (in pixels) the bitmap path accepts before falling back.
    pub max_bitmap_pixels: u64,
}

impl Default for DecodeOpts {
    fn default() -> Self {
        Self {
            bitmap: true,
            max_bitmap_pixels: 4096 * 4096,
        }
    }
}

/// Default decoder: bitmap path first, image-element fallback.
#[derive(Clone, Debug, Default)]
pub struct ImageDecoder {
    opts: DecodeOpts,
}

impl ImageDecoder {
    /// Create a decoder with `opts`.
    pub fn new(opts: DecodeOpts) -> Self {
        Self { opts }
    }
}

impl FrameDecoder for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> PlayerResult<DrawableImage> {
        if self.opts.bitmap {
            match decode_bitmap(bytes, self.opts.max_bitmap_pixels) {
                Ok(bitmap) => return Ok(DrawableImage::Releasable(bitmap)),
                Err(e) => {
                    tracing::debug!(error = %e, "bitmap decode unavailable, using image element");
                }
            }
        }
        decode_element(bytes).map(DrawableImage::NonReleasable)
    }
}

/// Decode encoded bytes into a premultiplied [`Bitmap`] no larger than `max_pixels`.
pub fn decode_bitmap(bytes: &[u8], max_pixels: u64) -> PlayerResult<Bitmap> {
    let mut reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("sniff image format")?;
    let mut limits = image::Limits::default();
    limits.max_alloc = Some(max_pixels.saturating_mul(4));
    reader.limits(limits);

    let dyn_img = reader.decode().context("decode bitmap")?;
    let (width, height) = (dyn_img.width(), dyn_img.height());
    if u64::from(width) * u64::from(height) > max_pixels {
        return Err(PlayerError::asset(format!(
            "{width}x{height} exceeds bitmap limit of {max_pixels} pixels"
        )));
    }

    let mut rgba8_premul = dyn_img.into_rgba8().into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);
    Bitmap::from_premul(width, height, rgba8_premul)
}

/// Decode encoded bytes into a straight-alpha [`ImageElement`].
pub fn decode_element(bytes: &[u8]) -> PlayerResult<ImageElement> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(ImageElement::new(dyn_img.into_rgba8()))
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((px[0] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((px[1] as u16 * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((px[2] as u16 * 255 + a / 2) / a).min(255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
