use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Context;

use crate::assets::decode::{DrawableImage, unpremultiply_rgba8_in_place};
use crate::foundation::core::Canvas;
use crate::foundation::error::{PlayerError, PlayerResult};

/// Output target frames are drawn onto.
pub trait Surface: Send {
    /// Size the surface to `canvas`. Pixel size and logical size are the same.
    fn configure(&mut self, canvas: Canvas) -> PlayerResult<()>;

    /// Configured size, if any.
    fn size(&self) -> Option<Canvas>;

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Draw `image` at the origin, scaled to `width`x`height`.
    fn draw_image(&mut self, image: &DrawableImage, width: u32, height: u32) -> PlayerResult<()>;
}

/// Surface shared between a host and its playback session.
pub type SharedSurface = Arc<Mutex<dyn Surface>>;

/// Lock a shared surface, recovering from a poisoned lock.
pub fn lock_surface(surface: &SharedSurface) -> MutexGuard<'_, dyn Surface + 'static> {
    surface.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory surface holding premultiplied RGBA8 pixels.
#[derive(Clone, Debug, Default)]
pub struct FrameBuffer {
    canvas: Option<Canvas>,
    data: Vec<u8>,
    draws: u64,
}

impl FrameBuffer {
    /// Create an unconfigured buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Premultiplied RGBA8 pixels, row-major.
    pub fn rgba8_premul(&self) -> &[u8] {
        &self.data
    }

    /// Number of `draw_image` calls since creation.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }

    /// Premultiplied pixel at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let canvas = self.canvas?;
        if x >= canvas.width || y >= canvas.height {
            return None;
        }
        let i = (y as usize * canvas.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).and_then(|px| px.try_into().ok())
    }

    /// Copy out a straight-alpha image.
    pub fn to_rgba_image(&self) -> PlayerResult<image::RgbaImage> {
        let canvas = self
            .canvas
            .ok_or_else(|| PlayerError::validation("surface is not configured"))?;
        let mut data = self.data.clone();
        unpremultiply_rgba8_in_place(&mut data);
        image::RgbaImage::from_raw(canvas.width, canvas.height, data)
            .ok_or_else(|| PlayerError::validation("surface buffer does not match its size"))
    }

    /// Write the current pixels as a PNG, creating parent directories.
    pub fn save_png(&self, path: &Path) -> PlayerResult<()> {
        let img = self.to_rgba_image()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        img.save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

impl Surface for FrameBuffer {
    fn configure(&mut self, canvas: Canvas) -> PlayerResult<()> {
        let len = usize::try_from(canvas.area())
            .ok()
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                PlayerError::validation(format!(
                    "canvas {}x{} is too large",
                    canvas.width, canvas.height
                ))
            })?;
        self.data = vec![0; len];
        self.canvas = Some(canvas);
        Ok(())
    }

    fn size(&self) -> Option<Canvas> {
        self.canvas
    }

    fn clear(&mut self) {
        self.data.fill(0);
    }

    fn draw_image(&mut self, image: &DrawableImage, width: u32, height: u32) -> PlayerResult<()> {
        let canvas = self
            .canvas
            .ok_or_else(|| PlayerError::validation("surface is not configured"))?;
        let pixels = image
            .premul_pixels()
            .ok_or_else(|| PlayerError::asset("cannot draw a released frame"))?;
        let src = image::RgbaImage::from_raw(image.width(), image.height(), pixels.to_vec())
            .ok_or_else(|| PlayerError::asset("frame pixels do not match its size"))?;

        // Scaling runs on premultiplied pixels.
        let scaled = if src.dimensions() == (width, height) {
            src
        } else {
            image::imageops::resize(&src, width, height, image::imageops::FilterType::Triangle)
        };

        let cols = width.min(canvas.width) as usize;
        let rows = height.min(canvas.height) as usize;
        let src_stride = width as usize * 4;
        let dst_stride = canvas.width as usize * 4;
        let src = scaled.as_raw();
        for y in 0..rows {
            let s = &src[y * src_stride..y * src_stride + cols * 4];
            let d = &mut self.data[y * dst_stride..y * dst_stride + cols * 4];
            over_in_place(d, s);
        }
        self.draws += 1;
        Ok(())
    }
}

fn over_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let inv = 255 - u16::from(s[3]);
        for i in 0..4 {
            d[i] = s[i].saturating_add(mul_div255(u16::from(d[i]), inv));
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
