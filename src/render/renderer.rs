use crate::assets::store::FrameStore;
use crate::foundation::core::Canvas;
use crate::foundation::error::PlayerResult;
use crate::render::surface::Surface;

/// Draws one frame of a [`FrameStore`] onto a surface, scaled to fill the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Renderer {
    canvas: Canvas,
}

impl Renderer {
    /// Create a renderer for `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        Self { canvas }
    }

    /// Target size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Clear `surface` and draw frame `index`.
    ///
    /// Returns `Ok(false)` without touching the surface when `index` is not in the store.
    pub fn draw(
        &self,
        surface: &mut dyn Surface,
        frames: &FrameStore,
        index: usize,
    ) -> PlayerResult<bool> {
        let Some(image) = frames.get(index) else {
            tracing::warn!(index, frames = frames.len(), "no frame at index, nothing drawn");
            return Ok(false);
        };
        surface.clear();
        surface.draw_image(image, self.canvas.width, self.canvas.height)?;
        tracing::trace!(index, "frame drawn");
        Ok(true)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
