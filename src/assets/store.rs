use crate::assets::decode::DrawableImage;

/// Owns every decoded frame of a session, in manifest order.
///
/// Filled once by the asset fetcher, read by the renderer, emptied by teardown.
#[derive(Debug, Default)]
pub struct FrameStore {
    frames: Vec<DrawableImage>,
}

impl FrameStore {
    /// Take ownership of frames already in manifest order.
    pub fn new(frames: Vec<DrawableImage>) -> Self {
        Self { frames }
    }

    /// Number of frames held.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Return `true` when no frames are held.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Borrow frame `index`.
    pub fn get(&self, index: usize) -> Option<&DrawableImage> {
        self.frames.get(index)
    }

    /// Iterate frames in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = &DrawableImage> {
        self.frames.iter()
    }

    /// Release every releasable frame and drop all frames.
    ///
    /// Returns how many frames were actually released; a second call returns 0.
    pub fn release_all(&mut self) -> usize {
        let released = self
            .frames
            .iter_mut()
            .map(DrawableImage::release)
            .filter(|r| *r)
            .count();
        self.frames.clear();
        released
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
