use super::*;
use crate::assets::decode::{Bitmap, ImageElement};

fn bitmap() -> DrawableImage {
    DrawableImage::Releasable(Bitmap::from_premul(1, 1, vec![1, 2, 3, 255]).unwrap())
}

fn element() -> DrawableImage {
    DrawableImage::NonReleasable(ImageElement::new(image::RgbaImage::new(1, 1)))
}

#[test]
fn get_follows_insertion_order() {
    let store = FrameStore::new(vec![bitmap(), element()]);
    assert_eq!(store.len(), 2);
    assert!(store.get(0).unwrap().is_releasable());
    assert!(!store.get(1).unwrap().is_releasable());
    assert!(store.get(2).is_none());
    assert_eq!(store.iter().count(), 2);
}

#[test]
fn release_all_only_counts_releasable_frames() {
    let mut store = FrameStore::new(vec![bitmap(), element(), bitmap()]);
    assert_eq!(store.release_all(), 2);
    assert!(store.is_empty());
}

#[test]
fn release_all_twice_is_harmless() {
    let mut store = FrameStore::new(vec![bitmap()]);
    assert_eq!(store.release_all(), 1);
    assert_eq!(store.release_all(), 0);
    assert_eq!(FrameStore::default().release_all(), 0);
}
