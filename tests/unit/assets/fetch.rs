use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::time::Duration;

use bytes::Bytes;

use super::*;
use crate::assets::decode::ImageDecoder;
use crate::manifest::model::{ManifestDoc, ManifestOverrides};

const BASE: &str = "https://cdn.example.com/avatar/";

fn png_with_red(red: u8) -> Bytes {
    let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([red, 0, 0, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    Bytes::from(buf)
}

#[derive(Default)]
struct SlowSource {
    bodies: HashMap<String, Bytes>,
    delays_ms: HashMap<String, u64>,
    failing: Vec<String>,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
    fetches: AtomicUsize,
}

impl SlowSource {
    fn insert(&mut self, name: &str, body: Bytes, delay_ms: u64) {
        self.bodies.insert(format!("{BASE}{name}"), body);
        self.delays_ms.insert(format!("{BASE}{name}"), delay_ms);
    }
}

#[async_trait::async_trait]
impl AssetSource for SlowSource {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Bytes> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays_ms.get(url.as_str()).copied().unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.failing.iter().any(|f| url.as_str().ends_with(f.as_str())) {
            anyhow::bail!("503 for {url}");
        }
        self.bodies
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("404 for {url}"))
    }
}

fn manifest(frames: &[String], zip: Option<&str>) -> Manifest {
    let doc = ManifestDoc {
        base_path: None,
        frames: frames.to_vec(),
        fps: Some(10.0),
        width: None,
        height: None,
        audio: "a.ogg".to_string(),
        zip: zip.map(str::to_string),
    };
    Manifest::from_doc(
        doc,
        &Url::parse(&format!("{BASE}manifest.json")).unwrap(),
        ManifestOverrides::default(),
    )
    .unwrap()
}

fn red_of(img: &DrawableImage) -> u8 {
    img.premul_pixels().unwrap()[0]
}

fn fetcher(source: Arc<SlowSource>, max: usize) -> AssetFetcher {
    AssetFetcher::new(source, Arc::new(ImageDecoder::default()), max)
}

#[tokio::test]
async fn individual_mode_orders_by_index_not_arrival() {
    let n = 20usize;
    let mut src = SlowSource::default();
    let mut names = Vec::new();
    for i in 0..n {
        let name = format!("f{i:03}.png");
        // Later frames finish first.
        src.insert(&name, png_with_red(i as u8), ((n - i) * 2) as u64);
        names.push(name);
    }
    let src = Arc::new(src);

    let store = fetcher(src.clone(), MAX_CONCURRENT)
        .load(&manifest(&names, None), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(store.len(), n);
    let reds: Vec<u8> = store.iter().map(red_of).collect();
    assert_eq!(reds, (0..n as u8).collect::<Vec<_>>());
    assert_eq!(src.fetches.load(Ordering::SeqCst), n);
    assert!(src.high_water.load(Ordering::SeqCst) <= MAX_CONCURRENT);
}

#[tokio::test]
async fn pool_never_exceeds_frame_count_or_bound() {
    let mut src = SlowSource::default();
    let names: Vec<String> = (0..3).map(|i| format!("{i}.png")).collect();
    for (i, name) in names.iter().enumerate() {
        src.insert(name, png_with_red(i as u8), 5);
    }
    let src = Arc::new(src);
    fetcher(src.clone(), MAX_CONCURRENT)
        .load(&manifest(&names, None), &CancellationToken::new())
        .await
        .unwrap();
    assert!(src.high_water.load(Ordering::SeqCst) <= 3);

    let mut src = SlowSource::default();
    let names: Vec<String> = (0..10).map(|i| format!("{i}.png")).collect();
    for (i, name) in names.iter().enumerate() {
        src.insert(name, png_with_red(i as u8), 5);
    }
    let src = Arc::new(src);
    fetcher(src.clone(), 2)
        .load(&manifest(&names, None), &CancellationToken::new())
        .await
        .unwrap();
    assert!(src.high_water.load(Ordering::SeqCst) <= 2);
    assert_eq!(src.fetches.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn one_failed_fetch_fails_the_whole_load() {
    let mut src = SlowSource::default();
    let names: Vec<String> = ["a.png", "b.png", "c.png"].map(String::from).to_vec();
    for (i, name) in names.iter().enumerate() {
        src.insert(name, png_with_red(i as u8), 1);
    }
    src.failing.push("b.png".to_string());

    let err = fetcher(Arc::new(src), MAX_CONCURRENT)
        .load(&manifest(&names, None), &CancellationToken::new())
        .await
        .unwrap_err();
    let PlayerError::Asset(msg) = err else {
        panic!("expected asset error, got {err:?}");
    };
    assert!(msg.contains("frame 1"));
}

#[tokio::test]
async fn undecodable_frame_is_asset_error() {
    let mut src = SlowSource::default();
    src.insert("a.png", Bytes::from_static(b"not an image"), 0);
    let err = fetcher(Arc::new(src), MAX_CONCURRENT)
        .load(&manifest(&["a.png".to_string()], None), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PlayerError::Asset(_)));
}

#[tokio::test]
async fn cancelled_load_commits_nothing() {
    let mut src = SlowSource::default();
    src.insert("a.png", png_with_red(0), 0);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = fetcher(Arc::new(src), MAX_CONCURRENT)
        .load(&manifest(&["a.png".to_string()], None), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn archive_mode_issues_a_single_fetch() {
    let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, red) in [("b.png", 1u8), ("a.png", 0u8)] {
        w.start_file(name, zip::write::SimpleFileOptions::default())
            .unwrap();
        w.write_all(&png_with_red(red)).unwrap();
    }
    let archive = Bytes::from(w.finish().unwrap().into_inner());

    let mut src = SlowSource::default();
    src.insert("frames.zip", archive, 0);
    let src = Arc::new(src);
    let names: Vec<String> = ["a.png", "b.png"].map(String::from).to_vec();

    let store = fetcher(src.clone(), MAX_CONCURRENT)
        .load(&manifest(&names, Some("frames.zip")), &CancellationToken::new())
        .await
        .unwrap();
    let reds: Vec<u8> = store.iter().map(red_of).collect();
    assert_eq!(reds, vec![0, 1]);
    assert_eq!(src.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn archive_missing_entry_is_asset_error() {
    let mut w = zip::ZipWriter::new(Cursor::new(Vec::new()));
    w.start_file("a.png", zip::write::SimpleFileOptions::default())
        .unwrap();
    w.write_all(&png_with_red(0)).unwrap();
    let archive = Bytes::from(w.finish().unwrap().into_inner());

    let mut src = SlowSource::default();
    src.insert("frames.zip", archive, 0);
    let names: Vec<String> = ["a.png", "missing.png"].map(String::from).to_vec();
    let err = fetcher(Arc::new(src), MAX_CONCURRENT)
        .load(&manifest(&names, Some("frames.zip")), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PlayerError::Asset(_)));
}
