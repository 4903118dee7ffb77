use std::collections::HashMap;

use bytes::Bytes;

use super::*;

struct MapSource(HashMap<String, Bytes>);

#[async_trait::async_trait]
impl AssetSource for MapSource {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Bytes> {
        self.0
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("404 for {url}"))
    }
}

fn loader_with(url: &str, body: &str) -> ManifestLoader {
    let mut map = HashMap::new();
    map.insert(url.to_string(), Bytes::from(body.to_string()));
    ManifestLoader::new(Arc::new(MapSource(map)))
}

const URL: &str = "https://cdn.example.com/a/manifest.json";

#[tokio::test]
async fn loads_and_applies_defaults() {
    let loader = loader_with(URL, r#"{"frames":["a.jpg","b.jpg"],"audio":"a.ogg"}"#);
    let m = loader
        .load(&Url::parse(URL).unwrap(), ManifestOverrides::default())
        .await
        .unwrap();
    assert_eq!(m.frame_count(), 2);
    assert_eq!(m.fps().as_f64(), 25.0);
    assert_eq!(m.canvas().width, 1280);
}

#[tokio::test]
async fn fetch_failure_is_manifest_error() {
    let loader = loader_with(URL, "{}");
    let err = loader
        .load(
            &Url::parse("https://cdn.example.com/missing.json").unwrap(),
            ManifestOverrides::default(),
        )
        .await
        .unwrap_err();
    let PlayerError::Manifest(msg) = err else {
        panic!("expected manifest error, got {err:?}");
    };
    assert!(msg.contains("404"));
}

#[tokio::test]
async fn malformed_json_is_manifest_error() {
    let loader = loader_with(URL, "{ not json");
    let err = loader
        .load(&Url::parse(URL).unwrap(), ManifestOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PlayerError::Manifest(_)));
}

#[tokio::test]
async fn empty_frame_list_is_rejected_at_load() {
    let loader = loader_with(URL, r#"{"frames":[],"audio":"a.ogg"}"#);
    let err = loader
        .load(&Url::parse(URL).unwrap(), ManifestOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PlayerError::Manifest(_)));
}
