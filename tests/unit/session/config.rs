use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;

#[test]
fn player_config_uses_camel_case_and_loop_key() {
    let cfg: PlayerConfig = serde_json::from_str(
        r#"{"manifestUrl":"https://cdn.example.com/m.json","fps":12.5,"canvasWidth":640,"loop":true}"#,
    )
    .unwrap();
    assert_eq!(
        cfg,
        PlayerConfig::new("https://cdn.example.com/m.json")
            .with_fps(12.5)
            .with_canvas_width(640)
            .with_loop(true)
    );

    let minimal: PlayerConfig = serde_json::from_str(r#"{"manifestUrl":"m.json"}"#).unwrap();
    assert!(!minimal.looping);
    assert_eq!(minimal.overrides(), ManifestOverrides::default());
    assert_eq!(
        serde_json::to_string(&minimal).unwrap(),
        r#"{"manifestUrl":"m.json","loop":false}"#
    );
}

#[test]
fn overrides_follow_config() {
    let cfg = PlayerConfig::new("m.json").with_fps(30.0).with_canvas_width(320);
    let o = cfg.overrides();
    assert_eq!(o.fps, Some(30.0));
    assert_eq!(o.canvas_width, Some(320));
    assert_eq!(cfg.manifest_location().unwrap().scheme(), "file");
}

#[test]
fn pipeline_opts_defaults() {
    let opts = PipelineOpts::default();
    assert_eq!(opts.max_concurrent, 8);
    assert_eq!(opts.refresh_hz, 60.0);
    assert_eq!(opts.request_timeout(), Duration::from_secs(30));
    assert_eq!(opts.decode.max_bitmap_pixels, 16_777_216);
    opts.validate().unwrap();

    let parsed: PipelineOpts = serde_json::from_str(r#"{"maxConcurrent":2}"#).unwrap();
    assert_eq!(parsed.max_concurrent, 2);
    assert_eq!(parsed.refresh_hz, 60.0);
}

#[test]
fn pipeline_opts_validation() {
    let bad = [
        PipelineOpts {
            max_concurrent: 0,
            ..PipelineOpts::default()
        },
        PipelineOpts {
            refresh_hz: 0.0,
            ..PipelineOpts::default()
        },
        PipelineOpts {
            refresh_hz: f64::NAN,
            ..PipelineOpts::default()
        },
        PipelineOpts {
            request_timeout_ms: 0,
            ..PipelineOpts::default()
        },
    ];
    for opts in bad {
        assert!(matches!(
            opts.validate().unwrap_err(),
            PlayerError::Validation(_)
        ));
    }
}

#[test]
fn pipeline_opts_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.json");
    std::fs::write(&good, r#"{"refreshHz":30,"decode":{"bitmap":false}}"#).unwrap();
    let opts = PipelineOpts::from_path(&good).unwrap();
    assert_eq!(opts.refresh_hz, 30.0);
    assert!(!opts.decode.bitmap);
    assert_eq!(opts.max_concurrent, 8);

    let bad = dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"maxConcurrent":0}"#).unwrap();
    assert!(PipelineOpts::from_path(&bad).is_err());
    assert!(PipelineOpts::from_path(&dir.path().join("missing.json")).is_err());
}

#[test]
fn callbacks_fire_at_most_once() {
    let count = Arc::new(AtomicUsize::new(0));
    let (c1, c2) = (Arc::clone(&count), Arc::clone(&count));
    let mut cb = Callbacks::new()
        .on_ready(move || {
            c1.fetch_add(1, Ordering::SeqCst);
        })
        .on_error(move |e| {
            assert!(matches!(e, PlayerError::Asset(_)));
            c2.fetch_add(10, Ordering::SeqCst);
        });
    assert_eq!(
        format!("{cb:?}"),
        "Callbacks { on_ready: true, on_end: false, on_error: true }"
    );

    cb.ready();
    cb.ready();
    cb.end();
    cb.error(PlayerError::asset("boom"));
    cb.error(PlayerError::asset("again, only logged"));
    assert_eq!(count.load(Ordering::SeqCst), 11);
}
