use std::sync::Mutex;

use tempfile::NamedTempFile;

use ppe_sentinel::{DetectionMode, SentineldConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "SENTINEL_CONFIG",
        "SENTINEL_MODEL",
        "SENTINEL_SOURCE",
        "SENTINEL_MODE",
        "SENTINEL_FONT",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "model": {
            "path": "stub://demo",
            "input_width": 416,
            "input_height": 416,
            "confidence_threshold": 0.35
        },
        "source": {
            "uri": "site.mp4",
            "target_fps": 12,
            "width": 800,
            "height": 600
        },
        "mode": "helmets",
        "font": "/usr/share/fonts/site/label.ttf"
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("SENTINEL_CONFIG", file.path());
    std::env::set_var("SENTINEL_SOURCE", "stub://cam");
    std::env::set_var("SENTINEL_MODE", "vests");

    let cfg = SentineldConfig::load().expect("load config");

    assert_eq!(cfg.model_path, "stub://demo");
    assert_eq!(cfg.model.input_width, 416);
    assert_eq!(cfg.model.input_height, 416);
    assert_eq!(cfg.model.confidence_threshold, 0.35);
    assert_eq!(cfg.source, "stub://cam");
    assert_eq!(cfg.capture.target_fps, 12);
    assert_eq!(cfg.capture.width, 800);
    assert_eq!(cfg.capture.height, 600);
    assert_eq!(cfg.mode, DetectionMode::VestsOnly);
    assert_eq!(
        cfg.font_path.as_deref(),
        Some(std::path::Path::new("/usr/share/fonts/site/label.ttf"))
    );

    clear_env();
}

#[test]
fn defaults_apply_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = SentineldConfig::load().expect("load defaults");

    assert_eq!(cfg.model_path, "stub://demo");
    assert_eq!(cfg.source, "stub://site");
    assert_eq!(cfg.mode, DetectionMode::AllItems);
    assert_eq!(cfg.capture.target_fps, 10);
    assert!(cfg.font_path.is_none());

    clear_env();
}

#[test]
fn invalid_mode_override_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("SENTINEL_MODE", "goggles");
    let err = SentineldConfig::load().unwrap_err();
    assert!(err.to_string().contains("unknown detection mode"));

    clear_env();
}
