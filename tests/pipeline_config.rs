use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use behavior_lens::config::PipelineConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "BEHAVIOR_CONFIG",
        "BEHAVIOR_SOURCE_URL",
        "BEHAVIOR_TARGET_FPS",
        "BEHAVIOR_FRAME_WIDTH",
        "BEHAVIOR_FRAME_HEIGHT",
        "BEHAVIOR_POSE_MODEL",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let cfg = PipelineConfig::load().expect("load defaults");
    assert_eq!(cfg.source.url, "stub://camera");
    assert_eq!(cfg.source.target_fps, 30);
    assert_eq!(cfg.source.width, 640);
    assert_eq!(cfg.source.height, 480);
    assert!(cfg.models.pose_model_path.is_none());
    assert_eq!(cfg.stats_interval, Duration::from_secs(5));
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    let file = write_config(
        r#"{
            "source": {
                "url": "stub://desk",
                "target_fps": 15,
                "width": 320,
                "height": 240
            },
            "models": {
                "pose_model_path": "/opt/models/movenet.onnx"
            },
            "loop": {
                "stats_interval_secs": 30
            }
        }"#,
    );
    std::env::set_var("BEHAVIOR_CONFIG", file.path());
    std::env::set_var("BEHAVIOR_TARGET_FPS", "24");
    std::env::set_var("BEHAVIOR_POSE_MODEL", "/tmp/pose.onnx");

    let cfg = PipelineConfig::load().expect("load config");
    assert_eq!(cfg.source.url, "stub://desk");
    assert_eq!(cfg.source.target_fps, 24);
    assert_eq!(cfg.source.width, 320);
    assert_eq!(cfg.source.height, 240);
    assert_eq!(
        cfg.models.pose_model_path,
        Some(PathBuf::from("/tmp/pose.onnx"))
    );
    assert_eq!(cfg.stats_interval, Duration::from_secs(30));

    let source = cfg.source_config();
    assert_eq!(source.width, 320);
    assert_eq!(cfg.loop_config().target_fps, 24);

    clear_env();
}

#[test]
fn rejects_zero_fps_and_bad_numbers() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    std::env::set_var("BEHAVIOR_TARGET_FPS", "0");
    let err = PipelineConfig::load().unwrap_err();
    assert!(err.to_string().contains("target_fps"));

    std::env::set_var("BEHAVIOR_TARGET_FPS", "fast");
    let err = PipelineConfig::load().unwrap_err();
    assert!(err.to_string().contains("BEHAVIOR_TARGET_FPS"));

    clear_env();
    std::env::set_var("BEHAVIOR_FRAME_HEIGHT", "0");
    assert!(PipelineConfig::load().is_err());

    clear_env();
}

#[test]
fn reports_unreadable_and_invalid_files() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();

    std::env::set_var("BEHAVIOR_CONFIG", "/nonexistent/behavior.json");
    let err = PipelineConfig::load().unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));

    let file = write_config("{ not json");
    std::env::set_var("BEHAVIOR_CONFIG", file.path());
    let err = PipelineConfig::load().unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    clear_env();
}
