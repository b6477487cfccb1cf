use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detection_loop::LoopConfig;
use crate::error::PipelineError;
use crate::ingest::SourceConfig;

const DEFAULT_SOURCE_URL: &str = "stub://camera";
const DEFAULT_TARGET_FPS: u32 = 30;
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_STATS_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Deserialize, Default)]
struct PipelineConfigFile {
    source: Option<SourceConfigFile>,
    models: Option<ModelsConfigFile>,
    #[serde(rename = "loop")]
    detection_loop: Option<LoopConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelsConfigFile {
    pose_model_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct LoopConfigFile {
    stats_interval_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source: SourceSettings,
    pub models: ModelSettings,
    pub stats_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ModelSettings {
    /// ONNX pose model, used by the `backend-tract` build.
    pub pose_model_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source: SourceSettings {
                url: DEFAULT_SOURCE_URL.to_string(),
                target_fps: DEFAULT_TARGET_FPS,
                width: DEFAULT_FRAME_WIDTH,
                height: DEFAULT_FRAME_HEIGHT,
            },
            models: ModelSettings::default(),
            stats_interval: Duration::from_secs(DEFAULT_STATS_INTERVAL_SECS),
        }
    }
}

impl PipelineConfig {
    /// Defaults, then the JSON file named by `BEHAVIOR_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("BEHAVIOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PipelineConfigFile) -> Self {
        let source = file.source.unwrap_or_default();
        Self {
            source: SourceSettings {
                url: source
                    .url
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                target_fps: source.target_fps.unwrap_or(DEFAULT_TARGET_FPS),
                width: source.width.unwrap_or(DEFAULT_FRAME_WIDTH),
                height: source.height.unwrap_or(DEFAULT_FRAME_HEIGHT),
            },
            models: ModelSettings {
                pose_model_path: file.models.and_then(|models| models.pose_model_path),
            },
            stats_interval: Duration::from_secs(
                file.detection_loop
                    .and_then(|l| l.stats_interval_secs)
                    .unwrap_or(DEFAULT_STATS_INTERVAL_SECS),
            ),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("BEHAVIOR_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(fps) = std::env::var("BEHAVIOR_TARGET_FPS") {
            self.source.target_fps = parse_u32("BEHAVIOR_TARGET_FPS", &fps)?;
        }
        if let Ok(width) = std::env::var("BEHAVIOR_FRAME_WIDTH") {
            self.source.width = parse_u32("BEHAVIOR_FRAME_WIDTH", &width)?;
        }
        if let Ok(height) = std::env::var("BEHAVIOR_FRAME_HEIGHT") {
            self.source.height = parse_u32("BEHAVIOR_FRAME_HEIGHT", &height)?;
        }
        if let Ok(path) = std::env::var("BEHAVIOR_POSE_MODEL") {
            if !path.trim().is_empty() {
                self.models.pose_model_path = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(PipelineError::invalid_config("source url must not be empty"));
        }
        if self.source.target_fps == 0 {
            return Err(PipelineError::invalid_config(
                "target_fps must be greater than zero",
            ));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(PipelineError::invalid_config(
                "frame width and height must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            url: self.source.url.clone(),
            target_fps: self.source.target_fps,
            width: self.source.width,
            height: self.source.height,
        }
    }

    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            target_fps: self.source.target_fps,
            stats_interval: self.stats_interval,
            max_frames: None,
        }
    }
}

fn read_config_file(path: &Path) -> Result<PipelineConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn parse_u32(var: &str, value: &str) -> Result<u32> {
    let parsed = value.trim().parse().map_err(|_| {
        PipelineError::invalid_config(format!("{} must be a non-negative integer", var))
    })?;
    Ok(parsed)
}
