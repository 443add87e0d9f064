use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::ModelConfig;
use crate::mode::DetectionMode;
use crate::source::VideoSourceConfig;

const DEFAULT_MODEL: &str = "stub://demo";
const DEFAULT_SOURCE: &str = "stub://site";
const DEFAULT_MODE: &str = "all";
const DEFAULT_INPUT_WIDTH: u32 = 640;
const DEFAULT_INPUT_HEIGHT: u32 = 640;
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
const DEFAULT_CAPTURE_FPS: u32 = 10;
const DEFAULT_CAPTURE_WIDTH: u32 = 640;
const DEFAULT_CAPTURE_HEIGHT: u32 = 480;

#[derive(Debug, Deserialize, Default)]
struct SentineldConfigFile {
    model: Option<ModelConfigFile>,
    source: Option<SourceConfigFile>,
    mode: Option<String>,
    font: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<String>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    confidence_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    uri: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Daemon configuration: JSON file (path in `SENTINEL_CONFIG`) with
/// `SENTINEL_*` environment overrides applied on top.
#[derive(Debug, Clone)]
pub struct SentineldConfig {
    /// Model artifact path, or `stub://...` for the built-in stub backend.
    pub model_path: String,
    pub model: ModelConfig,
    /// Default source opened at startup (device index, file path or stub).
    pub source: String,
    pub capture: VideoSourceConfig,
    pub mode: DetectionMode,
    pub font_path: Option<PathBuf>,
}

impl SentineldConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SENTINEL_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SentineldConfigFile) -> Result<Self> {
        let model_path = file
            .model
            .as_ref()
            .and_then(|model| model.path.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let model = ModelConfig {
            input_width: file
                .model
                .as_ref()
                .and_then(|model| model.input_width)
                .unwrap_or(DEFAULT_INPUT_WIDTH),
            input_height: file
                .model
                .as_ref()
                .and_then(|model| model.input_height)
                .unwrap_or(DEFAULT_INPUT_HEIGHT),
            confidence_threshold: file
                .model
                .as_ref()
                .and_then(|model| model.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
        };
        let source = file
            .source
            .as_ref()
            .and_then(|source| source.uri.clone())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        let capture = VideoSourceConfig {
            target_fps: file
                .source
                .as_ref()
                .and_then(|source| source.target_fps)
                .unwrap_or(DEFAULT_CAPTURE_FPS),
            width: file
                .source
                .as_ref()
                .and_then(|source| source.width)
                .unwrap_or(DEFAULT_CAPTURE_WIDTH),
            height: file
                .source
                .as_ref()
                .and_then(|source| source.height)
                .unwrap_or(DEFAULT_CAPTURE_HEIGHT),
        };
        let mode = file
            .mode
            .unwrap_or_else(|| DEFAULT_MODE.to_string())
            .parse::<DetectionMode>()?;

        Ok(Self {
            model_path,
            model,
            source,
            capture,
            mode,
            font_path: file.font,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(model) = std::env::var("SENTINEL_MODEL") {
            if !model.trim().is_empty() {
                self.model_path = model;
            }
        }
        if let Ok(source) = std::env::var("SENTINEL_SOURCE") {
            if !source.trim().is_empty() {
                self.source = source;
            }
        }
        if let Ok(mode) = std::env::var("SENTINEL_MODE") {
            if !mode.trim().is_empty() {
                self.mode = mode.parse::<DetectionMode>()?;
            }
        }
        if let Ok(font) = std::env::var("SENTINEL_FONT") {
            if !font.trim().is_empty() {
                self.font_path = Some(PathBuf::from(font));
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.model.confidence_threshold) {
            return Err(anyhow!("confidence threshold must be within 0..=1"));
        }
        if self.model.input_width == 0 || self.model.input_height == 0 {
            return Err(anyhow!("model input dimensions must be non-zero"));
        }
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(anyhow!("capture dimensions must be non-zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SentineldConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
