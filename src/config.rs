//! Capture configuration.
//!
//! Layered the usual way: built-in defaults, then an optional JSON config
//! file named by `SCENECAP_CONFIG`, then `SCENECAP_*` environment
//! overrides. CLI flags are applied on top by the binary.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::source::StreamConfig;

const DEFAULT_ROOT: &str = "dataset";
const DEFAULT_SPLIT: &str = "train";
const DEFAULT_SOURCE_URL: &str = "stub://camera";
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_FPS: u32 = 30;

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    dataset_root: Option<PathBuf>,
    split: Option<String>,
    scene: Option<u32>,
    stream: Option<StreamConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct StreamConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub dataset_root: PathBuf,
    pub split: String,
    pub scene: u32,
    pub stream: StreamSettings,
}

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl StreamSettings {
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
        }
    }
}

impl CaptureConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SCENECAP_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: CaptureConfigFile) -> Self {
        let stream = file.stream.unwrap_or_default();
        Self {
            dataset_root: file
                .dataset_root
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT)),
            split: file.split.unwrap_or_else(|| DEFAULT_SPLIT.to_string()),
            scene: file.scene.unwrap_or(0),
            stream: StreamSettings {
                url: stream.url.unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                width: stream.width.unwrap_or(DEFAULT_WIDTH),
                height: stream.height.unwrap_or(DEFAULT_HEIGHT),
                fps: stream.fps.unwrap_or(DEFAULT_FPS),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(root) = std::env::var("SCENECAP_ROOT") {
            if !root.trim().is_empty() {
                self.dataset_root = PathBuf::from(root);
            }
        }
        if let Ok(split) = std::env::var("SCENECAP_SPLIT") {
            if !split.trim().is_empty() {
                self.split = split;
            }
        }
        if let Ok(scene) = std::env::var("SCENECAP_SCENE") {
            self.scene = scene
                .parse()
                .map_err(|_| anyhow!("SCENECAP_SCENE must be a non-negative integer"))?;
        }
        if let Ok(url) = std::env::var("SCENECAP_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.stream.url = url;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.split.trim().is_empty() {
            return Err(anyhow!("split name must not be empty"));
        }
        if self.split.contains('/') || self.split.contains('\\') {
            return Err(anyhow!("split name must not contain path separators"));
        }
        if self.stream.width == 0 || self.stream.height == 0 || self.stream.fps == 0 {
            return Err(anyhow!(
                "stream configuration {}x{} @ {} fps is invalid",
                self.stream.width,
                self.stream.height,
                self.stream.fps
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<CaptureConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
