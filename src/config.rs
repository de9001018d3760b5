use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::detect::ObjectClass;

const DEFAULT_API_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_SOURCE_URL: &str = "stub://camera0";
const DEFAULT_SOURCE_FPS: u32 = 10;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_DETECTOR_BACKEND: &str = "stub";
const DEFAULT_DETECTOR_TIMEOUT_SECS: u64 = 5;
const DEFAULT_TARGET_CLASS: &str = "person";
const DEFAULT_INTERVAL_MS: u64 = 100;
const DEFAULT_MODEL_WIDTH: u32 = 640;
const DEFAULT_MODEL_HEIGHT: u32 = 480;

const KNOWN_BACKENDS: &[&str] = &["stub", "remote", "tract"];

#[derive(Debug, Deserialize, Default)]
struct HeadcountdConfigFile {
    api: Option<ApiConfigFile>,
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    #[serde(rename = "loop")]
    pacing: Option<LoopConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiConfigFile {
    addr: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    remote_url: Option<String>,
    timeout_secs: Option<u64>,
    model_path: Option<String>,
    model_width: Option<u32>,
    model_height: Option<u32>,
    target_class: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LoopConfigFile {
    interval_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct HeadcountdConfig {
    pub api_addr: String,
    pub source: SourceSettings,
    pub detector: DetectorSettings,
    pub interval: Duration,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    pub remote_url: Option<String>,
    pub timeout: Duration,
    pub model_path: Option<String>,
    pub model_width: u32,
    pub model_height: u32,
    pub target_class: ObjectClass,
}

impl HeadcountdConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("HEADCOUNT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: HeadcountdConfigFile) -> Result<Self> {
        let api_addr = file
            .api
            .and_then(|api| api.addr)
            .unwrap_or_else(|| DEFAULT_API_ADDR.to_string());
        let source = SourceSettings {
            url: file
                .source
                .as_ref()
                .and_then(|source| source.url.clone())
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            target_fps: file
                .source
                .as_ref()
                .and_then(|source| source.target_fps)
                .unwrap_or(DEFAULT_SOURCE_FPS),
            width: file
                .source
                .as_ref()
                .and_then(|source| source.width)
                .unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: file
                .source
                .as_ref()
                .and_then(|source| source.height)
                .unwrap_or(DEFAULT_SOURCE_HEIGHT),
        };
        let detector = DetectorSettings {
            backend: file
                .detector
                .as_ref()
                .and_then(|detector| detector.backend.clone())
                .unwrap_or_else(|| DEFAULT_DETECTOR_BACKEND.to_string()),
            remote_url: file
                .detector
                .as_ref()
                .and_then(|detector| detector.remote_url.clone()),
            timeout: Duration::from_secs(
                file.detector
                    .as_ref()
                    .and_then(|detector| detector.timeout_secs)
                    .unwrap_or(DEFAULT_DETECTOR_TIMEOUT_SECS),
            ),
            model_path: file
                .detector
                .as_ref()
                .and_then(|detector| detector.model_path.clone()),
            model_width: file
                .detector
                .as_ref()
                .and_then(|detector| detector.model_width)
                .unwrap_or(DEFAULT_MODEL_WIDTH),
            model_height: file
                .detector
                .as_ref()
                .and_then(|detector| detector.model_height)
                .unwrap_or(DEFAULT_MODEL_HEIGHT),
            target_class: ObjectClass::parse_target(
                file.detector
                    .as_ref()
                    .and_then(|detector| detector.target_class.as_deref())
                    .unwrap_or(DEFAULT_TARGET_CLASS),
            )?,
        };
        let interval = Duration::from_millis(
            file.pacing
                .and_then(|pacing| pacing.interval_ms)
                .unwrap_or(DEFAULT_INTERVAL_MS),
        );
        Ok(Self {
            api_addr,
            source,
            detector,
            interval,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(addr) = std::env::var("HEADCOUNT_API_ADDR") {
            if !addr.trim().is_empty() {
                self.api_addr = addr;
            }
        }
        if let Ok(url) = std::env::var("HEADCOUNT_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(backend) = std::env::var("HEADCOUNT_DETECTOR") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend;
            }
        }
        if let Ok(url) = std::env::var("HEADCOUNT_REMOTE_URL") {
            if !url.trim().is_empty() {
                self.detector.remote_url = Some(url);
            }
        }
        if let Ok(label) = std::env::var("HEADCOUNT_TARGET_CLASS") {
            if !label.trim().is_empty() {
                self.detector.target_class = ObjectClass::parse_target(&label)?;
            }
        }
        if let Ok(interval) = std::env::var("HEADCOUNT_INTERVAL_MS") {
            let millis: u64 = interval.parse().map_err(|_| {
                anyhow!("HEADCOUNT_INTERVAL_MS must be an integer number of milliseconds")
            })?;
            self.interval = Duration::from_millis(millis);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.api_addr
            .parse::<SocketAddr>()
            .map_err(|_| anyhow!("api addr '{}' is not a socket address", self.api_addr))?;

        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source dimensions must be greater than zero"));
        }

        if !KNOWN_BACKENDS.contains(&self.detector.backend.as_str()) {
            return Err(anyhow!(
                "unknown detector backend '{}'; expected one of {}",
                self.detector.backend,
                KNOWN_BACKENDS.join(", ")
            ));
        }
        if self.detector.backend == "remote" && self.detector.remote_url.is_none() {
            return Err(anyhow!(
                "detector.remote_url is required for the remote backend"
            ));
        }
        if self.detector.backend == "tract" && self.detector.model_path.is_none() {
            return Err(anyhow!(
                "detector.model_path is required for the tract backend"
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<HeadcountdConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
