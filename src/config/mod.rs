// Configuration module

pub mod retry;

pub use retry::RetryConfigYaml;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compositor::WatermarkOptions;
use crate::constants::{
    API_KEY_ENV_VAR, DEFAULT_GENERATION_ENDPOINT, DEFAULT_GENERATION_MODEL,
    DEFAULT_GENERATION_TIMEOUT_SECS, DEFAULT_MIN_IMAGE_BYTES, DEFAULT_MIN_IMAGE_DIMENSION,
    DEFAULT_UPLOAD_ROOT,
};
use crate::fonts::FontConfig;
use crate::generation::GenerationLimits;
use crate::logging::LoggingConfig;

/// Placeholder shipped in example configuration files
const PLACEHOLDER_API_KEY: &str = "your-gemini-api-key-here";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fonts: FontConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub watermark: WatermarkOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root of the upload tree; posters and logos live in subdirectories
    #[serde(default = "default_upload_root")]
    pub upload_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_root: default_upload_root(),
        }
    }
}

fn default_upload_root() -> PathBuf {
    PathBuf::from(DEFAULT_UPLOAD_ROOT)
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Falls back to the `GEMINI_API_KEY` environment variable when unset
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Inline payloads smaller than this are treated as malformed
    #[serde(default = "default_min_image_bytes")]
    pub min_image_bytes: usize,
    /// Both sides of a generated image must be at least this many pixels
    #[serde(default = "default_min_image_dimension")]
    pub min_image_dimension: u32,
    #[serde(default)]
    pub retry: RetryConfigYaml,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            min_image_bytes: default_min_image_bytes(),
            min_image_dimension: default_min_image_dimension(),
            retry: RetryConfigYaml::default(),
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("min_image_bytes", &self.min_image_bytes)
            .field("min_image_dimension", &self.min_image_dimension)
            .field("retry", &self.retry)
            .finish()
    }
}

impl GenerationConfig {
    /// API key from the file, else from the environment. Blank values and the
    /// example placeholder count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY)
    }

    pub fn limits(&self) -> GenerationLimits {
        GenerationLimits {
            min_image_bytes: self.min_image_bytes,
            min_image_dimension: self.min_image_dimension,
        }
    }
}

fn default_model() -> String {
    DEFAULT_GENERATION_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_GENERATION_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_GENERATION_TIMEOUT_SECS
}

fn default_min_image_bytes() -> usize {
    DEFAULT_MIN_IMAGE_BYTES
}

fn default_min_image_dimension() -> u32 {
    DEFAULT_MIN_IMAGE_DIMENSION
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        let mut missing = None;
        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    missing.get_or_insert_with(|| var_name.to_string());
                    String::new()
                }
            }
        });
        if let Some(var_name) = missing {
            return Err(format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            ));
        }

        // An empty file means "all defaults"
        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.generation.retry.max_attempts == 0 {
            return Err("generation.retry.max_attempts must be at least 1".to_string());
        }

        if self.generation.min_image_dimension == 0 {
            return Err("generation.min_image_dimension must be positive".to_string());
        }

        if self.generation.timeout_secs == 0 {
            return Err("generation.timeout_secs must be positive".to_string());
        }

        if !(1..=100).contains(&self.watermark.jpeg_quality) {
            return Err(format!(
                "watermark.jpeg_quality must be between 1 and 100, got {}",
                self.watermark.jpeg_quality
            ));
        }

        if self.watermark.text.trim().is_empty() {
            return Err("watermark.text cannot be empty".to_string());
        }

        if self.storage.upload_root.as_os_str().is_empty() {
            return Err("storage.upload_root cannot be empty".to_string());
        }

        Ok(())
    }
}
