//! Configuration management for hanzi-board-rs.
//!
//! Loads config from YAML files in standard locations. Every section has
//! defaults so the app runs with no config file at all; a missing API key
//! is not a startup error (requests just fail and surface as empty results).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the generative-language service.
    pub host: String,
    /// API key. The GEMINI_API_KEY environment variable takes precedence.
    pub key: String,
    /// Model used for character detail lookups (structured JSON output).
    pub detail_model: String,
    /// Model used for text-to-speech requests.
    pub tts_model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "https://generativelanguage.googleapis.com".into(),
            key: String::new(),
            detail_model: "gemini-2.5-flash".into(),
            tts_model: "gemini-2.5-flash-preview-tts".into(),
        }
    }
}

impl ApiConfig {
    /// Effective API key: environment variable wins over the config file.
    pub fn resolved_key(&self) -> String {
        std::env::var("GEMINI_API_KEY").unwrap_or_else(|_| self.key.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Prebuilt voice name for TTS requests.
    pub voice: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            voice: "Kore".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Render size (pixels) of the stroke-order widget, square.
    pub size: u32,
    /// Character submitted automatically at startup so the UI is never empty.
    pub default_character: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            size: 300,
            default_character: "猫".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8972,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub speech: SpeechConfig,
    pub writer: WriterConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./config.yaml
    /// 2. ~/.config/hanzi-board/config.yaml
    /// 3. /etc/hanzi-board/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("config.yaml")),
                dirs::home_dir().map(|h| h.join(".config/hanzi-board/config.yaml")),
                Some(PathBuf::from("/etc/hanzi-board/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match serde_yml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }
}
