use crate::orchestrator::retry::RetryPolicy;
use crate::orchestrator::BatchOptions;
use crate::tts::VoiceSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE: &str = "tts-workbench.json";
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:6789";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_CONCURRENCY: usize = 16;

pub const ENV_ENDPOINT: &str = "TTS_ENDPOINT";
pub const ENV_VOICE: &str = "TTS_VOICE";
pub const ENV_CONCURRENCY: &str = "TTS_CONCURRENCY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub voice: VoiceSettings,
    pub split_sentences: bool,
    pub concurrency: usize,
    pub retry: RetrySettings,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            voice: VoiceSettings::default(),
            split_sentences: false,
            concurrency: 1,
            retry: RetrySettings::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl AppConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            voice: self.voice.clone(),
            split_sentences: self.split_sentences,
            concurrency: self.concurrency,
            retry: self.retry_policy(),
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply `TTS_*` overrides from `lookup`, then re-normalize.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(voice) = lookup(ENV_VOICE).filter(|v| !v.trim().is_empty()) {
            self.voice.spk_name = voice;
        }
        if let Some(raw) = lookup(ENV_CONCURRENCY) {
            match raw.trim().parse::<usize>() {
                Ok(concurrency) => self.concurrency = concurrency,
                Err(_) => tracing::warn!("Ignoring invalid {}={:?}", ENV_CONCURRENCY, raw),
            }
        }
        normalize_config(self);
    }
}

pub fn normalize_endpoint(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_ENDPOINT.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn normalize_config(config: &mut AppConfig) {
    config.endpoint = normalize_endpoint(&config.endpoint);
    config.voice = config.voice.clone().normalized();
    config.concurrency = config.concurrency.clamp(1, MAX_CONCURRENCY);
    config.retry.max_attempts = config.retry.max_attempts.max(1);
    if config.request_timeout_secs == 0 {
        config.request_timeout_secs = DEFAULT_TIMEOUT_SECS;
    }
    if config.output_dir.as_os_str().is_empty() {
        config.output_dir = PathBuf::from(DEFAULT_OUTPUT_DIR);
    }
}

/// Load the config at `path`, writing defaults if it does not exist.
///
/// An unparsable file is copied to `*.json.bak` and replaced by defaults.
pub fn load_or_create(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        let config = AppConfig::default();
        save(path, &config)?;
        tracing::info!("Created default config at {}", path.display());
        return Ok(config);
    }

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_json::from_str::<AppConfig>(&raw) {
        Ok(mut config) => {
            normalize_config(&mut config);
            Ok(config)
        }
        Err(e) => {
            let backup = path.with_extension("json.bak");
            tracing::warn!(
                "Config {} is invalid ({}), backing up to {}",
                path.display(),
                e,
                backup.display()
            );
            let _ = fs::copy(path, &backup);
            let config = AppConfig::default();
            save(path, &config)?;
            Ok(config)
        }
    }
}

pub fn save(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = load_or_create(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        let reloaded = load_or_create(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_invalid_config_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();

        let config = load_or_create(&path).unwrap();
        assert_eq!(config, AppConfig::default());
        let backup = dir.path().join("tts-workbench.json.bak");
        assert_eq!(fs::read_to_string(backup).unwrap(), "{ not json");
    }

    #[test]
    fn test_partial_config_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{"endpoint":"http://tts:6789/","voice":{"speed":4.0,"pitch":0.0},"concurrency":0,"retry":{"max_attempts":0}}"#,
        )
        .unwrap();

        let config = load_or_create(&path).unwrap();
        assert_eq!(config.endpoint, "http://tts:6789");
        assert_eq!(config.voice.speed, 1.5);
        assert_eq!(config.voice.pitch, 0.1);
        assert_eq!(config.voice.volume, 1.0);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.retry.base_delay_ms, 1000);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, "http://remote:1234"),
            (ENV_VOICE, "narrator"),
            (ENV_CONCURRENCY, "4"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.endpoint, "http://remote:1234");
        assert_eq!(config.voice.spk_name, "narrator");
        assert_eq!(config.concurrency, 4);

        config.apply_overrides_from(|key| (key == ENV_CONCURRENCY).then(|| "many".to_string()));
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn test_retry_policy_from_config() {
        let config = AppConfig::default();
        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
    }
}
