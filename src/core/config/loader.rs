#![allow(clippy::result_large_err)]

use super::WizardConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "paddock.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from workspace root (workspace/paddock.toml)
    /// Environment variables override config file values
    pub fn load_from_workspace(workspace_path: &Path) -> Result<WizardConfig, AppError> {
        let config_path = workspace_path.join(CONFIG_FILE_NAME);
        let config_file = Self::load_from_file(&config_path)?;

        let mut config = config_file.unwrap_or_default();
        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<WizardConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: WizardConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
            .with_code("WIZ-CFG-004")
        })?;

        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    /// Environment variables take precedence over config file values
    pub fn apply_env_overrides(config: &mut WizardConfig) {
        if let Ok(bucket) = env::var("PADDOCK_STORAGE_BUCKET") {
            config.storage.bucket = bucket;
        }

        if let Ok(raw) = env::var("PADDOCK_MAX_UPLOAD_BYTES") {
            match raw.trim().parse::<u64>() {
                Ok(value) => config.storage.max_upload_bytes = value,
                Err(_) => tracing::warn!(value = %raw, "ignoring unparsable PADDOCK_MAX_UPLOAD_BYTES"),
            }
        }

        if let Ok(raw) = env::var("PADDOCK_ORPHAN_TTL_HOURS") {
            match raw.trim().parse::<u64>() {
                Ok(value) => config.storage.orphan_ttl_hours = value,
                Err(_) => tracing::warn!(value = %raw, "ignoring unparsable PADDOCK_ORPHAN_TTL_HOURS"),
            }
        }
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "PADDOCK_STORAGE_BUCKET - Override the object storage bucket (default: horse-media)",
            "PADDOCK_MAX_UPLOAD_BYTES - Override the per-file upload limit in bytes (default: 52428800)",
            "PADDOCK_ORPHAN_TTL_HOURS - Override the age before unmigrated assets are reaped (default: 24)",
            "PADDOCK_LOG_LEVEL - Override the default log level (default: info)",
            "PADDOCK_LOG_DIR - Override the log directory (default: <workspace>/.paddock/logs)",
        ]
    }
}
