#![allow(clippy::result_large_err)]

use super::WizardConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::collections::HashSet;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &WizardConfig) -> Result<(), AppError> {
        let storage = &config.storage;
        if storage.bucket.trim().is_empty() {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "storage.bucket cannot be empty",
            )
            .with_code("WIZ-CFG-001"));
        }

        if storage.max_upload_bytes == 0 {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "storage.max_upload_bytes must be greater than zero",
            )
            .with_code("WIZ-CFG-001"));
        }

        if storage
            .allowed_mime_types
            .iter()
            .all(|mime| mime.trim().is_empty())
        {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "storage.allowed_mime_types must list at least one type",
            )
            .with_code("WIZ-CFG-001"));
        }

        if storage.orphan_ttl_hours == 0 {
            return Err(AppError::new(
                ErrorCategory::ConfigError,
                "storage.orphan_ttl_hours must be greater than zero",
            )
            .with_code("WIZ-CFG-002"));
        }

        let mut seen = HashSet::new();
        for name in config.tables.names() {
            if name.trim().is_empty() {
                return Err(AppError::new(
                    ErrorCategory::ConfigError,
                    "table names cannot be empty",
                )
                .with_code("WIZ-CFG-003"));
            }
            if !seen.insert(name) {
                return Err(AppError::new(
                    ErrorCategory::ConfigError,
                    format!("table name '{}' is used more than once", name),
                )
                .with_code("WIZ-CFG-003"));
            }
        }

        Ok(())
    }
}
