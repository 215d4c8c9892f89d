use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidatorError};

/// Runtime configuration of the validation job engine.
///
/// Loaded from a TOML file, every key can be overridden through a
/// `VALIDATOR_*` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Base directory for per-job working directories.
    pub working_dir: PathBuf,
    /// Maximum number of lines a chunk may hold before a file gets split.
    pub file_split_size: u64,
    /// Directory used by the file-system job storage.
    pub result_storage_dir: PathBuf,
    /// Keep per-job working directories after completion (debugging aid).
    pub preserve_temporary_files: bool,
    /// Capacity of the in-memory job tracking cache.
    pub job_tracking_capacity: u64,
    /// Idle eviction window of the job tracking cache, in seconds.
    pub job_tracking_idle_secs: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            working_dir: std::env::temp_dir().join("datapack-validator"),
            file_split_size: 10_000,
            result_storage_dir: std::env::temp_dir().join("datapack-validator-results"),
            preserve_temporary_files: false,
            job_tracking_capacity: 1000,
            job_tracking_idle_secs: 24 * 60 * 60,
        }
    }
}

impl ValidatorConfig {
    /// Loads the configuration, starting from defaults, then the optional
    /// TOML file, then `VALIDATOR_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidatorError::Configuration(format!("failed to read {}: {e}", path.display()))
        })?;
        toml::from_str(&content)
            .map_err(|e| ValidatorError::Configuration(format!("TOML parse error: {e}")))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("VALIDATOR_WORKING_DIR") {
            self.working_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("VALIDATOR_RESULT_STORAGE_DIR") {
            self.result_storage_dir = PathBuf::from(dir);
        }
        if let Ok(size) = std::env::var("VALIDATOR_FILE_SPLIT_SIZE") {
            if let Ok(size) = size.parse() {
                self.file_split_size = size;
            }
        }
        if let Ok(preserve) = std::env::var("VALIDATOR_PRESERVE_TEMPORARY_FILES") {
            self.preserve_temporary_files = matches!(preserve.as_str(), "1" | "true" | "yes");
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.file_split_size == 0 {
            return Err(ValidatorError::Configuration(
                "file_split_size must be greater than zero".to_string(),
            ));
        }
        if self.job_tracking_capacity == 0 {
            return Err(ValidatorError::Configuration(
                "job_tracking_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
