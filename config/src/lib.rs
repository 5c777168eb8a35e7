//! Configuration loading for ingest-sweep.
//!
//! The config file lives at `$INGEST_SWEEP_CONFIG` or
//! `~/.ingest-sweep/config.toml`. It is read once at startup, validated into
//! [`SweepConfig`], and passed explicitly to everything that needs it.
//!
//! ```toml
//! [timezone]
//! fallback = "other"
//!
//! [[timezone.windows]]
//! until = "08:30"
//! zone = "European"
//!
//! [stages.autoprocess]
//! program = "python"
//! args = ["-m", "pipeline.autoprocess", "--timezone", "{timezone}"]
//!
//! [stages.histology]
//! program = "python"
//! args = ["-m", "pipeline.histology"]
//!
//! [stages.qc]
//! program = "python"
//! args = ["-m", "pipeline.qc"]
//! ```

mod env;
mod raw;
mod settings;

use std::path::{Path, PathBuf};
use std::{env as std_env, fs, io};

use sweep_types::{ConfigurationError, ProcessingTimezone};

pub use env::{expand_env_vars, expand_path};
pub use settings::{
    ClockWindows, LoggingConfig, StageCommand, StagesConfig, TimezoneSettings, TimezoneWindow,
};

use raw::RawConfig;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "INGEST_SWEEP_CONFIG";
/// Pins the processing timezone, replacing any `[timezone]` settings.
pub const TIMEZONE_ENV: &str = "INGEST_SWEEP_TIMEZONE";

const CONFIG_DIR_NAME: &str = ".ingest-sweep";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config at {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

impl From<ConfigError> for ConfigurationError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Read { path, source } => ConfigurationError::Load {
                path,
                message: source.to_string(),
            },
            ConfigError::Parse { path, source } => ConfigurationError::Load {
                path,
                message: source.to_string(),
            },
            ConfigError::Invalid { path, message } => {
                ConfigurationError::invalid(format!("{}: {message}", path.display()))
            }
        }
    }
}

/// Fully resolved sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    pub timezone: TimezoneSettings,
    pub stages: StagesConfig,
    /// Where the report of a completed sweep is written, if anywhere.
    pub record_path: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl SweepConfig {
    /// Load the file at the default location. `Ok(None)` when no file exists.
    ///
    /// Env overrides are not applied; see [`SweepConfig::with_env_overrides`].
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    /// Parse and validate TOML content. `path` is only used in errors.
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let invalid = |message: String| ConfigError::Invalid {
            path: path.to_path_buf(),
            message,
        };

        let timezone = raw
            .timezone
            .unwrap_or_default()
            .resolve()
            .map_err(invalid)?;
        let stages = raw.stages.unwrap_or_default().resolve().map_err(invalid)?;
        let record_path = raw.record.unwrap_or_default().resolve();
        let logging = raw.logging.unwrap_or_default().resolve();

        Ok(Self {
            timezone,
            stages,
            record_path,
            logging,
        })
    }

    /// Apply `$INGEST_SWEEP_TIMEZONE`. `path` is only used in errors.
    pub fn with_env_overrides(self, path: &Path) -> Result<Self, ConfigError> {
        let pinned = std_env::var(TIMEZONE_ENV).ok();
        self.with_timezone_override(pinned.as_deref(), path)
    }

    /// Replace the timezone settings with a fixed zone when `value` is set.
    pub fn with_timezone_override(
        mut self,
        value: Option<&str>,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        let Some(value) = value else {
            return Ok(self);
        };
        let zone = ProcessingTimezone::new(value).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            message: format!("{TIMEZONE_ENV}: {e}"),
        })?;
        tracing::info!(timezone = %zone, "Timezone pinned by {TIMEZONE_ENV}");
        self.timezone = TimezoneSettings::Fixed(zone);
        Ok(self)
    }
}

/// `$INGEST_SWEEP_CONFIG`, else `~/.ingest-sweep/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std_env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return Some(expand_path(path.trim()));
    }
    config_dir().map(|dir| dir.join("config.toml"))
}

/// `~/.ingest-sweep`, the default home for config, logs and records.
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME))
}
