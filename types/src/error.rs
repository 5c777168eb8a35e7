//! Error taxonomy for a sweep.
//!
//! `ConfigurationError` is fatal before any stage runs. `ProcessingError` is
//! raised by a stage collaborator and aborts the rest of the sweep.
//! `SweepError` carries either one through unchanged.

use std::path::PathBuf;

use thiserror::Error;

use crate::{InvalidTimezoneError, StageKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no configuration file found at {}", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to load configuration from {}: {message}", path.display())]
    Load { path: PathBuf, message: String },
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
    #[error("no processing timezone configured; set [timezone] zone or [[timezone.windows]]")]
    MissingTimezone,
    #[error("invalid processing timezone: {0}")]
    InvalidTimezone(#[from] InvalidTimezoneError),
    #[error("no timezone window covers local time {time} and no fallback is configured")]
    UncoveredTime { time: String },
}

impl ConfigurationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingError {
    #[error("{stage} could not be started: {message}")]
    Spawn { stage: StageKind, message: String },
    #[error("{stage} exited with {status}")]
    Exit {
        stage: StageKind,
        status: String,
        /// Last lines the stage wrote to stderr, oldest first.
        stderr_tail: Vec<String>,
    },
    #[error("{stage} failed: {message}")]
    Failed { stage: StageKind, message: String },
}

impl ProcessingError {
    pub fn failed(stage: StageKind, message: impl Into<String>) -> Self {
        Self::Failed {
            stage,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn stage(&self) -> StageKind {
        match self {
            Self::Spawn { stage, .. } | Self::Exit { stage, .. } | Self::Failed { stage, .. } => {
                *stage
            }
        }
    }
}

/// Why a sweep did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SweepError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Processing(#[from] ProcessingError),
}

impl SweepError {
    /// Process exit code reported to the scheduler.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Processing(_) => 1,
            Self::Configuration(_) => 2,
        }
    }
}
