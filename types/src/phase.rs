//! Per-run sweep state machine.
//!
//! ```text
//! NotStarted -> ResolvingTimezone -> AutoProcessing -> HistologyProcessing -> QcProcessing -> Completed
//!                      |                   |                   |                   |
//!                      +-------------------+-------------------+-------------------+--> Failed
//! ```
//!
//! `Completed` and `Failed` are terminal. There is no resume state: a new
//! sweep starts from `NotStarted` again.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepPhase {
    #[default]
    NotStarted,
    ResolvingTimezone,
    AutoProcessing,
    HistologyProcessing,
    QcProcessing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sweep phase {0} is terminal")]
pub struct PhaseError(pub SweepPhase);

impl SweepPhase {
    /// Success transition out of the current phase.
    pub fn advance(self) -> Result<Self, PhaseError> {
        match self {
            Self::NotStarted => Ok(Self::ResolvingTimezone),
            Self::ResolvingTimezone => Ok(Self::AutoProcessing),
            Self::AutoProcessing => Ok(Self::HistologyProcessing),
            Self::HistologyProcessing => Ok(Self::QcProcessing),
            Self::QcProcessing => Ok(Self::Completed),
            Self::Completed | Self::Failed => Err(PhaseError(self)),
        }
    }

    /// Failure transition; allowed from any non-terminal phase.
    pub fn fail(self) -> Result<Self, PhaseError> {
        if self.is_terminal() {
            Err(PhaseError(self))
        } else {
            Ok(Self::Failed)
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::ResolvingTimezone => "resolving_timezone",
            Self::AutoProcessing => "auto_processing",
            Self::HistologyProcessing => "histology_processing",
            Self::QcProcessing => "qc_processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SweepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
