use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three processing stages of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Discovers and processes newly arrived sessions.
    #[serde(rename = "autoprocess")]
    AutoProcess,
    Histology,
    Qc,
}

impl StageKind {
    /// Fixed execution order within a sweep.
    pub const ORDER: [StageKind; 3] = [StageKind::AutoProcess, StageKind::Histology, StageKind::Qc];

    /// Stable identifier used in config tables and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StageKind::AutoProcess => "autoprocess",
            StageKind::Histology => "histology",
            StageKind::Qc => "qc",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            StageKind::AutoProcess => "auto-processing",
            StageKind::Histology => "histology processing",
            StageKind::Qc => "QC processing",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
