//! Resolved configuration types.
//!
//! These represent fully-validated settings. The raw TOML structs live in
//! `raw` and are resolved into these at the parse boundary.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveTime;
use sweep_types::ProcessingTimezone;

/// How the processing timezone is determined for a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimezoneSettings {
    /// No `[timezone]` table. Resolution fails when the sweep starts.
    Unset,
    /// The same zone every run.
    Fixed(ProcessingTimezone),
    /// Zone chosen from the local wall clock at the start of the run.
    Windows(ClockWindows),
}

/// Ascending time-of-day windows mapped to timezone labels.
///
/// Invariant: `windows` is non-empty and strictly ascending by `until`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockWindows {
    windows: Vec<TimezoneWindow>,
    fallback: Option<ProcessingTimezone>,
}

impl ClockWindows {
    pub(crate) fn new(
        windows: Vec<TimezoneWindow>,
        fallback: Option<ProcessingTimezone>,
    ) -> Result<Self, String> {
        if windows.is_empty() {
            return Err("[[timezone.windows]] must contain at least one window".to_string());
        }
        for pair in windows.windows(2) {
            if pair[1].until <= pair[0].until {
                return Err(format!(
                    "timezone windows must be strictly ascending: {} is not after {}",
                    pair[1].until.format("%H:%M:%S"),
                    pair[0].until.format("%H:%M:%S")
                ));
            }
        }
        Ok(Self { windows, fallback })
    }

    #[must_use]
    pub fn windows(&self) -> &[TimezoneWindow] {
        &self.windows
    }

    #[must_use]
    pub fn fallback(&self) -> Option<&ProcessingTimezone> {
        self.fallback.as_ref()
    }
}

/// Local times strictly before `until` (and not claimed by an earlier window) map to `zone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimezoneWindow {
    pub until: NaiveTime,
    pub zone: ProcessingTimezone,
}

/// An external program that performs one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCommand {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl StageCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments as configured. `{timezone}` placeholders are left in place.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    #[must_use]
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }
}

/// One command per stage. All three are required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagesConfig {
    pub autoprocess: StageCommand,
    pub histology: StageCommand,
    pub qc: StageCommand,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Directory for `ingest-sweep.log`. Falls back to the config directory.
    pub dir: Option<PathBuf>,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}
