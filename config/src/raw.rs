//! Raw TOML shapes. Private to this crate; resolved into `settings` types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveTime;
use serde::Deserialize;
use sweep_types::{ProcessingTimezone, StageKind};

use crate::env::{expand_env_vars, expand_path};
use crate::settings::{
    ClockWindows, LoggingConfig, StageCommand, StagesConfig, TimezoneSettings, TimezoneWindow,
};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawConfig {
    pub(crate) timezone: Option<RawTimezone>,
    pub(crate) stages: Option<RawStages>,
    pub(crate) record: Option<RawRecord>,
    pub(crate) logging: Option<RawLogging>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawTimezone {
    zone: Option<String>,
    #[serde(default)]
    windows: Vec<RawWindow>,
    fallback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawWindow {
    until: String,
    zone: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawStages {
    autoprocess: Option<RawStage>,
    histology: Option<RawStage>,
    qc: Option<RawStage>,
}

#[derive(Debug, Deserialize)]
struct RawStage {
    program: String,
    #[serde(default)]
    args: Vec<String>,
    working_dir: Option<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawRecord {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawLogging {
    dir: Option<String>,
    filter: Option<String>,
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime, String> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| format!("invalid window time {raw:?}: expected HH:MM or HH:MM:SS"))
}

fn parse_zone(field: &str, raw: &str) -> Result<ProcessingTimezone, String> {
    ProcessingTimezone::new(raw).map_err(|e| format!("{field}: {e}"))
}

impl RawTimezone {
    pub(crate) fn resolve(self) -> Result<TimezoneSettings, String> {
        if let Some(zone) = self.zone {
            if !self.windows.is_empty() {
                return Err("[timezone] sets both zone and windows; choose one".to_string());
            }
            return parse_zone("timezone.zone", &zone).map(TimezoneSettings::Fixed);
        }

        if self.windows.is_empty() {
            if self.fallback.is_some() {
                return Err("timezone.fallback requires [[timezone.windows]]".to_string());
            }
            return Ok(TimezoneSettings::Unset);
        }

        let windows = self
            .windows
            .into_iter()
            .map(|w| {
                Ok(TimezoneWindow {
                    until: parse_time_of_day(&w.until)?,
                    zone: parse_zone("timezone.windows.zone", &w.zone)?,
                })
            })
            .collect::<Result<Vec<_>, String>>()?;
        let fallback = self
            .fallback
            .as_deref()
            .map(|f| parse_zone("timezone.fallback", f))
            .transpose()?;

        ClockWindows::new(windows, fallback).map(TimezoneSettings::Windows)
    }
}

impl RawStage {
    fn resolve(self, kind: StageKind) -> Result<StageCommand, String> {
        let program = expand_env_vars(self.program.trim());
        if program.is_empty() {
            return Err(format!("stages.{}.program must not be empty", kind.as_str()));
        }
        let args = self.args.iter().map(|a| expand_env_vars(a)).collect();
        let mut command = StageCommand::new(program, args);
        if let Some(dir) = self.working_dir.as_deref() {
            command = command.with_working_dir(expand_path(dir));
        }
        for (key, value) in self.env {
            command = command.with_env(key, expand_env_vars(&value));
        }
        Ok(command)
    }
}

impl RawStages {
    pub(crate) fn resolve(self) -> Result<StagesConfig, String> {
        fn required(raw: Option<RawStage>, kind: StageKind) -> Result<StageCommand, String> {
            raw.ok_or_else(|| format!("missing [stages.{}] table", kind.as_str()))?
                .resolve(kind)
        }

        Ok(StagesConfig {
            autoprocess: required(self.autoprocess, StageKind::AutoProcess)?,
            histology: required(self.histology, StageKind::Histology)?,
            qc: required(self.qc, StageKind::Qc)?,
        })
    }
}

impl RawRecord {
    pub(crate) fn resolve(self) -> Option<PathBuf> {
        self.path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(expand_path)
    }
}

impl RawLogging {
    pub(crate) fn resolve(self) -> LoggingConfig {
        LoggingConfig {
            dir: self
                .dir
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(expand_path),
            filter: self.filter.filter(|f| !f.trim().is_empty()),
        }
    }
}
