//! The sweep orchestrator.
//!
//! # Sweep
//!
//! ```text
//! resolve timezone -> auto-processing(tz) -> histology -> QC -> [record]
//! ```
//!
//! Stages run strictly one after another. The first error ends the sweep and
//! is returned unchanged; later stages never start and nothing is rolled back.
//! The timezone is resolved once, before any stage, and reused for the run.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sweep_config::SweepConfig;
use sweep_types::{ProcessingTimezone, StageKind, SweepError, SweepPhase};
use tracing::Instrument;
use uuid::Uuid;

use crate::command::CommandStage;
use crate::record::write_record;
use crate::stage::{AutoProcessor, Stage, StageFut, TimezoneResolver};
use crate::timezone::{Clock, SystemClock, resolver_from_settings};

/// Wall-clock time one stage took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    pub stage: StageKind,
    pub elapsed_ms: u64,
}

impl StageTiming {
    fn new(stage: StageKind, elapsed: Duration) -> Self {
        Self {
            stage,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Summary of a completed sweep. There is no report for a failed one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub run_id: Uuid,
    pub timezone: ProcessingTimezone,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per stage, in execution order.
    pub stages: Vec<StageTiming>,
}

/// Tracks the phase of one sweep and logs every transition.
struct SweepProgress {
    phase: SweepPhase,
}

impl SweepProgress {
    fn new() -> Self {
        Self {
            phase: SweepPhase::NotStarted,
        }
    }

    fn advance(&mut self) {
        match self.phase.advance() {
            Ok(next) => {
                tracing::debug!(from = %self.phase, to = %next, "Sweep phase transition");
                self.phase = next;
            }
            Err(err) => tracing::error!("{err}"),
        }
    }

    fn fail(&mut self, err: SweepError) -> SweepError {
        tracing::error!(phase = %self.phase, error = %err, "Sweep failed");
        if let Ok(failed) = self.phase.fail() {
            self.phase = failed;
        }
        err
    }

    async fn run_stage(
        &mut self,
        stage: StageKind,
        fut: StageFut<'_>,
    ) -> Result<StageTiming, SweepError> {
        let span = tracing::info_span!("stage", stage = stage.as_str());
        let started = Instant::now();
        tracing::info!(parent: &span, "Starting {stage}");

        match fut.instrument(span.clone()).await {
            Ok(()) => {
                let timing = StageTiming::new(stage, started.elapsed());
                tracing::info!(
                    parent: &span,
                    elapsed_ms = timing.elapsed_ms,
                    "Finished {stage}"
                );
                Ok(timing)
            }
            Err(err) => Err(self.fail(err.into())),
        }
    }
}

pub struct IncrementRunner {
    resolver: Box<dyn TimezoneResolver>,
    autoprocess: Box<dyn AutoProcessor>,
    histology: Box<dyn Stage>,
    qc: Box<dyn Stage>,
    record_path: Option<PathBuf>,
}

impl IncrementRunner {
    pub fn new(
        resolver: Box<dyn TimezoneResolver>,
        autoprocess: Box<dyn AutoProcessor>,
        histology: Box<dyn Stage>,
        qc: Box<dyn Stage>,
    ) -> Self {
        Self {
            resolver,
            autoprocess,
            histology,
            qc,
            record_path: None,
        }
    }

    /// Runner wired to the configured stage programs and the system clock.
    #[must_use]
    pub fn from_config(config: &SweepConfig) -> Self {
        Self::from_config_with_clock(config, SystemClock)
    }

    pub fn from_config_with_clock<C>(config: &SweepConfig, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        let stages = &config.stages;
        let runner = Self::new(
            resolver_from_settings(&config.timezone, clock),
            Box::new(CommandStage::new(
                StageKind::AutoProcess,
                stages.autoprocess.clone(),
            )),
            Box::new(CommandStage::new(
                StageKind::Histology,
                stages.histology.clone(),
            )),
            Box::new(CommandStage::new(StageKind::Qc, stages.qc.clone())),
        );
        match &config.record_path {
            Some(path) => runner.with_record(path.clone()),
            None => runner,
        }
    }

    /// Write the report of each completed sweep to `path`.
    #[must_use]
    pub fn with_record(mut self, path: impl Into<PathBuf>) -> Self {
        self.record_path = Some(path.into());
        self
    }

    /// Run one sweep to completion or to its first failure.
    pub async fn run(&self) -> Result<SweepReport, SweepError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("sweep", %run_id);
        self.sweep(run_id).instrument(span).await
    }

    async fn sweep(&self, run_id: Uuid) -> Result<SweepReport, SweepError> {
        let started_at = Utc::now();
        let mut progress = SweepProgress::new();
        tracing::info!("Sweep started");

        progress.advance();
        let timezone = match self.resolver.resolve() {
            Ok(tz) => tz,
            Err(err) => return Err(progress.fail(err.into())),
        };
        tracing::info!(timezone = %timezone, "Resolved processing timezone");

        let mut stages = Vec::with_capacity(StageKind::ORDER.len());

        progress.advance();
        stages.push(
            progress
                .run_stage(
                    self.autoprocess.kind(),
                    self.autoprocess.process_new(&timezone),
                )
                .await?,
        );

        progress.advance();
        stages.push(
            progress
                .run_stage(self.histology.kind(), self.histology.run())
                .await?,
        );

        progress.advance();
        stages.push(progress.run_stage(self.qc.kind(), self.qc.run()).await?);

        progress.advance();
        let report = SweepReport {
            run_id,
            timezone,
            started_at,
            finished_at: Utc::now(),
            stages,
        };
        let total_ms: u64 = report.stages.iter().map(|s| s.elapsed_ms).sum();
        tracing::info!(total_ms, "Sweep completed");

        if let Some(path) = &self.record_path
            && let Err(err) = write_record(path, &report)
        {
            tracing::warn!(path = %path.display(), "Failed to write sweep record: {err}");
        }

        Ok(report)
    }
}
