//! Sweep orchestration for the ingest pipeline.
//!
//! One sweep resolves the processing timezone, then runs auto-processing,
//! histology and QC in that order, stopping at the first failure.

mod command;
mod record;
mod runner;
mod stage;
pub mod timezone;

pub use command::{CommandStage, TIMEZONE_CHILD_ENV, TIMEZONE_PLACEHOLDER};
pub use record::{RecordError, write_record};
pub use runner::{IncrementRunner, StageTiming, SweepReport};
pub use stage::{AutoProcessor, Stage, StageFut, TimezoneResolver};
pub use timezone::{
    ClockWindowTimezone, FixedClock, FixedTimezone, SystemClock, UnsetTimezone,
    resolver_from_settings,
};
