//! Collaborator capabilities the sweep is built from.
//!
//! Each stage is a unit of work that can be run and may fail. The runner only
//! sees these traits, so the real subprocess-backed stages and test fakes are
//! interchangeable.

use std::future::Future;
use std::pin::Pin;

use sweep_types::{ConfigurationError, ProcessingError, ProcessingTimezone, StageKind};

/// Boxed stage future. Success carries no value; the runner does not consume one.
pub type StageFut<'a> = Pin<Box<dyn Future<Output = Result<(), ProcessingError>> + Send + 'a>>;

/// Supplies the processing timezone for a sweep.
pub trait TimezoneResolver: Send + Sync {
    fn resolve(&self) -> Result<ProcessingTimezone, ConfigurationError>;
}

/// Discovers and processes newly arrived sessions dated relative to `timezone`.
pub trait AutoProcessor: Send + Sync {
    fn kind(&self) -> StageKind {
        StageKind::AutoProcess
    }

    fn process_new<'a>(&'a self, timezone: &'a ProcessingTimezone) -> StageFut<'a>;
}

/// A stage that determines its own eligible work set and takes no input.
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    fn run(&self) -> StageFut<'_>;
}
