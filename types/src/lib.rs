//! Core domain types for ingest-sweep.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the sweep.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod error;
mod phase;
mod stage;
mod timezone;

pub use error::{ConfigurationError, ProcessingError, SweepError};
pub use phase::{PhaseError, SweepPhase};
pub use stage::StageKind;
pub use timezone::{InvalidTimezoneError, ProcessingTimezone};
