//! Shared infrastructure utilities for ingest-sweep.
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)

mod atomic_write;

pub use atomic_write::atomic_write;
