//! Integration test modules

#[cfg(unix)]
mod config;
#[cfg(unix)]
mod signals;
#[cfg(unix)]
mod sweep;
