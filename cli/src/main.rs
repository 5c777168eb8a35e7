//! ingest-sweep - run one ingest sweep and exit.
//!
//! # Flow
//!
//! ```text
//! main() -> load config -> init_tracing() -> IncrementRunner::from_config()
//!                                                   |
//!                                                   v
//!                              run() raced against shutdown signals
//! ```
//!
//! Invoked once per scheduler tick. The exit status tells the scheduler how
//! the sweep ended: 0 completed, 1 a stage failed, 2 configuration was
//! unusable. SIGHUP, SIGINT and SIGTERM abandon the sweep and exit with
//! 128 plus the signal number.

use std::{
    fs::{self, OpenOptions},
    future::pending,
    io,
    path::PathBuf,
    process::ExitCode,
    sync::Mutex,
};

use anyhow::{Context, Result};
use sweep_config::{LoggingConfig, SweepConfig, config_dir, config_path};
use sweep_core::IncrementRunner;
use sweep_types::{ConfigurationError, SweepError};
#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_NAME: &str = "ingest-sweep.log";
const EXIT_HANGUP: u8 = 129;
const EXIT_INTERRUPTED: u8 = 130;
const EXIT_TERMINATED: u8 = 143;

fn init_tracing(logging: &LoggingConfig) -> Result<Option<PathBuf>> {
    let mut warnings = Vec::new();
    let env_filter = env_filter(logging, &mut warnings);
    let (log_file, open_warnings) = open_log_file(logging);
    warnings.extend(open_warnings);

    let (log_path, file_layer) = match log_file {
        Some((path, file)) => (
            Some(path),
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(env_filter)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(path) = &log_path {
        tracing::debug!(path = %path.display(), "Logging initialized");
    }
    for warning in warnings {
        tracing::warn!("{warning}");
    }
    Ok(log_path)
}

/// `RUST_LOG`, else `[logging] filter`, else `info`.
fn env_filter(logging: &LoggingConfig, warnings: &mut Vec<String>) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    if let Some(directive) = logging.filter.as_deref() {
        match EnvFilter::try_new(directive) {
            Ok(filter) => return filter,
            Err(e) => warnings.push(format!(
                "Ignoring invalid [logging] filter {directive:?}: {e}"
            )),
        }
    }
    EnvFilter::new("info")
}

fn open_log_file(logging: &LoggingConfig) -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates(logging) {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates(logging: &LoggingConfig) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(dir) = &logging.dir {
        candidates.push(dir.join(LOG_FILE_NAME));
    }

    // ~/.ingest-sweep/logs/ingest-sweep.log
    if let Some(dir) = config_dir() {
        candidates.push(dir.join("logs").join(LOG_FILE_NAME));
    }

    // ./.ingest-sweep/logs/ingest-sweep.log for hosts without a home directory
    candidates.push(PathBuf::from(".ingest-sweep").join("logs").join(LOG_FILE_NAME));

    candidates
}

fn load_config() -> Result<(PathBuf, SweepConfig), ConfigurationError> {
    let path = config_path().unwrap_or_else(|| PathBuf::from("config.toml"));
    match SweepConfig::load() {
        Ok(Some(config)) => Ok((path, config)),
        Ok(None) => Err(ConfigurationError::NotFound { path }),
        Err(err) => Err(err.into()),
    }
}

/// Signals that abandon a running sweep.
///
/// Registered before the first stage is spawned. Dropping the sweep future
/// kills the running stage's process group.
#[cfg(unix)]
struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
    hangup: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Name and exit code of the first signal received.
    async fn recv(&mut self) -> (&'static str, u8) {
        tokio::select! {
            Some(()) = self.interrupt.recv() => ("SIGINT", EXIT_INTERRUPTED),
            Some(()) = self.terminate.recv() => ("SIGTERM", EXIT_TERMINATED),
            Some(()) = self.hangup.recv() => ("SIGHUP", EXIT_HANGUP),
            else => pending().await,
        }
    }
}

#[cfg(not(unix))]
struct ShutdownSignals;

#[cfg(not(unix))]
impl ShutdownSignals {
    fn install() -> io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> (&'static str, u8) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => ("Ctrl-C", EXIT_INTERRUPTED),
            Err(e) => {
                tracing::warn!("Failed to listen for Ctrl-C: {e}");
                pending().await
            }
        }
    }
}

/// Never resolves when no handler could be installed.
async fn shutdown(signals: Option<&mut ShutdownSignals>) -> (&'static str, u8) {
    match signals {
        Some(signals) => signals.recv().await,
        None => pending().await,
    }
}

fn failure(err: &SweepError) -> ExitCode {
    match err {
        SweepError::Processing(inner) => {
            tracing::error!(stage = inner.stage().as_str(), "{err}");
        }
        SweepError::Configuration(_) => tracing::error!("{err}"),
    }
    eprintln!("Error: {err}");
    ExitCode::from(err.exit_code())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let mut signals = ShutdownSignals::install();
    let loaded = load_config();

    let logging = loaded
        .as_ref()
        .map(|(_, c)| c.logging.clone())
        .unwrap_or_default();
    if let Err(e) = init_tracing(&logging) {
        eprintln!("Warning: {e:#}");
    }
    if let Err(e) = &signals {
        tracing::warn!("Failed to install signal handlers: {e}");
    }

    // Overrides are applied after tracing is up so they reach the log.
    let config = loaded.and_then(|(path, config)| {
        config
            .with_env_overrides(&path)
            .map_err(ConfigurationError::from)
    });
    let config = match config {
        Ok(config) => config,
        Err(err) => return failure(&err.into()),
    };

    let runner = IncrementRunner::from_config(&config);
    tokio::select! {
        result = runner.run() => match result {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => failure(&err),
        },
        (name, code) = shutdown(signals.as_mut().ok()) => {
            tracing::warn!("Received {name}; abandoning sweep");
            ExitCode::from(code)
        }
    }
}
