//! Stages backed by external programs.
//!
//! Each configured program runs to completion as a child process. Its output
//! is forwarded line by line into `tracing` under the stage span, and the tail
//! of stderr is kept for the error if it exits unsuccessfully.
//!
//! The stage is over when its process exits. Output is read for a short grace
//! period after that; anything a detached grandchild writes later is dropped,
//! and the grandchild itself is left running.

use std::collections::VecDeque;
use std::process::Stdio;
use std::time::Duration;

use sweep_config::StageCommand;
use sweep_types::{ProcessingError, ProcessingTimezone, StageKind};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::stage::{AutoProcessor, Stage, StageFut};

/// Replaced by the resolved timezone in auto-processing arguments.
pub const TIMEZONE_PLACEHOLDER: &str = "{timezone}";
/// Set in the auto-processing child environment.
pub const TIMEZONE_CHILD_ENV: &str = "INGEST_SWEEP_TIMEZONE";

const STDERR_TAIL_LINES: usize = 20;
/// How long output is still read after the stage process has exited.
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Kills a child process (and its process group on Unix) on drop.
///
/// Armed from spawn until the child has been waited on, so a dropped sweep
/// future does not leave a stage running in the background.
struct ChildGuard {
    child: Child,
    armed: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self { child, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            // SAFETY: killpg has no memory-safety preconditions.
            let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
            if rc == -1 {
                let _ = self.child.start_kill();
            }
        }
        #[cfg(not(unix))]
        {
            let _ = self.child.start_kill();
        }
        let _ = self.child.try_wait();
    }
}

#[derive(Debug, Clone)]
pub struct CommandStage {
    kind: StageKind,
    command: StageCommand,
}

impl CommandStage {
    #[must_use]
    pub fn new(kind: StageKind, command: StageCommand) -> Self {
        Self { kind, command }
    }

    fn build(&self, timezone: Option<&ProcessingTimezone>) -> Command {
        let mut cmd = Command::new(self.command.program());
        match timezone {
            Some(tz) => {
                cmd.args(
                    self.command
                        .args()
                        .iter()
                        .map(|arg| arg.replace(TIMEZONE_PLACEHOLDER, tz.as_str())),
                );
            }
            None => {
                cmd.args(self.command.args());
            }
        }
        if let Some(dir) = self.command.working_dir() {
            cmd.current_dir(dir);
        }
        cmd.envs(self.command.env());
        if let Some(tz) = timezone {
            cmd.env(TIMEZONE_CHILD_ENV, tz.as_str());
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }

    async fn execute(&self, timezone: Option<&ProcessingTimezone>) -> Result<(), ProcessingError> {
        let stage = self.kind;
        let program = self.command.program();
        let child = self
            .build(timezone)
            .spawn()
            .map_err(|e| ProcessingError::Spawn {
                stage,
                message: format!("{program}: {e}"),
            })?;
        let mut guard = ChildGuard::new(child);
        tracing::debug!(
            stage = stage.as_str(),
            program,
            pid = ?guard.child.id(),
            "Stage process spawned"
        );

        let stdout = guard.child.stdout.take();
        let stderr = guard.child.stderr.take();
        let readers = async {
            let ((), tail) = tokio::join!(
                forward_stdout(stage, stdout),
                collect_stderr(stage, stderr)
            );
            tail
        };
        tokio::pin!(readers);

        let (status, stderr_tail) = tokio::select! {
            tail = &mut readers => (guard.child.wait().await, tail),
            status = guard.child.wait() => {
                // A background grandchild may still hold the pipes open.
                let tail = match tokio::time::timeout(PIPE_DRAIN_GRACE, &mut readers).await {
                    Ok(tail) => tail,
                    Err(_) => {
                        tracing::warn!(
                            stage = stage.as_str(),
                            "Stage exited but its output pipes stayed open; \
                             no longer reading them"
                        );
                        VecDeque::new()
                    }
                };
                (status, tail)
            }
        };
        guard.disarm();

        let status = status.map_err(|e| {
            ProcessingError::failed(stage, format!("waiting for {program} failed: {e}"))
        })?;
        if status.success() {
            return Ok(());
        }
        Err(ProcessingError::Exit {
            stage,
            status: status.to_string(),
            stderr_tail: stderr_tail.into(),
        })
    }
}

async fn forward_stdout<R>(stage: StageKind, stream: Option<R>)
where
    R: AsyncRead + Unpin,
{
    let Some(stream) = stream else {
        return;
    };
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => tracing::info!(stage = stage.as_str(), "{}", line.trim_end()),
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(stage = stage.as_str(), "Failed to read stage stdout: {e}");
                break;
            }
        }
    }
}

async fn collect_stderr<R>(stage: StageKind, stream: Option<R>) -> VecDeque<String>
where
    R: AsyncRead + Unpin,
{
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let Some(stream) = stream else {
        return tail;
    };
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim_end().to_string();
                tracing::warn!(stage = stage.as_str(), "{line}");
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(stage = stage.as_str(), "Failed to read stage stderr: {e}");
                break;
            }
        }
    }
    tail
}

impl Stage for CommandStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    fn run(&self) -> StageFut<'_> {
        Box::pin(self.execute(None))
    }
}

impl AutoProcessor for CommandStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    fn process_new<'a>(&'a self, timezone: &'a ProcessingTimezone) -> StageFut<'a> {
        Box::pin(self.execute(Some(timezone)))
    }
}
