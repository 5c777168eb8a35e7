//! Shared test utilities and fixtures
//!
//! Each [`Facility`] is a scratch directory holding a config file, a journal
//! that the stage commands append to, and a home directory for the binary.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

use tempfile::TempDir;

pub struct Facility {
    dir: TempDir,
}

impl Facility {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create facility dir");
        fs::create_dir_all(dir.path().join("home")).expect("create home dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    pub fn journal_path(&self) -> PathBuf {
        self.path().join("journal.txt")
    }

    pub fn record_path(&self) -> PathBuf {
        self.path().join("state").join("last_sweep.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.path().join("logs")
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.config_path(), content).expect("write config");
    }

    /// Journal lines in the order the stages wrote them.
    pub fn journal(&self) -> Vec<String> {
        match fs::read_to_string(self.journal_path()) {
            Ok(text) => text.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Run the binary once against this facility's config.
    pub fn sweep(&self) -> Output {
        self.sweep_with_env(&[])
    }

    pub fn sweep_with_env(&self, env: &[(&str, &str)]) -> Output {
        let mut cmd = self.command();
        for (key, value) in env {
            cmd.env(key, value);
        }
        cmd.output().expect("run ingest-sweep")
    }

    /// Start the binary without waiting for it.
    pub fn spawn_sweep(&self) -> Child {
        self.command()
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn ingest-sweep")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ingest-sweep"));
        cmd.env("INGEST_SWEEP_CONFIG", self.config_path())
            .env("HOME", self.path().join("home"))
            .env("JOURNAL", self.journal_path())
            .env_remove("INGEST_SWEEP_TIMEZONE")
            .env_remove("RUST_LOG")
            .current_dir(self.path());
        cmd
    }
}

/// A stage table whose command appends `line` to the journal and exits with `code`.
pub fn stage(name: &str, line: &str, code: i32) -> String {
    format!(
        r#"
[stages.{name}]
program = "sh"
args = ["-c", "echo \"$1\" >> \"$JOURNAL\"; exit {code}", "sh", "{line}"]
"#
    )
}

/// All three stages, with auto-processing echoing the timezone it received.
pub fn stages(auto_code: i32, histology_code: i32, qc_code: i32) -> String {
    [
        stage("autoprocess", "autoprocess {timezone}", auto_code),
        stage("histology", "histology", histology_code),
        stage("qc", "qc", qc_code),
    ]
    .concat()
}

pub const FIXED_UTC: &str = "[timezone]\nzone = \"UTC\"\n";

pub fn exit_code(output: &Output) -> Option<i32> {
    output.status.code()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
