//! Termination signals abandon the sweep and take the running stage with it.

use std::process::Command;
use std::thread;
use std::time::Duration;

use crate::common::{FIXED_UTC, Facility, stage};

/// Auto-processing sleeps, then leaves a marker behind.
fn slow_facility() -> Facility {
    let facility = Facility::new();
    let auto = r#"
[stages.autoprocess]
program = "sh"
args = ["-c", "sleep 2; touch abandoned"]
"#;
    facility.write_config(&format!(
        "{FIXED_UTC}{auto}{}{}",
        stage("histology", "histology", 0),
        stage("qc", "qc", 0)
    ));
    facility
}

fn signal_mid_stage(signal: &str) -> (Facility, Option<i32>) {
    let facility = slow_facility();
    let mut sweep = facility.spawn_sweep();
    thread::sleep(Duration::from_millis(500));

    let sent = Command::new("kill")
        .args([signal, &sweep.id().to_string()])
        .status()
        .expect("run kill");
    assert!(sent.success());

    let status = sweep.wait().expect("wait for ingest-sweep");
    // Outlive the stage's sleep so a surviving stage would have finished.
    thread::sleep(Duration::from_secs(3));
    (facility, status.code())
}

#[test]
fn sigterm_kills_running_stage() {
    let (facility, code) = signal_mid_stage("-TERM");

    assert_eq!(code, Some(143));
    assert!(!facility.path().join("abandoned").exists());
    assert!(facility.journal().is_empty());
}

#[test]
fn sighup_kills_running_stage() {
    let (facility, code) = signal_mid_stage("-HUP");

    assert_eq!(code, Some(129));
    assert!(!facility.path().join("abandoned").exists());
}

#[test]
fn sigint_kills_running_stage() {
    let (facility, code) = signal_mid_stage("-INT");

    assert_eq!(code, Some(130));
    assert!(!facility.path().join("abandoned").exists());
}
