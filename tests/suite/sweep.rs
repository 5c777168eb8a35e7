//! End-to-end sweeps driven by shell stage commands.

use std::fs;

use crate::common::{FIXED_UTC, Facility, exit_code, stage, stages, stderr};

#[test]
fn utc_sweep_runs_stages_in_order() {
    let facility = Facility::new();
    facility.write_config(&format!("{FIXED_UTC}{}", stages(0, 0, 0)));

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(0), "{}", stderr(&output));
    assert_eq!(
        facility.journal(),
        vec!["autoprocess UTC", "histology", "qc"]
    );
}

#[test]
fn auto_processing_failure_stops_the_sweep() {
    let facility = Facility::new();
    facility.write_config(&format!("{FIXED_UTC}{}", stages(4, 0, 0)));

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(1));
    assert_eq!(facility.journal(), vec!["autoprocess UTC"]);
    assert!(stderr(&output).contains("auto-processing"), "{}", stderr(&output));
}

#[test]
fn histology_failure_skips_qc() {
    let facility = Facility::new();
    facility.write_config(&format!("{FIXED_UTC}{}", stages(0, 1, 0)));

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(1));
    assert_eq!(facility.journal(), vec!["autoprocess UTC", "histology"]);
}

#[test]
fn missing_timezone_runs_nothing() {
    let facility = Facility::new();
    facility.write_config(&stages(0, 0, 0));

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(2));
    assert!(facility.journal().is_empty());
    assert!(stderr(&output).contains("no processing timezone"), "{}", stderr(&output));
}

#[test]
fn uncovered_time_runs_nothing() {
    let facility = Facility::new();
    // A single window ending one second after midnight leaves almost the
    // whole day uncovered.
    let timezone = "[[timezone.windows]]\nuntil = \"00:00:01\"\nzone = \"European\"\n";
    facility.write_config(&format!("{timezone}{}", stages(0, 0, 0)));

    let output = facility.sweep();

    // Started within the first second of the day: the window matched.
    if exit_code(&output) == Some(0) {
        return;
    }
    assert_eq!(exit_code(&output), Some(2));
    assert!(facility.journal().is_empty());
}

#[test]
fn timezone_env_pins_zone() {
    let facility = Facility::new();
    facility.write_config(&format!("{FIXED_UTC}{}", stages(0, 0, 0)));

    let output = facility.sweep_with_env(&[("INGEST_SWEEP_TIMEZONE", "PST")]);

    assert_eq!(exit_code(&output), Some(0), "{}", stderr(&output));
    assert_eq!(
        facility.journal(),
        vec!["autoprocess PST", "histology", "qc"]
    );
}

#[test]
fn completed_sweep_writes_record() {
    let facility = Facility::new();
    let record = format!("[record]\npath = \"{}\"\n", facility.record_path().display());
    facility.write_config(&format!("{FIXED_UTC}{record}{}", stages(0, 0, 0)));

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(0), "{}", stderr(&output));
    let text = fs::read_to_string(facility.record_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["timezone"], "UTC");
    let stages: Vec<&str> = value["stages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["stage"].as_str().unwrap())
        .collect();
    assert_eq!(stages, vec!["autoprocess", "histology", "qc"]);
}

#[test]
fn failed_sweep_writes_no_record() {
    let facility = Facility::new();
    let record = format!("[record]\npath = \"{}\"\n", facility.record_path().display());
    facility.write_config(&format!("{FIXED_UTC}{record}{}", stages(0, 0, 2)));

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(1));
    assert!(!facility.record_path().exists());
}

#[test]
fn stage_output_reaches_the_log_file() {
    let facility = Facility::new();
    let logging = format!("[logging]\ndir = \"{}\"\n", facility.log_dir().display());
    let histology = r#"
[stages.histology]
program = "sh"
args = ["-c", "echo stained 12 slides"]
"#;
    let config = format!(
        "{FIXED_UTC}{logging}{}{histology}{}",
        stage("autoprocess", "autoprocess", 0),
        stage("qc", "qc", 0),
    );
    facility.write_config(&config);

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(0), "{}", stderr(&output));
    let log = fs::read_to_string(facility.log_dir().join("ingest-sweep.log")).unwrap();
    assert!(log.contains("stained 12 slides"), "{log}");
    assert!(log.contains("Sweep completed"), "{log}");
}

#[test]
fn pinned_timezone_is_logged() {
    let facility = Facility::new();
    let logging = format!("[logging]\ndir = \"{}\"\n", facility.log_dir().display());
    facility.write_config(&format!("{FIXED_UTC}{logging}{}", stages(0, 0, 0)));

    let output = facility.sweep_with_env(&[("INGEST_SWEEP_TIMEZONE", "EST")]);

    assert_eq!(exit_code(&output), Some(0), "{}", stderr(&output));
    let log = fs::read_to_string(facility.log_dir().join("ingest-sweep.log")).unwrap();
    assert!(log.contains("Timezone pinned by INGEST_SWEEP_TIMEZONE"), "{log}");
    assert_eq!(
        facility.journal(),
        vec!["autoprocess EST", "histology", "qc"]
    );
}
