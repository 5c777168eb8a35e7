//! Configuration failures surface before any stage runs.

use crate::common::{FIXED_UTC, Facility, exit_code, stage, stages, stderr};

#[test]
fn missing_config_file_exits_2() {
    let facility = Facility::new();

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(2));
    assert!(
        stderr(&output).contains("no configuration file found"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn malformed_toml_exits_2() {
    let facility = Facility::new();
    facility.write_config("[timezone\nzone = ");

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(2));
    assert!(facility.journal().is_empty());
}

#[test]
fn missing_stage_table_exits_2() {
    let facility = Facility::new();
    let config = format!(
        "{FIXED_UTC}{}{}",
        stage("autoprocess", "autoprocess", 0),
        stage("histology", "histology", 0)
    );
    facility.write_config(&config);

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(2));
    assert!(stderr(&output).contains("stages.qc"), "{}", stderr(&output));
    assert!(facility.journal().is_empty());
}

#[test]
fn invalid_timezone_override_exits_2() {
    let facility = Facility::new();
    facility.write_config(&format!("{FIXED_UTC}{}", stages(0, 0, 0)));

    let output = facility.sweep_with_env(&[("INGEST_SWEEP_TIMEZONE", "New York")]);

    assert_eq!(exit_code(&output), Some(2));
    assert!(facility.journal().is_empty());
}

#[test]
fn unknown_program_exits_1() {
    let facility = Facility::new();
    let config = format!(
        "{FIXED_UTC}{}{}{}",
        "[stages.autoprocess]\nprogram = \"/nonexistent/autoprocess\"\n",
        stage("histology", "histology", 0),
        stage("qc", "qc", 0)
    );
    facility.write_config(&config);

    let output = facility.sweep();

    assert_eq!(exit_code(&output), Some(1));
    assert!(facility.journal().is_empty());
}
