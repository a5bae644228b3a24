use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn manifest(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../configs")
        .join(relative)
}

fn size_command() -> Command {
    let mut cmd = Command::cargo_bin("evtol-size").expect("binary built");
    cmd.arg("--vehicle")
        .arg(manifest("vehicles/multirotor.toml"))
        .arg("--mission")
        .arg(manifest("missions/hop_50km.toml"))
        .arg("--fidelity")
        .arg(manifest("fidelity/multirotor.toml"));
    cmd
}

#[test]
fn size_prints_breakdown() {
    size_command()
        .assert()
        .success()
        .stdout(predicate::str::contains("Reference Multirotor"))
        .stdout(predicate::str::contains("battery"))
        .stdout(predicate::str::contains("converged"));
}

#[test]
fn size_appends_csv_and_writes_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let csv = dir.path().join("runs.csv");
    let json = dir.path().join("summary.json");
    for _ in 0..2 {
        size_command()
            .arg("--csv")
            .arg(&csv)
            .arg("--json")
            .arg(&json)
            .assert()
            .success();
    }
    let contents = std::fs::read_to_string(&csv).expect("csv written");
    assert_eq!(contents.lines().count(), 3);
    assert!(contents.starts_with("vehicle,converged,Weight|takeoff [kg]"));
    let summary = std::fs::read_to_string(&json).expect("json written");
    assert!(summary.contains("\"weight_type\""));
}

#[test]
fn bad_manifest_path_fails() {
    Command::cargo_bin("evtol-size")
        .expect("binary built")
        .arg("--vehicle")
        .arg(manifest("vehicles/missing.toml"))
        .arg("--mission")
        .arg(manifest("missions/hop_50km.toml"))
        .arg("--fidelity")
        .arg(manifest("fidelity/multirotor.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read manifest"));
}

#[test]
fn sweep_writes_csv_to_stdout() {
    Command::cargo_bin("evtol-sweep")
        .expect("binary built")
        .arg("--vehicle")
        .arg(manifest("vehicles/multirotor.toml"))
        .arg("--mission")
        .arg(manifest("missions/hop_50km.toml"))
        .arg("--fidelity")
        .arg(manifest("fidelity/multirotor.toml"))
        .arg("--problem")
        .arg(manifest("problems/sizing.toml"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "vehicle,message,Mission|range [km]",
        ))
        .stdout(predicate::str::contains("Reference Multirotor").count(18));
}

#[test]
fn sweep_without_grid_is_an_error() {
    Command::cargo_bin("evtol-sweep")
        .expect("binary built")
        .arg("--vehicle")
        .arg(manifest("vehicles/multirotor.toml"))
        .arg("--mission")
        .arg(manifest("missions/hop_50km.toml"))
        .arg("--fidelity")
        .arg(manifest("fidelity/multirotor.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("sweep"));
}
