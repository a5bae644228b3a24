use evtol_sizing::design::{SWEEP_OUTPUTS, SweepGrid, SweepMode, SweepSetup, run_sweep};
use evtol_sizing::export::{ResultRecord, append_rows, write_rows, write_summary};
use evtol_sizing::mission::{Mission, StandardProfile};
use evtol_sizing::vehicle::{Configuration, Vehicle};
use evtol_sizing::weight::{
    ClosureOptions, Fidelity, SizingResult, SolvedBy, WeightAnalysis, WeightType,
};

fn sized() -> SizingResult {
    WeightAnalysis::new(
        Vehicle::reference_multirotor(),
        Mission::standard(&StandardProfile::new(50.0, 50.0)).expect("standard mission"),
        Fidelity::baseline(Configuration::Multirotor),
        WeightType::Maximum,
        SolvedBy::NonlinearSolver,
    )
    .expect("valid analysis")
    .evaluate(1_500.0)
    .expect("sizing runs")
}

#[test]
fn sizing_rows_append_under_one_header() {
    let result = sized();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("runs.csv");
    for _ in 0..2 {
        ResultRecord::from_outputs(&result.outputs())
            .with_label("vehicle", result.vehicle.name.as_str())
            .append_csv(&path)
            .expect("append");
    }

    let mut reader = csv::Reader::from_path(&path).expect("csv readable");
    let headers = reader.headers().expect("header row").clone();
    assert_eq!(&headers[0], "vehicle");
    assert!(headers.iter().any(|h| h == "Weight|takeoff [kg]"));
    assert!(headers.iter().any(|h| h == "Energy|entire_mission [Wh]"));
    let rows: Vec<_> = reader.records().collect::<Result<_, _>>().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "Reference Multirotor");
}

#[test]
fn sweep_rows_keep_nan_for_failed_points() {
    let setup = SweepSetup {
        vehicle: Vehicle::reference_multirotor(),
        fidelity: Fidelity::baseline(Configuration::Multirotor),
        profile: StandardProfile::new(50.0, 50.0),
        mode: SweepMode::Sizing(SolvedBy::NonlinearSolver),
        closure: ClosureOptions::default(),
        default_guess_kg: 1_500.0,
    };
    let grid = SweepGrid {
        ranges_km: vec![1.0, 40.0],
        cruise_speeds_m_s: vec![50.0],
        battery_densities_wh_kg: vec![300.0],
    };
    let records: Vec<ResultRecord> = run_sweep(&setup, &grid)
        .iter()
        .map(|row| ResultRecord::from_outputs(&row.outputs()))
        .collect();

    let mut buffer = Vec::new();
    write_rows(&mut buffer, &records).expect("write");
    let text = String::from_utf8(buffer).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Mission|range [km],Mission|cruise_speed [m/s]"));
    assert_eq!(lines[0].split(',').count(), 4 + SWEEP_OUTPUTS.len());
    assert!(lines[1].contains("NaN"));
    assert!(!lines[2].contains("NaN"));

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("sweep.csv");
    append_rows(&path, &records).expect("first batch");
    append_rows(&path, &records).expect("second batch");
    let contents = std::fs::read_to_string(&path).expect("csv readable");
    assert_eq!(contents.lines().count(), 5);
}

#[test]
fn json_summary_carries_breakdown() {
    let result = sized();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out/summary.json");
    write_summary(&path, &result).expect("summary written");

    let text = std::fs::read_to_string(&path).expect("summary readable");
    let json: serde_json::Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(json["vehicle"], "Reference Multirotor");
    assert_eq!(json["converged"], result.converged);
    let battery = json["weights"]["battery_kg"].as_f64().expect("battery weight");
    assert!((battery - result.weights.battery_kg).abs() < 1e-9);
    let outputs = json["outputs"].as_array().expect("outputs list");
    assert!(outputs.iter().any(|o| o["name"] == "Weight|takeoff"));
}
