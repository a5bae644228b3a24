use std::path::Path;

use evtol_sizing::config::{
    SweepConfig, load_fidelity, load_mission, load_problem, load_vehicle, load_vehicle_configs,
};
use evtol_sizing::design::ProblemKind;
use evtol_sizing::vehicle::{Configuration, Vehicle};
use evtol_sizing::weight::{WeightError, WeightType};
use evtol_sizing::{Study, StudyError};

fn study(vehicle: &str, mission: &str, fidelity: &str, problem: Option<&str>) -> Study {
    Study::load(
        Path::new(vehicle),
        Path::new(mission),
        Path::new(fidelity),
        problem.map(Path::new),
    )
    .expect("manifests load")
}

#[test]
fn vehicle_catalog_loads_sorted_by_path() {
    let configs = load_vehicle_configs("configs/vehicles").expect("vehicle catalog");
    assert_eq!(configs.len(), 2);
    let vehicles: Vec<Vehicle> = configs
        .into_iter()
        .map(|c| Vehicle::try_from(c).expect("valid vehicle"))
        .collect();
    assert_eq!(vehicles[0].configuration, Configuration::LiftPlusCruise);
    assert_eq!(vehicles[1].configuration, Configuration::Multirotor);
    assert_eq!(vehicles[1].lift_rotor.rpm.hover, 900.0);
    assert_eq!(vehicles[0].lift_rotor.rpm.cruise, 1_300.0);
}

#[test]
fn every_sample_manifest_parses() {
    for path in ["configs/vehicles/multirotor.toml", "configs/vehicles/lift_plus_cruise.toml"] {
        load_vehicle(path).expect(path);
    }
    for path in [
        "configs/missions/standard_100km.toml",
        "configs/missions/hop_50km.toml",
        "configs/missions/custom_segments.yaml",
    ] {
        load_mission(path).expect(path).to_mission().expect(path);
    }
    for path in [
        "configs/fidelity/multirotor.toml",
        "configs/fidelity/lift_plus_cruise.toml",
        "configs/fidelity/bemt.yaml",
    ] {
        load_fidelity(path).expect(path);
    }
    for path in [
        "configs/problems/sizing.toml",
        "configs/problems/gross.toml",
        "configs/problems/rotor_radius.toml",
        "configs/problems/multipoint.yaml",
    ] {
        let problem = load_problem(path).expect(path);
        problem.weight_type().expect(path);
        problem.solved_by().expect(path);
    }
}

#[test]
fn standard_mission_manifest_converts_speed() {
    let config = load_mission("configs/missions/standard_100km.toml").expect("mission manifest");
    let profile = config
        .standard_profile()
        .expect("standard section")
        .expect("valid profile");
    assert!((profile.cruise_speed_m_s - 241.4 / 3.6).abs() < 1e-9);
    assert!((profile.range_m - 100_000.0).abs() < 1e-9);
}

#[test]
fn multirotor_study_sizes_from_manifests() {
    let study = study(
        "configs/vehicles/multirotor.toml",
        "configs/missions/standard_100km.toml",
        "configs/fidelity/multirotor.toml",
        Some("configs/problems/sizing.toml"),
    );
    let result = study.size().expect("sizing runs");
    assert!(result.converged, "{}", result.message);
    assert_eq!(result.weight_type, WeightType::Maximum);
    assert!(result.residual() < 1e-4);
    assert_eq!(study.sweep_grid().expect("sweep section").len(), 18);
}

#[test]
fn lift_plus_cruise_study_sizes_tails_from_volume_coefficients() {
    let study = study(
        "configs/vehicles/lift_plus_cruise.toml",
        "configs/missions/hop_50km.toml",
        "configs/fidelity/lift_plus_cruise.toml",
        None,
    );
    let result = study.size().expect("sizing runs");
    assert!(result.converged, "{}", result.message);
    let horizontal = result
        .vehicle
        .horizontal_tail
        .as_ref()
        .expect("lift+cruise carries a horizontal tail");
    assert_ne!(horizontal.area_m2, 2.5);
}

#[test]
fn gross_study_flies_sized_airframe_with_better_battery() {
    let study = study(
        "configs/vehicles/multirotor.toml",
        "configs/missions/hop_50km.toml",
        "configs/fidelity/multirotor.toml",
        Some("configs/problems/gross.toml"),
    );
    let result = study.size().expect("sizing runs");
    assert_eq!(result.weight_type, WeightType::Gross);
    assert!(result.converged, "{}", result.message);
    assert_eq!(result.weights.gross_takeoff_kg, Some(result.takeoff_weight_kg()));
    assert!(result.takeoff_weight_kg() < result.weights.max_takeoff_kg);
}

#[test]
fn blade_element_hover_needs_optimizer_closure() {
    let study = study(
        "configs/vehicles/multirotor.toml",
        "configs/missions/hop_50km.toml",
        "configs/fidelity/bemt.yaml",
        None,
    );
    assert!(matches!(
        study.size(),
        Err(StudyError::Weight(WeightError::IncompatibleSolver { .. }))
    ));
}

#[test]
fn segment_list_mission_cannot_be_swept() {
    let mut study = study(
        "configs/vehicles/multirotor.toml",
        "configs/missions/custom_segments.yaml",
        "configs/fidelity/multirotor.toml",
        Some("configs/problems/sizing.toml"),
    );
    assert!(study.profile.is_none());
    study.problem.sweep = Some(SweepConfig {
        ranges_km: vec![40.0],
        cruise_speeds_m_s: vec![50.0],
        cruise_speeds_km_h: Vec::new(),
        battery_densities_wh_kg: vec![300.0],
    });
    assert!(matches!(study.sweep(false), Err(StudyError::NotStandardMission)));
}

#[test]
fn small_sweep_runs_from_manifests() {
    let mut study = study(
        "configs/vehicles/multirotor.toml",
        "configs/missions/hop_50km.toml",
        "configs/fidelity/multirotor.toml",
        None,
    );
    assert!(matches!(study.sweep(false), Err(StudyError::MissingSection("sweep"))));
    study.problem.sweep = Some(SweepConfig {
        ranges_km: vec![30.0, 50.0],
        cruise_speeds_m_s: vec![45.0],
        cruise_speeds_km_h: Vec::new(),
        battery_densities_wh_kg: vec![300.0],
    });
    let rows = study.sweep(false).expect("sweep runs");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.success));
    assert!(rows[0].takeoff_weight_kg() < rows[1].takeoff_weight_kg());
}

#[test]
fn optimization_manifests_build_problems() {
    let study = study(
        "configs/vehicles/lift_plus_cruise.toml",
        "configs/missions/hop_50km.toml",
        "configs/fidelity/lift_plus_cruise.toml",
        Some("configs/problems/multipoint.yaml"),
    );
    let optimization = study
        .problem
        .optimization
        .as_ref()
        .expect("optimization section");
    assert_eq!(optimization.kind().expect("known kind"), ProblemKind::MultiPoint);
    let problem = optimization
        .design_problem(
            study.vehicle.clone(),
            study.mission.clone(),
            study.fidelity,
            None,
        )
        .expect("valid problem");
    assert_eq!(problem.design_variables.len(), 2);
    assert_eq!(problem.constraints.len(), 1);
}
