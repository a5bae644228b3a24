use evtol_sizing::design::{
    Constraint, DesignError, DesignProblem, MultiPointOptions, OffDesignOptions, ProblemKind,
    SweepGrid, SweepMode, SweepSetup, run_sweep,
};
use evtol_sizing::mission::{Mission, StandardProfile};
use evtol_sizing::units::Unit;
use evtol_sizing::vehicle::{Configuration, Vehicle};
use evtol_sizing::weight::{ClosureOptions, Fidelity, SolvedBy};

fn multirotor_problem() -> DesignProblem {
    let vehicle = Vehicle::reference_multirotor();
    let mission = Mission::standard(&StandardProfile::new(50.0, 50.0)).expect("standard mission");
    DesignProblem::new(vehicle, mission, Fidelity::baseline(Configuration::Multirotor))
}

#[test]
fn undersized_rotor_violates_disk_loading_without_crashing() {
    let problem = multirotor_problem()
        .design_variable("Weight|takeoff", 500.0, 10_000.0, 1_500.0, Unit::Kilogram)
        .design_variable("LiftRotor|radius", 0.3, 0.35, 0.3, Unit::Metre)
        .constraint(Constraint::at_most(
            "LiftRotor|disk_loading",
            1_000.0,
            100.0,
            Unit::NewtonPerSquareMetre,
        ))
        .constraint(Constraint::at_least(
            "LiftRotor|HoverClimb|T_to_P",
            0.05,
            0.01,
            Unit::NewtonPerWatt,
        ));
    let result = problem.run_optimization().expect("optimizer reports instead of failing");

    assert!(!result.success);
    assert!(
        result
            .points
            .iter()
            .all(|p| p.closure_converged && p.closure.power.converged),
        "{}",
        result.message
    );
    let disk_loading = result
        .constraint("LiftRotor|disk_loading")
        .expect("disk loading is reported");
    assert!(!disk_loading.satisfied);
    assert!(disk_loading.value > 1_000.0);
    assert!(result.constraint("Weight|closure_error").is_some());
}

#[test]
fn weight_variable_closes_through_equality_constraint() {
    let problem = multirotor_problem().design_variable(
        "Weight|takeoff",
        500.0,
        5_000.0,
        2_000.0,
        Unit::Kilogram,
    );
    let result = problem.run_optimization().expect("optimization runs");
    assert!(result.success, "{}", result.message);
    let closure = result
        .constraint("Weight|closure_error")
        .expect("closure equality added");
    assert!(closure.satisfied);
    let takeoff = result.get("Weight|takeoff", Unit::Kilogram).expect("takeoff");
    assert!(takeoff > 500.0 && takeoff < 5_000.0);
}

#[test]
fn multi_point_densities_share_geometry() {
    let problem = multirotor_problem()
        .kind(ProblemKind::MultiPoint)
        .multipoint_options(MultiPointOptions::battery_densities(&[250.0, 400.0]))
        .design_variable("LiftRotor|radius", 1.0, 2.0, 1.5, Unit::Metre)
        .constraint(Constraint::at_least(
            "LiftRotor|clearance",
            1.0,
            1.0,
            Unit::Dimensionless,
        ));
    let result = problem.run_optimization().expect("optimization runs");

    assert_eq!(result.points.len(), 2);
    let heavy = result.get("Point_1|Weight|takeoff", Unit::Kilogram).expect("point 1");
    let light = result.get("Point_2|Weight|takeoff", Unit::Kilogram).expect("point 2");
    assert!(light < heavy);
    let radius = result.get("LiftRotor|radius", Unit::Metre).expect("shared radius");
    for point in &result.points {
        assert_eq!(point.vehicle.lift_rotor.radius_m, radius);
    }
}

#[test]
fn multi_point_without_points_is_rejected() {
    let problem = multirotor_problem()
        .kind(ProblemKind::MultiPoint)
        .design_variable("LiftRotor|radius", 1.0, 2.0, 1.5, Unit::Metre);
    assert!(matches!(
        problem.run_optimization(),
        Err(DesignError::MissingOptions { .. })
    ));
}

#[test]
fn off_design_point_flies_the_sized_airframe() {
    let problem = multirotor_problem()
        .kind(ProblemKind::OffDesign)
        .offdesign_options(OffDesignOptions::battery_densities(250.0, 400.0))
        .design_variable("LiftRotor|radius", 1.0, 2.0, 1.5, Unit::Metre);
    let result = problem.run_optimization().expect("optimization runs");
    assert_eq!(result.points.len(), 2);
    let on = &result.points[0].closure.breakdown;
    let off = &result.points[1].closure.breakdown;
    assert_eq!(on.structure.total_kg, off.structure.total_kg);
    assert!(off.battery_kg < on.battery_kg);
}

#[test]
fn sweep_reports_every_point_and_flags_failures() {
    let setup = SweepSetup {
        vehicle: Vehicle::reference_multirotor(),
        fidelity: Fidelity::baseline(Configuration::Multirotor),
        profile: StandardProfile::new(50.0, 50.0),
        mode: SweepMode::Sizing(SolvedBy::NonlinearSolver),
        closure: ClosureOptions::default(),
        default_guess_kg: 1_500.0,
    };
    let grid = SweepGrid {
        ranges_km: vec![1.0, 40.0, 60.0],
        cruise_speeds_m_s: vec![50.0],
        battery_densities_wh_kg: vec![250.0, 400.0],
    };
    let rows = run_sweep(&setup, &grid);
    assert_eq!(rows.len(), grid.len());

    // 1 km is shorter than the climb and descent legs
    assert!(rows[..2].iter().all(|r| !r.success && r.takeoff_weight_kg().is_nan()));
    assert!(rows[2..].iter().all(|r| r.success), "{rows:?}");
    assert!(rows[2].takeoff_weight_kg() > rows[3].takeoff_weight_kg());
    assert!(rows[4].takeoff_weight_kg() > rows[2].takeoff_weight_kg());
}
