use evtol_sizing::mission::{Mission, StandardProfile};
use evtol_sizing::units::{Unit, kmh_to_ms};
use evtol_sizing::vehicle::{Configuration, PointOverride, Vehicle};
use evtol_sizing::weight::{
    ClosureOptions, Fidelity, SizingResult, SolvedBy, WeightAnalysis, WeightError, WeightType,
    evaluate_gtow,
};

fn hundred_km_mission() -> Mission {
    Mission::standard(&StandardProfile::new(100.0, kmh_to_ms(241.4))).expect("standard mission")
}

fn size_multirotor(density_wh_kg: f64) -> SizingResult {
    let vehicle =
        Vehicle::reference_multirotor().with_override(&PointOverride::battery_density(density_wh_kg));
    WeightAnalysis::new(
        vehicle,
        hundred_km_mission(),
        Fidelity::baseline(Configuration::Multirotor),
        WeightType::Maximum,
        SolvedBy::NonlinearSolver,
    )
    .expect("valid analysis")
    .evaluate(1_500.0)
    .expect("sizing runs")
}

#[test]
fn multirotor_closes_on_hundred_km_mission() {
    let result = size_multirotor(250.0);
    assert!(result.converged, "{}", result.message);
    let takeoff = result.get("Weight|takeoff", Unit::Kilogram).expect("takeoff output");
    assert!(takeoff.is_finite() && takeoff > 0.0);
    assert!(result.get("Weight|residual", Unit::SquareKilogram).expect("residual") < 0.1);
    assert!(result.get("Energy|entire_mission", Unit::KilowattHour).expect("energy") > 0.0);
}

#[test]
fn converged_weights_sum_to_takeoff() {
    for result in [size_multirotor(250.0), size_multirotor(400.0)] {
        assert!(result.converged, "{}", result.message);
        let w = &result.weights;
        let sum = w.payload_kg + w.battery_kg + w.propulsion_kg + w.structure_kg + w.equipment_kg;
        assert!(
            (result.takeoff_weight_kg() - sum).abs() < 0.05,
            "takeoff {} vs components {}",
            result.takeoff_weight_kg(),
            sum
        );
    }
}

#[test]
fn lift_plus_cruise_closes_with_optimizer() {
    let vehicle = Vehicle::reference_lift_plus_cruise();
    let mission = Mission::standard(&StandardProfile::new(80.0, 60.0)).expect("standard mission");
    let result = WeightAnalysis::new(
        vehicle,
        mission,
        Fidelity::baseline(Configuration::LiftPlusCruise),
        WeightType::Maximum,
        SolvedBy::Optimization,
    )
    .expect("valid analysis")
    .with_options(ClosureOptions {
        tolerance_kg2: 1e-2,
        ..ClosureOptions::default()
    })
    .evaluate(1_800.0)
    .expect("sizing runs");
    assert!(result.closure_converged, "{}", result.message);
    assert!(result.residual() < 0.1);
}

#[test]
fn denser_battery_gives_lighter_vehicle() {
    let baseline = size_multirotor(250.0);
    let improved = size_multirotor(550.0);
    assert!(baseline.converged && improved.converged);
    assert!(improved.takeoff_weight_kg() < baseline.takeoff_weight_kg());
    assert!(improved.weights.battery_kg < baseline.weights.battery_kg);
}

#[test]
fn gross_weight_falls_with_battery_density_on_fixed_airframe() {
    let sized = size_multirotor(250.0);
    assert!(sized.weights.is_sized);

    let gross_at = |density: f64| {
        evaluate_gtow(
            Vehicle::reference_multirotor().with_override(&PointOverride::battery_density(density)),
            hundred_km_mission(),
            Fidelity::baseline(Configuration::Multirotor),
            SolvedBy::NonlinearSolver,
            &sized,
            sized.takeoff_weight_kg(),
        )
        .expect("gross evaluation runs")
    };
    let light = gross_at(400.0);
    let heavier = gross_at(300.0);
    assert!(light.converged && heavier.converged);
    assert!(light.weights.battery_kg < heavier.weights.battery_kg);
    assert!(light.takeoff_weight_kg() < heavier.takeoff_weight_kg());
    assert_eq!(light.weights.structure_kg, sized.weights.structure_kg);
    assert_eq!(light.weights.propulsion_kg, sized.weights.propulsion_kg);
}

#[test]
fn repeated_evaluation_is_deterministic() {
    let mut analysis = WeightAnalysis::new(
        Vehicle::reference_multirotor(),
        hundred_km_mission(),
        Fidelity::baseline(Configuration::Multirotor),
        WeightType::Maximum,
        SolvedBy::NonlinearSolver,
    )
    .expect("valid analysis");
    let first = analysis.evaluate(1_500.0).expect("first evaluation");
    let second = analysis.evaluate(1_500.0).expect("second evaluation");
    assert!(first.converged && second.converged);
    assert!((first.takeoff_weight_kg() - second.takeoff_weight_kg()).abs() < 1e-9);
    assert_eq!(first.iterations, second.iterations);
}

#[test]
fn gross_evaluation_refuses_unsized_airframe() {
    let not_sized = WeightAnalysis::new(
        Vehicle::reference_multirotor(),
        hundred_km_mission(),
        Fidelity::baseline(Configuration::Multirotor),
        WeightType::Maximum,
        SolvedBy::NonlinearSolver,
    )
    .expect("valid analysis")
    .with_options(ClosureOptions {
        max_iterations: 1,
        tolerance_kg2: 1e-12,
        ..ClosureOptions::default()
    })
    .evaluate(300.0)
    .expect("evaluation runs");
    assert!(!not_sized.converged);
    assert!(!not_sized.weights.is_sized);

    let err = evaluate_gtow(
        Vehicle::reference_multirotor(),
        hundred_km_mission(),
        Fidelity::baseline(Configuration::Multirotor),
        SolvedBy::NonlinearSolver,
        &not_sized,
        1_500.0,
    )
    .unwrap_err();
    assert!(matches!(err, WeightError::NotSized));

    let err = WeightAnalysis::new(
        Vehicle::reference_multirotor(),
        hundred_km_mission(),
        Fidelity::baseline(Configuration::Multirotor),
        WeightType::Gross,
        SolvedBy::NonlinearSolver,
    )
    .unwrap_err();
    assert!(matches!(err, WeightError::NotSized));
}
