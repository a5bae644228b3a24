use evtol_sizing::mission::{Mission, SegmentDef, SegmentKind, SegmentSpec, StandardProfile};
use evtol_sizing::power::energy::segment_energy_wh;
use evtol_sizing::power::{evaluate_mission, mission_energy_wh};
use evtol_sizing::units::Unit;
use evtol_sizing::vehicle::{Configuration, Vehicle};
use evtol_sizing::weight::{Fidelity, SolvedBy, WeightAnalysis, WeightType, point_outputs};

fn lift_plus_cruise_setup() -> (Vehicle, Mission, Fidelity) {
    let vehicle = Vehicle::reference_lift_plus_cruise();
    let mission = Mission::standard(&StandardProfile::new(80.0, 60.0)).expect("standard mission");
    (vehicle, mission, Fidelity::baseline(Configuration::LiftPlusCruise))
}

#[test]
fn lift_plus_cruise_components_idle_outside_their_phases() {
    let (vehicle, mission, fidelity) = lift_plus_cruise_setup();
    let settings = fidelity.power_settings();
    for weight_kg in [1_200.0, 1_800.0, 2_600.0] {
        let power = evaluate_mission(&vehicle, &mission, &settings, weight_kg).expect("power chain");
        for segment in &power.segments {
            if segment.kind.is_hover() {
                assert_eq!(segment.propeller.thrust_each_n, 0.0, "{}", segment.name);
                assert_eq!(segment.propeller.power_w, 0.0, "{}", segment.name);
                assert!(segment.lift_rotor.power_w > 0.0, "{}", segment.name);
            }
            if segment.kind.is_forward_flight() {
                assert_eq!(segment.lift_rotor.thrust_each_n, 0.0, "{}", segment.name);
                assert_eq!(segment.lift_rotor.power_w, 0.0, "{}", segment.name);
            }
        }
    }
}

#[test]
fn hover_climb_reports_idle_propeller() {
    let (vehicle, mission, fidelity) = lift_plus_cruise_setup();
    let analysis = WeightAnalysis::new(
        vehicle,
        mission,
        fidelity,
        WeightType::Maximum,
        SolvedBy::NonlinearSolver,
    )
    .expect("valid analysis");
    let point = analysis.evaluate_at(2_000.0).expect("closure point");
    let k = point
        .power
        .first_of_kind(SegmentKind::HoverClimbConstantSpeed)
        .expect("standard mission has a hover climb")
        .id;

    let outputs = point_outputs(analysis.vehicle(), analysis.mission(), &point);
    let thrust = outputs
        .get(&format!("Propeller|thrust_each|segment_{k}"), Unit::Newton)
        .expect("propeller thrust output");
    let power = outputs
        .get(&format!("Power|Propeller|segment_{k}"), Unit::Watt)
        .expect("propeller power output");
    assert_eq!(thrust, 0.0);
    assert_eq!(power, 0.0);
}

#[test]
fn every_standard_multirotor_segment_converges() {
    let vehicle = Vehicle::reference_multirotor();
    let mission = Mission::standard(&StandardProfile::new(100.0, 241.4 / 3.6)).expect("standard mission");
    let settings = Fidelity::baseline(Configuration::Multirotor).power_settings();
    for weight_kg in [1_200.0, 1_800.0, 2_600.0] {
        let power = evaluate_mission(&vehicle, &mission, &settings, weight_kg).expect("power chain");
        for segment in &power.segments {
            assert!(segment.converged, "{} at {weight_kg} kg", segment.name);
        }
        let descent = power
            .first_of_kind(SegmentKind::DescentConstantVyConstantVx)
            .expect("standard mission has a descent");
        assert!(descent.lift_rotor.power_w > 0.0);
        assert!(power.converged);
    }
}

#[test]
fn mission_energy_is_sum_of_segment_energies() {
    let vehicle = Vehicle::reference_multirotor();
    let mission = Mission::standard(&StandardProfile::new(60.0, 50.0).with_reserve_minutes(20.0))
        .expect("standard mission");
    let settings = Fidelity::baseline(Configuration::Multirotor).power_settings();
    let power = evaluate_mission(&vehicle, &mission, &settings, 1_500.0).expect("power chain");

    let summed: f64 = power
        .segments
        .iter()
        .map(|s| s.total_power_w * s.duration_s / 3_600.0)
        .sum();
    assert!((power.energy_wh - summed).abs() < 1e-6 * summed.max(1.0));

    let mut reversed = power.segments.clone();
    reversed.reverse();
    assert!((mission_energy_wh(&reversed) - power.energy_wh).abs() < 1e-6 * summed.max(1.0));

    for segment in &power.segments {
        assert!(
            (segment.energy_wh - segment_energy_wh(segment.total_power_w, segment.duration_s))
                .abs()
                < 1e-9
        );
    }
}

#[test]
fn constant_power_draws_fraction_of_sizing_power() {
    let defs = vec![
        SegmentDef::new(
            "Hover Climb",
            SegmentSpec::HoverClimb {
                speed_m_s: 2.5,
                altitude_change_m: 15.0,
            },
        ),
        SegmentDef::new(
            "Cruise",
            SegmentSpec::Cruise {
                speed_m_s: 45.0,
                distance_m: 30_000.0,
                aoa_deg: None,
            },
        ),
        SegmentDef::new(
            "Taxi",
            SegmentSpec::ConstantPower {
                duration_s: 30.0,
                power_fraction: 0.1,
            },
        ),
    ];
    let mission = Mission::new(defs, 0.0).expect("valid mission");
    let settings = Fidelity::baseline(Configuration::Multirotor).power_settings();
    let power = evaluate_mission(&Vehicle::reference_multirotor(), &mission, &settings, 1_500.0)
        .expect("power chain");

    let taxi = power
        .first_of_kind(SegmentKind::ConstantPower)
        .expect("taxi segment");
    assert!((taxi.total_power_w - 0.1 * power.sizing.total_power_w).abs() < 1e-6);
    assert!(power.sizing.total_power_w > 0.0);
}
