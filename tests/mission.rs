use evtol_sizing::config::{ConfigError, MissionConfig};
use evtol_sizing::mission::{Mission, MissionError, SegmentDef, SegmentSpec};
use evtol_sizing::vehicle::{Configuration, Vehicle};
use evtol_sizing::weight::{Fidelity, SolvedBy, WeightAnalysis, WeightType};

fn reserve_and_taxi_only() -> Vec<SegmentDef> {
    vec![
        SegmentDef::new(
            "Taxi",
            SegmentSpec::ConstantPower {
                duration_s: 60.0,
                power_fraction: 0.1,
            },
        ),
        SegmentDef::new("Reserve", SegmentSpec::ReserveCruise { duration_s: 1_200.0 }),
    ]
}

#[test]
fn mission_without_sizing_envelope_is_rejected() {
    assert_eq!(
        Mission::new(reserve_and_taxi_only(), 0.0),
        Err(MissionError::NoSizingSegment)
    );
}

#[test]
fn manifest_without_sizing_envelope_never_reaches_analysis() {
    let manifest = r#"
[[segments]]
name = "Taxi"
kind = "constant_power"
duration_s = 60.0
power_fraction = 0.1

[[segments]]
name = "Reserve"
kind = "reserve_cruise"
duration_s = 1200.0
"#;
    let config: MissionConfig = toml::from_str(manifest).expect("manifest parses");
    assert!(matches!(
        config.to_mission(),
        Err(ConfigError::Mission(MissionError::NoSizingSegment))
    ));
}

#[test]
fn hover_only_mission_sizes_a_multirotor() {
    let defs = vec![
        SegmentDef::new(
            "Hover climb",
            SegmentSpec::HoverClimb {
                speed_m_s: 2.5,
                altitude_change_m: 15.0,
            },
        ),
        SegmentDef::new("Hover", SegmentSpec::HoverStay { duration_s: 120.0 }),
        SegmentDef::new(
            "Cruise",
            SegmentSpec::Cruise {
                speed_m_s: 30.0,
                distance_m: 5_000.0,
                aoa_deg: None,
            },
        ),
        SegmentDef::new(
            "Hover descent",
            SegmentSpec::HoverDescent {
                speed_m_s: 2.5,
                altitude_change_m: 15.0,
            },
        ),
    ];
    let mission = Mission::new(defs, 500.0).expect("valid mission");
    assert!(mission.constants().density_kg_m3 < 1.225);

    let result = WeightAnalysis::new(
        Vehicle::reference_multirotor(),
        mission,
        Fidelity::baseline(Configuration::Multirotor),
        WeightType::Maximum,
        SolvedBy::NonlinearSolver,
    )
    .expect("valid analysis")
    .evaluate(1_000.0)
    .expect("sizing runs");
    assert!(result.converged, "{}", result.message);
}
