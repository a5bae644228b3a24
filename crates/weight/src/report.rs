//! Flat named outputs of a closure point.
//!
//! Names follow the `Group|quantity|qualifier` convention used by design
//! variables, constraints and the CSV logger; per-segment values carry a
//! `segment_k` suffix with the 1-based segment id.

use std::f64::consts::PI;

use evtol_core::outputs::Outputs;
use evtol_core::units::Unit;
use evtol_mission::{Mission, SegmentKind};
use evtol_power::{ComponentPower, SegmentPower};
use evtol_vehicle::{Configuration, Rotor, Vehicle};

use crate::closure::ClosurePoint;

/// Hub spacing over rotor diameter; below one the disks overlap.
///
/// Multirotor hubs sit on a ring at the boom tips. Lift+cruise hubs sit on
/// booms spread along the span, one row fore and one aft of the wing.
pub fn clearance_ratio(vehicle: &Vehicle) -> f64 {
    let rotor = &vehicle.lift_rotor;
    let diameter = 2.0 * rotor.radius_m;
    let count = rotor.count.max(1) as f64;
    let spacing = match (vehicle.configuration, &vehicle.wing) {
        (Configuration::LiftPlusCruise, Some(wing)) if vehicle.boom.count > 0 => {
            let booms = vehicle.boom.count as f64;
            let per_boom = (count / booms).ceil();
            let lateral = wing.span_m() / booms;
            let longitudinal = if per_boom > 1.0 {
                vehicle.boom.length_m / (per_boom - 1.0)
            } else {
                f64::INFINITY
            };
            lateral.min(longitudinal)
        }
        _ => {
            if rotor.count < 2 {
                return f64::INFINITY;
            }
            let ring = vehicle.fuselage.max_diameter_m / 2.0 + vehicle.boom.length_m;
            2.0 * ring * (PI / count).sin()
        }
    };
    spacing / diameter
}

fn thrust_to_power(component: &ComponentPower) -> f64 {
    if component.power_w > 0.0 {
        component.thrust_total_n / component.power_w
    } else {
        0.0
    }
}

fn blade_loading(component: &ComponentPower, rotor: &Rotor) -> f64 {
    component.ct / rotor.solidity()
}

fn segment_outputs(outputs: &mut Outputs, segment: &SegmentPower) {
    let k = segment.id;
    outputs.insert(
        format!("LiftRotor|thrust_each|segment_{k}"),
        segment.lift_rotor.thrust_each_n,
        Unit::Newton,
    );
    outputs.insert(
        format!("Propeller|thrust_each|segment_{k}"),
        segment.propeller.thrust_each_n,
        Unit::Newton,
    );
    outputs.insert(
        format!("Power|LiftRotor|segment_{k}"),
        segment.lift_rotor.power_w,
        Unit::Watt,
    );
    outputs.insert(
        format!("Power|Propeller|segment_{k}"),
        segment.propeller.power_w,
        Unit::Watt,
    );
    outputs.insert(format!("Power|segment_{k}"), segment.total_power_w, Unit::Watt);
    outputs.insert(format!("Energy|segment_{k}"), segment.energy_wh, Unit::WattHour);
    outputs.insert(format!("LiftRotor|RPM|segment_{k}"), segment.lift_rotor.rpm, Unit::Rpm);
    outputs.insert(format!("Propeller|RPM|segment_{k}"), segment.propeller.rpm, Unit::Rpm);
}

/// Every reported quantity of one closure point.
pub fn point_outputs(vehicle: &Vehicle, mission: &Mission, point: &ClosurePoint) -> Outputs {
    let mut outputs = Outputs::new();
    let breakdown = &point.breakdown;
    let power = &point.power;

    outputs.insert("Weight|takeoff", point.takeoff_weight_kg, Unit::Kilogram);
    outputs.insert("Weight|closure_error", point.closure_error_kg, Unit::Kilogram);
    outputs.insert("Weight|residual", point.residual(), Unit::SquareKilogram);
    outputs.insert("Weight|payload", breakdown.payload_kg, Unit::Kilogram);
    outputs.insert("Weight|battery", breakdown.battery_kg, Unit::Kilogram);
    outputs.insert("Weight|propulsion", breakdown.propulsion.total_kg, Unit::Kilogram);
    outputs.insert("Weight|structure", breakdown.structure.total_kg, Unit::Kilogram);
    outputs.insert("Weight|equipment", breakdown.equipment_kg, Unit::Kilogram);
    outputs.insert("Weight|empty", breakdown.empty_kg(), Unit::Kilogram);

    outputs.insert("Energy|entire_mission", power.energy_wh, Unit::WattHour);
    outputs.insert("Mission|total_time", power.total_time_s, Unit::Second);
    outputs.insert("Mission|range", mission.range_m(), Unit::Metre);
    outputs.insert(
        "Mission|cruise_speed",
        mission.cruise_segment().speed_m_s,
        Unit::MetrePerSecond,
    );

    outputs.insert("Power|max", power.sizing.total_power_w, Unit::Watt);
    outputs.insert(
        "LiftRotor|thrust_each|max",
        power.sizing.lift_rotor_thrust_each_n,
        Unit::Newton,
    );
    outputs.insert("Power|LiftRotor|max", power.sizing.lift_rotor_power_w, Unit::Watt);
    outputs.insert(
        "Propeller|thrust_each|max",
        power.sizing.propeller_thrust_each_n,
        Unit::Newton,
    );
    outputs.insert("Power|Propeller|max", power.sizing.propeller_power_w, Unit::Watt);

    for segment in &power.segments {
        segment_outputs(&mut outputs, segment);
    }

    let lift = &vehicle.lift_rotor;
    let hover = power
        .first_of_kind(SegmentKind::HoverClimbConstantSpeed)
        .or_else(|| power.segments.iter().find(|s| s.kind.is_hover()));
    if let Some(hover) = hover {
        outputs.insert(
            "LiftRotor|HoverClimb|T_to_P",
            thrust_to_power(&hover.lift_rotor),
            Unit::NewtonPerWatt,
        );
        outputs.insert(
            "LiftRotor|HoverClimb|CT/sigma",
            blade_loading(&hover.lift_rotor, lift),
            Unit::Dimensionless,
        );
        outputs.insert(
            "LiftRotor|HoverClimb|RPM",
            hover.lift_rotor.rpm,
            Unit::Rpm,
        );
    }
    outputs.insert(
        "LiftRotor|disk_loading",
        power.sizing.lift_rotor_thrust_each_n / lift.disk_area_each(),
        Unit::NewtonPerSquareMetre,
    );
    outputs.insert("LiftRotor|clearance", clearance_ratio(vehicle), Unit::Dimensionless);

    if let Some(cruise) = power.first_of_kind(SegmentKind::CruiseConstantSpeed) {
        let (group, component) = match vehicle.configuration {
            Configuration::Multirotor => ("LiftRotor", &cruise.lift_rotor),
            Configuration::LiftPlusCruise => ("Propeller", &cruise.propeller),
        };
        let rotor = vehicle.forward_thrust_rotor();
        outputs.insert(
            format!("{group}|Cruise|T_to_P"),
            thrust_to_power(component),
            Unit::NewtonPerWatt,
        );
        outputs.insert(format!("{group}|Cruise|mu"), component.mu, Unit::Dimensionless);
        outputs.insert(
            format!("{group}|Cruise|CT/sigma"),
            blade_loading(component, rotor),
            Unit::Dimensionless,
        );
        outputs.insert(format!("{group}|Cruise|RPM"), component.rpm, Unit::Rpm);

        if let Some(trim) = &cruise.trim {
            outputs.insert("Cruise|drag", trim.drag_n, Unit::Newton);
            outputs.insert("Cruise|disk_aoa", trim.disk_aoa_rad, Unit::Radian);
            if vehicle.wing.is_some() {
                outputs.insert("Wing|Cruise|CL", trim.cl, Unit::Dimensionless);
                if let Some(aoa) = trim.aoa_rad {
                    outputs.insert("Wing|Cruise|AoA", aoa, Unit::Radian);
                }
            }
        }
    }

    outputs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_rotors_do_not_overlap() {
        assert!(clearance_ratio(&Vehicle::reference_multirotor()) > 1.0);
        assert!(clearance_ratio(&Vehicle::reference_lift_plus_cruise()) > 1.0);
    }

    #[test]
    fn larger_rotors_reduce_clearance() {
        let mut vehicle = Vehicle::reference_multirotor();
        let base = clearance_ratio(&vehicle);
        vehicle.lift_rotor.radius_m *= 1.5;
        assert!(clearance_ratio(&vehicle) < base);
    }
}
