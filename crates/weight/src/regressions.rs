//! Closed-form component weight regressions.
//!
//! The structural regressions are the published ones in imperial units
//! (lb, ft, kt); inputs and outputs cross the boundary in SI here.

use evtol_core::units::{kg_to_lb, lb_to_kg, m_to_ft, m2_to_ft2, ms_to_knots};
use evtol_power::SizingLoads;
use evtol_vehicle::{Battery, Rotor, Vehicle};
use serde::{Deserialize, Serialize};

/// Landing gear fraction of takeoff weight.
pub const LANDING_GEAR_FRACTION: f64 = 0.0325;
/// Equipment allowance proportional to takeoff weight (avionics, furnishings).
pub const EQUIPMENT_FRACTION: f64 = 0.03;
/// Motor specific power (kW/kg).
pub const MOTOR_SPECIFIC_POWER_KW_KG: f64 = 5.0;
/// Motor controller specific power (kW/kg).
pub const CONTROLLER_SPECIFIC_POWER_KW_KG: f64 = 20.0;

/// Structure weight regression family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureModel {
    /// Per-component Roskam / USAF general-aviation regressions.
    Roskam,
    /// Lumped regression on empty-minus-battery weight, cruise speed and load factor.
    M4,
}

/// Rotor and hub weight regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotorWeightModel {
    /// `4.5 · T_kN^0.9 · R^0.4` per rotor.
    ThrustBased,
    /// `0.25 · P_kW^0.9` per rotor.
    PowerBased,
}

/// Battery mass needed to deliver `energy_wh` to the shafts.
pub fn battery_weight(energy_wh: f64, battery: &Battery) -> f64 {
    energy_wh / battery.usable_specific_energy_wh_kg()
}

/// Rotor + hub weight of a whole group (kg).
pub fn rotor_group_weight(
    model: RotorWeightModel,
    rotor: &Rotor,
    max_thrust_each_n: f64,
    max_power_w: f64,
) -> f64 {
    let count = rotor.count as f64;
    let each = match model {
        RotorWeightModel::ThrustBased => {
            4.5 * (max_thrust_each_n / 1_000.0).max(0.0).powf(0.9) * rotor.radius_m.powf(0.4)
        }
        RotorWeightModel::PowerBased => 0.25 * (max_power_w / count / 1_000.0).max(0.0).powf(0.9),
    };
    each * count
}

pub fn motor_weight(max_power_w: f64) -> f64 {
    max_power_w.max(0.0) / 1_000.0 / MOTOR_SPECIFIC_POWER_KW_KG
}

pub fn controller_weight(max_power_w: f64) -> f64 {
    max_power_w.max(0.0) / 1_000.0 / CONTROLLER_SPECIFIC_POWER_KW_KG
}

/// Rotors, motors and controllers of every propulsive group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PropulsionWeight {
    pub lift_rotors_kg: f64,
    pub propellers_kg: f64,
    pub motors_kg: f64,
    pub controllers_kg: f64,
    /// Sum after the propulsion technology factor.
    pub total_kg: f64,
}

pub fn propulsion_weight(
    model: RotorWeightModel,
    vehicle: &Vehicle,
    loads: &SizingLoads,
) -> PropulsionWeight {
    let factor = vehicle.tech_factors.propulsion;
    let lift_rotors_kg = rotor_group_weight(
        model,
        &vehicle.lift_rotor,
        loads.lift_rotor_thrust_each_n,
        loads.lift_rotor_power_w,
    ) * factor;
    let propellers_kg = vehicle.propeller.as_ref().map_or(0.0, |propeller| {
        rotor_group_weight(
            model,
            propeller,
            loads.propeller_thrust_each_n,
            loads.propeller_power_w,
        ) * factor
    });
    let motors_kg =
        (motor_weight(loads.lift_rotor_power_w) + motor_weight(loads.propeller_power_w)) * factor;
    let controllers_kg = (controller_weight(loads.lift_rotor_power_w)
        + controller_weight(loads.propeller_power_w))
        * factor;

    PropulsionWeight {
        lift_rotors_kg,
        propellers_kg,
        motors_kg,
        controllers_kg,
        total_kg: lift_rotors_kg + propellers_kg + motors_kg + controllers_kg,
    }
}

/// Airframe structure by component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StructureWeight {
    pub fuselage_kg: f64,
    pub wing_kg: f64,
    pub horizontal_tail_kg: f64,
    pub vertical_tail_kg: f64,
    pub landing_gear_kg: f64,
    pub booms_kg: f64,
    /// Sum after the structure technology factor.
    pub total_kg: f64,
}

/// Inputs shared by the structure regressions.
#[derive(Debug, Clone, Copy)]
pub struct StructureInputs {
    pub takeoff_weight_kg: f64,
    pub battery_weight_kg: f64,
    pub cruise_speed_m_s: f64,
    /// Largest lift-rotor thrust, reacted by the booms (N).
    pub max_rotor_thrust_each_n: f64,
}

pub fn structure_weight(
    model: StructureModel,
    vehicle: &Vehicle,
    inputs: &StructureInputs,
) -> StructureWeight {
    let raw = match model {
        StructureModel::Roskam => roskam_structure(vehicle, inputs),
        StructureModel::M4 => m4_structure(vehicle, inputs),
    };
    let factor = vehicle.tech_factors.structure;
    let scaled = StructureWeight {
        fuselage_kg: raw.fuselage_kg * factor,
        wing_kg: raw.wing_kg * factor,
        horizontal_tail_kg: raw.horizontal_tail_kg * factor,
        vertical_tail_kg: raw.vertical_tail_kg * factor,
        landing_gear_kg: raw.landing_gear_kg * factor,
        booms_kg: raw.booms_kg * factor,
        total_kg: 0.0,
    };
    StructureWeight {
        total_kg: scaled.fuselage_kg
            + scaled.wing_kg
            + scaled.horizontal_tail_kg
            + scaled.vertical_tail_kg
            + scaled.landing_gear_kg
            + scaled.booms_kg,
        ..scaled
    }
}

fn boom_weight(vehicle: &Vehicle, thrust_each_n: f64) -> f64 {
    let boom = &vehicle.boom;
    boom.count as f64 * 0.06 * (thrust_each_n.max(0.0) * boom.length_m).sqrt()
}

fn roskam_structure(vehicle: &Vehicle, inputs: &StructureInputs) -> StructureWeight {
    let w_lb = kg_to_lb(inputs.takeoff_weight_kg);
    let n_ult = vehicle.ultimate_load_factor;
    let load = w_lb * n_ult / 1.0e5;
    let v_kt = ms_to_knots(inputs.cruise_speed_m_s);

    let fuselage = &vehicle.fuselage;
    let l_ft = m_to_ft(fuselage.length_m);
    let d_ft = m_to_ft(fuselage.max_diameter_m);
    let fuselage_lb = 200.0
        * (load.powf(0.286) * (l_ft / 10.0).powf(0.857) * (2.0 * d_ft / 10.0) * (v_kt / 100.0).powf(0.338))
            .powf(1.1);

    let wing_lb = vehicle.wing.as_ref().map_or(0.0, |wing| {
        let s_ft2 = m2_to_ft2(wing.area_m2);
        let cos_sweep = wing.sweep_deg.to_radians().cos();
        96.948
            * (load.powf(0.65)
                * (wing.aspect_ratio / cos_sweep).powf(0.57)
                * (s_ft2 / 100.0).powf(0.61)
                * ((1.0 + wing.taper_ratio) / (2.0 * wing.thickness_to_chord)).powf(0.36)
                * (1.0 + v_kt / 500.0).sqrt())
            .powf(0.993)
    });

    let horizontal_tail_lb = vehicle.horizontal_tail.as_ref().map_or(0.0, |tail| {
        let s_ft2 = m2_to_ft2(tail.area_m2);
        let span_ft = m_to_ft(tail.span_m());
        let root_thickness_ft = m_to_ft(tail.thickness_to_chord * tail.area_m2 / tail.span_m());
        127.0
            * (load.powf(0.87)
                * (s_ft2 / 100.0).powf(1.2)
                * (m_to_ft(tail.arm_m) / 10.0).powf(0.483)
                * (span_ft / root_thickness_ft).sqrt())
            .powf(0.458)
    });

    let vertical_tail_lb = vehicle.vertical_tail.as_ref().map_or(0.0, |tail| {
        let s_ft2 = m2_to_ft2(tail.area_m2);
        let span_ft = m_to_ft(tail.span_m());
        let root_thickness_ft = m_to_ft(tail.thickness_to_chord * tail.area_m2 / tail.span_m());
        98.5 * (load.powf(0.87) * (s_ft2 / 100.0).powf(1.2) * (span_ft / root_thickness_ft).sqrt())
            .powf(0.458)
    });

    StructureWeight {
        fuselage_kg: lb_to_kg(fuselage_lb),
        wing_kg: lb_to_kg(wing_lb),
        horizontal_tail_kg: lb_to_kg(horizontal_tail_lb),
        vertical_tail_kg: lb_to_kg(vertical_tail_lb),
        landing_gear_kg: LANDING_GEAR_FRACTION * inputs.takeoff_weight_kg,
        booms_kg: boom_weight(vehicle, inputs.max_rotor_thrust_each_n),
        total_kg: 0.0,
    }
}

// Lumped airframe regression; the fuselage slot carries everything but gear
// and booms so the breakdown still sums.
fn m4_structure(vehicle: &Vehicle, inputs: &StructureInputs) -> StructureWeight {
    let airframe_lb = kg_to_lb((inputs.takeoff_weight_kg - inputs.battery_weight_kg).max(0.0));
    let v_kt = ms_to_knots(inputs.cruise_speed_m_s).max(1.0);
    let lifting_ft2: f64 = [
        vehicle.wing.as_ref().map(|w| w.area_m2),
        vehicle.horizontal_tail.as_ref().map(|t| t.area_m2),
        vehicle.vertical_tail.as_ref().map(|t| t.area_m2),
    ]
    .into_iter()
    .flatten()
    .map(m2_to_ft2)
    .sum();
    let airframe = 0.55
        * airframe_lb.powf(0.82)
        * (v_kt / 100.0).powf(0.23)
        * (vehicle.ultimate_load_factor / 3.8).powf(0.36)
        * (1.0 + lifting_ft2 / 1_000.0);

    StructureWeight {
        fuselage_kg: lb_to_kg(airframe),
        wing_kg: 0.0,
        horizontal_tail_kg: 0.0,
        vertical_tail_kg: 0.0,
        landing_gear_kg: LANDING_GEAR_FRACTION * inputs.takeoff_weight_kg,
        booms_kg: boom_weight(vehicle, inputs.max_rotor_thrust_each_n),
        total_kg: 0.0,
    }
}

/// Flight controls, avionics and furnishings (kg); a function of takeoff weight only.
pub fn equipment_weight(vehicle: &Vehicle, takeoff_weight_kg: f64) -> f64 {
    let w_lb = kg_to_lb(takeoff_weight_kg.max(0.0));
    let flight_controls = lb_to_kg(1.066 * w_lb.powf(0.626));
    (flight_controls + EQUIPMENT_FRACTION * takeoff_weight_kg) * vehicle.tech_factors.equipment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_weight_falls_with_density() {
        let mut battery = Vehicle::reference_multirotor().battery;
        let low = battery_weight(100_000.0, &battery);
        battery.density_wh_kg = 400.0;
        let high = battery_weight(100_000.0, &battery);
        assert!(high < low);
    }

    #[test]
    fn technology_factor_scales_structure() {
        let mut vehicle = Vehicle::reference_lift_plus_cruise();
        let inputs = StructureInputs {
            takeoff_weight_kg: 2_000.0,
            battery_weight_kg: 600.0,
            cruise_speed_m_s: 60.0,
            max_rotor_thrust_each_n: 2_500.0,
        };
        vehicle.tech_factors.structure = 1.0;
        let full = structure_weight(StructureModel::Roskam, &vehicle, &inputs);
        vehicle.tech_factors.structure = 0.5;
        let half = structure_weight(StructureModel::Roskam, &vehicle, &inputs);
        assert!((half.total_kg - 0.5 * full.total_kg).abs() < 1e-9);
        assert!(full.wing_kg > 0.0 && full.horizontal_tail_kg > 0.0);
    }

    #[test]
    fn rotor_weight_grows_with_thrust() {
        let rotor = Vehicle::reference_multirotor().lift_rotor;
        let light = rotor_group_weight(RotorWeightModel::ThrustBased, &rotor, 2_000.0, 0.0);
        let heavy = rotor_group_weight(RotorWeightModel::ThrustBased, &rotor, 4_000.0, 0.0);
        assert!(heavy > light);
    }
}
