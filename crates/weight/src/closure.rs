//! One evaluation of the weight balance at an assumed takeoff weight.

use evtol_mission::Mission;
use evtol_power::{MissionPower, PowerSettings, evaluate_mission};
use evtol_vehicle::Vehicle;
use serde::Serialize;

use crate::WeightError;
use crate::fidelity::Fidelity;
use crate::regressions::{
    PropulsionWeight, StructureInputs, StructureWeight, battery_weight, equipment_weight,
    propulsion_weight, structure_weight,
};

/// Component weights computed from one mission evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightBreakdown {
    pub payload_kg: f64,
    pub battery_kg: f64,
    pub propulsion: PropulsionWeight,
    pub structure: StructureWeight,
    pub equipment_kg: f64,
}

impl WeightBreakdown {
    /// Propulsion, structure and equipment.
    pub fn empty_kg(&self) -> f64 {
        self.propulsion.total_kg + self.structure.total_kg + self.equipment_kg
    }

    /// Sum of every component.
    pub fn total_kg(&self) -> f64 {
        self.payload_kg + self.battery_kg + self.empty_kg()
    }
}

/// Airframe weights frozen by a maximum-takeoff sizing pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FixedEmptyWeight {
    pub propulsion: PropulsionWeight,
    pub structure: StructureWeight,
    pub equipment_kg: f64,
}

impl FixedEmptyWeight {
    pub fn from_breakdown(breakdown: &WeightBreakdown) -> Self {
        Self {
            propulsion: breakdown.propulsion,
            structure: breakdown.structure,
            equipment_kg: breakdown.equipment_kg,
        }
    }

    pub fn total_kg(&self) -> f64 {
        self.propulsion.total_kg + self.structure.total_kg + self.equipment_kg
    }
}

/// Power, weights and closure error at one takeoff weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosurePoint {
    pub takeoff_weight_kg: f64,
    pub power: MissionPower,
    pub breakdown: WeightBreakdown,
    /// Signed `W - ΣW` (kg).
    pub closure_error_kg: f64,
}

impl ClosurePoint {
    /// Squared closure error (kg²).
    pub fn residual(&self) -> f64 {
        self.closure_error_kg * self.closure_error_kg
    }
}

/// Evaluate the mission at `takeoff_weight_kg` and rebuild every component weight.
///
/// With `fixed` set, propulsion, structure and equipment come from that
/// sized airframe and only the battery follows the new energy requirement.
pub fn evaluate_point(
    vehicle: &Vehicle,
    mission: &Mission,
    fidelity: &Fidelity,
    settings: &PowerSettings,
    takeoff_weight_kg: f64,
    fixed: Option<&FixedEmptyWeight>,
) -> Result<ClosurePoint, WeightError> {
    let power = evaluate_mission(vehicle, mission, settings, takeoff_weight_kg)?;
    let battery_kg = battery_weight(power.energy_wh, &vehicle.battery);

    let breakdown = match fixed {
        Some(fixed) => WeightBreakdown {
            payload_kg: vehicle.payload_kg(),
            battery_kg,
            propulsion: fixed.propulsion,
            structure: fixed.structure,
            equipment_kg: fixed.equipment_kg,
        },
        None => {
            let inputs = StructureInputs {
                takeoff_weight_kg,
                battery_weight_kg: battery_kg,
                cruise_speed_m_s: mission.cruise_segment().speed_m_s,
                max_rotor_thrust_each_n: power.sizing.lift_rotor_thrust_each_n,
            };
            WeightBreakdown {
                payload_kg: vehicle.payload_kg(),
                battery_kg,
                propulsion: propulsion_weight(fidelity.rotor_weight, vehicle, &power.sizing),
                structure: structure_weight(fidelity.structure, vehicle, &inputs),
                equipment_kg: equipment_weight(vehicle, takeoff_weight_kg),
            }
        }
    };

    Ok(ClosurePoint {
        takeoff_weight_kg,
        closure_error_kg: takeoff_weight_kg - breakdown.total_kg(),
        breakdown,
        power,
    })
}
