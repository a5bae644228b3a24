//! JSON summary of a sizing run.

use std::io::Write;
use std::path::Path;

use evtol_core::units::Unit;
use evtol_vehicle::Configuration;
use evtol_weight::{SizingResult, SolvedBy, VehicleWeight, WeightType};
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{ExportError, writer_for_path};

/// Serialized view of a [`SizingResult`].
#[derive(Debug, Serialize)]
pub struct SizingSummary<'a> {
    pub vehicle: &'a str,
    pub configuration: Configuration,
    pub weight_type: WeightType,
    pub solved_by: SolvedBy,
    pub converged: bool,
    pub closure_converged: bool,
    pub iterations: usize,
    pub evaluations: usize,
    pub message: &'a str,
    pub takeoff_weight_kg: f64,
    pub residual_kg2: f64,
    pub energy_wh: f64,
    pub weights: VehicleWeight,
    pub outputs: Vec<OutputEntry>,
}

/// One named output in the summary.
#[derive(Debug, Serialize)]
pub struct OutputEntry {
    pub name: String,
    pub value: f64,
    pub unit: Unit,
}

impl<'a> SizingSummary<'a> {
    pub fn new(result: &'a SizingResult) -> Self {
        Self {
            vehicle: &result.vehicle.name,
            configuration: result.vehicle.configuration,
            weight_type: result.weight_type,
            solved_by: result.solved_by,
            converged: result.converged,
            closure_converged: result.closure_converged,
            iterations: result.iterations,
            evaluations: result.evaluations,
            message: &result.message,
            takeoff_weight_kg: result.takeoff_weight_kg(),
            residual_kg2: result.residual(),
            energy_wh: result.energy_wh(),
            weights: result.weights,
            outputs: result
                .outputs()
                .iter()
                .map(|(name, q)| OutputEntry {
                    name: name.to_string(),
                    value: q.value,
                    unit: q.unit,
                })
                .collect(),
        }
    }
}

/// Write the summary of `result` as pretty JSON to `path` (`-` for stdout).
pub fn write_summary(path: &Path, result: &SizingResult) -> Result<(), ExportError> {
    let mut writer = writer_for_path(path)?;
    to_writer_pretty(&mut writer, &SizingSummary::new(result))?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use evtol_mission::{Mission, StandardProfile};
    use evtol_vehicle::Vehicle;
    use evtol_weight::{Fidelity, WeightAnalysis};

    #[test]
    fn summary_carries_breakdown_and_outputs() {
        let vehicle = Vehicle::reference_multirotor();
        let fidelity = Fidelity::baseline(vehicle.configuration);
        let mission = Mission::standard(&StandardProfile::new(50.0, 60.0)).expect("mission");
        let result = WeightAnalysis::new(
            vehicle,
            mission,
            fidelity,
            WeightType::Maximum,
            SolvedBy::NonlinearSolver,
        )
        .expect("analysis")
        .evaluate(1_500.0)
        .expect("evaluation");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("summary.json");
        write_summary(&path, &result).expect("summary written");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("readable"))
                .expect("valid json");
        assert_eq!(json["configuration"], "multirotor");
        assert_eq!(json["weight_type"], "Maximum");
        assert!(json["weights"]["battery_kg"].as_f64().expect("number") > 0.0);
        let outputs = json["outputs"].as_array().expect("array");
        let takeoff = outputs
            .iter()
            .find(|entry| entry["name"] == "Weight|takeoff")
            .expect("takeoff output");
        assert_eq!(takeoff["unit"], "kg");
    }
}
