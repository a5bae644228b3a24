//! Grid sweeps over range, cruise speed and battery density.
//!
//! Points run in grid order and each one starts from the takeoff weight of
//! the last point that converged. A point that fails becomes a row of NaN
//! values; the sweep itself never stops early.

use evtol_core::outputs::Outputs;
use evtol_core::units::Unit;
use evtol_mission::{Mission, StandardProfile};
use evtol_vehicle::{PointOverride, Vehicle};
use evtol_weight::{ClosureOptions, Fidelity, SolvedBy, WeightAnalysis, WeightType};
use serde::Serialize;
use tracing::{info, warn};

use crate::DesignError;
use crate::problem::DesignProblem;

/// Quantities every sweep row reports, NaN when the point failed.
pub const SWEEP_OUTPUTS: [(&str, Unit); 8] = [
    ("Weight|takeoff", Unit::Kilogram),
    ("Weight|battery", Unit::Kilogram),
    ("Weight|propulsion", Unit::Kilogram),
    ("Weight|structure", Unit::Kilogram),
    ("Weight|equipment", Unit::Kilogram),
    ("Weight|residual", Unit::SquareKilogram),
    ("Energy|entire_mission", Unit::KilowattHour),
    ("Mission|total_time", Unit::Minute),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepGrid {
    pub ranges_km: Vec<f64>,
    pub cruise_speeds_m_s: Vec<f64>,
    pub battery_densities_wh_kg: Vec<f64>,
}

impl SweepGrid {
    pub fn len(&self) -> usize {
        self.ranges_km.len() * self.cruise_speeds_m_s.len() * self.battery_densities_wh_kg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grid points in sweep order: range, then speed, then density.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.ranges_km.iter().flat_map(move |&range| {
            self.cruise_speeds_m_s.iter().flat_map(move |&speed| {
                self.battery_densities_wh_kg
                    .iter()
                    .map(move |&density| (range, speed, density))
            })
        })
    }
}

/// What runs at each grid point.
#[derive(Debug, Clone)]
pub enum SweepMode {
    /// Maximum-takeoff closure of the fixed vehicle.
    Sizing(SolvedBy),
    /// The given problem, with its vehicle and mission replaced per point.
    Optimization(Box<DesignProblem>),
}

#[derive(Debug, Clone)]
pub struct SweepSetup {
    pub vehicle: Vehicle,
    pub fidelity: Fidelity,
    /// Template for every point's mission; range and cruise speed are replaced.
    pub profile: StandardProfile,
    pub mode: SweepMode,
    /// Closure settings of sizing-mode points.
    pub closure: ClosureOptions,
    /// Takeoff weight guess used until a point converges (kg).
    pub default_guess_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub range_km: f64,
    pub cruise_speed_m_s: f64,
    pub battery_density_wh_kg: f64,
    pub success: bool,
    pub message: String,
    /// Values of [`SWEEP_OUTPUTS`] in their listed units.
    pub values: Vec<f64>,
}

impl SweepRow {
    fn failed(range_km: f64, speed: f64, density: f64, message: String) -> Self {
        Self {
            range_km,
            cruise_speed_m_s: speed,
            battery_density_wh_kg: density,
            success: false,
            message,
            values: vec![f64::NAN; SWEEP_OUTPUTS.len()],
        }
    }

    pub fn takeoff_weight_kg(&self) -> f64 {
        self.values[0]
    }

    /// Grid coordinates followed by the reported quantities.
    pub fn outputs(&self) -> Outputs {
        let mut outputs = Outputs::new();
        outputs.insert("Mission|range", self.range_km, Unit::Kilometre);
        outputs.insert("Mission|cruise_speed", self.cruise_speed_m_s, Unit::MetrePerSecond);
        outputs.insert("Battery|density", self.battery_density_wh_kg, Unit::Dimensionless);
        outputs.insert("success", if self.success { 1.0 } else { 0.0 }, Unit::Dimensionless);
        for ((name, unit), &value) in SWEEP_OUTPUTS.iter().zip(&self.values) {
            outputs.insert(*name, value, *unit);
        }
        outputs
    }
}

fn values_from(outputs: &Outputs) -> Vec<f64> {
    SWEEP_OUTPUTS
        .iter()
        .map(|(name, unit)| outputs.get(name, *unit).unwrap_or(f64::NAN))
        .collect()
}

fn run_point(
    setup: &SweepSetup,
    range_km: f64,
    speed: f64,
    density: f64,
    guess_kg: f64,
) -> Result<(bool, String, Vec<f64>), DesignError> {
    let mission = Mission::standard(&setup.profile.retargeted(range_km, speed))?;
    let vehicle = setup
        .vehicle
        .with_override(&PointOverride::battery_density(density));

    match &setup.mode {
        SweepMode::Sizing(solved_by) => {
            let result = WeightAnalysis::new(
                vehicle,
                mission,
                setup.fidelity,
                WeightType::Maximum,
                *solved_by,
            )?
            .with_options(setup.closure)
            .evaluate(guess_kg)?;
            Ok((result.converged, result.message.clone(), values_from(&result.outputs())))
        }
        SweepMode::Optimization(template) => {
            let mut problem = (**template).clone();
            problem.vehicle = vehicle;
            problem.mission = mission;
            problem.fidelity = setup.fidelity;
            if problem.weight_is_design_variable() {
                problem.set_initial_value("Weight|takeoff", guess_kg);
            } else {
                problem.closure_guess_kg = guess_kg;
            }
            let result = problem.run_optimization()?;
            Ok((result.success, result.message.clone(), values_from(&result.outputs)))
        }
    }
}

/// Run every grid point. Failed points are reported, never propagated.
pub fn run_sweep(setup: &SweepSetup, grid: &SweepGrid) -> Vec<SweepRow> {
    let mut guess = setup.default_guess_kg;
    let mut rows = Vec::with_capacity(grid.len());

    for (range_km, speed, density) in grid.points() {
        let row = match run_point(setup, range_km, speed, density, guess) {
            Ok((true, message, values)) => {
                if values[0].is_finite() {
                    guess = values[0];
                }
                SweepRow {
                    range_km,
                    cruise_speed_m_s: speed,
                    battery_density_wh_kg: density,
                    success: true,
                    message,
                    values,
                }
            }
            Ok((false, message, _)) => SweepRow::failed(range_km, speed, density, message),
            Err(err) => SweepRow::failed(range_km, speed, density, err.to_string()),
        };
        if !row.success {
            warn!(range_km, speed, density, message = %row.message, "sweep point failed");
        }
        rows.push(row);
    }

    let converged = rows.iter().filter(|r| r.success).count();
    info!(points = rows.len(), converged, "sweep finished");
    rows
}
