//! Takeoff-weight closure for one vehicle, mission and fidelity.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use evtol_aero::WettedAreas;
use evtol_core::outputs::{OutputError, Outputs};
use evtol_core::units::{Unit, rad_s_to_rpm};
use evtol_mission::Mission;
use evtol_power::{HoverModel, PowerSettings};
use evtol_solver::{
    ConstraintBounds, MinimizeOptions, NewtonOptions, NlpEvaluation, NlpProblem, minimize, newton,
};
use evtol_vehicle::Vehicle;
use serde::Serialize;
use tracing::{debug, warn};

use crate::WeightError;
use crate::closure::{ClosurePoint, FixedEmptyWeight, evaluate_point};
use crate::fidelity::Fidelity;
use crate::report::point_outputs;

/// Blade pitch range explored when the optimizer owns the lift-rotor twist (deg).
const TWIST_BOUNDS_DEG: (f64, f64) = (2.0, 30.0);
/// Closure error scale in the optimization-mode objective (kg).
const CLOSURE_SCALE_KG: f64 = 10.0;

/// Weight regime of an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WeightType {
    /// Size the airframe: every component follows the takeoff weight.
    Maximum,
    /// Fly a sized airframe: only battery and total weight re-solve.
    Gross,
}

impl FromStr for WeightType {
    type Err = WeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "maximum" | "max" | "mtow" => Ok(WeightType::Maximum),
            "gross" | "gtow" => Ok(WeightType::Gross),
            _ => Err(WeightError::UnknownWeightType(s.to_string())),
        }
    }
}

impl fmt::Display for WeightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeightType::Maximum => "maximum",
            WeightType::Gross => "gross",
        })
    }
}

/// Closure strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolvedBy {
    /// Scalar Newton iteration on the signed closure error.
    NonlinearSolver,
    /// Bounded minimization of the squared closure error; required when the
    /// hover model trims rotor speed internally.
    Optimization,
}

impl FromStr for SolvedBy {
    type Err = WeightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nonlinear_solver" | "nonlinearsolver" | "newton" => Ok(SolvedBy::NonlinearSolver),
            "optimization" | "optimisation" => Ok(SolvedBy::Optimization),
            _ => Err(WeightError::UnknownSolvedBy(s.to_string())),
        }
    }
}

impl fmt::Display for SolvedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolvedBy::NonlinearSolver => "nonlinear_solver",
            SolvedBy::Optimization => "optimization",
        })
    }
}

/// Lifecycle of an analysis. `Sized` is terminal; a changed vehicle, mission
/// or fidelity gets a fresh analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SizingState {
    Unsized,
    /// No evaluation has converged yet.
    Sizing,
    Sized,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosureOptions {
    /// Admissible squared closure error (kg²).
    pub tolerance_kg2: f64,
    pub max_iterations: usize,
    /// Takeoff weight search interval (kg).
    pub bounds_kg: (f64, f64),
    /// Settings for the optimization-mode closure.
    pub minimize: MinimizeOptions,
}

impl Default for ClosureOptions {
    fn default() -> Self {
        Self {
            tolerance_kg2: 1e-3,
            max_iterations: 100,
            bounds_kg: (50.0, 20_000.0),
            minimize: MinimizeOptions::default(),
        }
    }
}

/// Weight summary of a vehicle after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleWeight {
    pub max_takeoff_kg: f64,
    /// Set by gross evaluations only.
    pub gross_takeoff_kg: Option<f64>,
    pub payload_kg: f64,
    pub battery_kg: f64,
    pub propulsion_kg: f64,
    pub structure_kg: f64,
    pub equipment_kg: f64,
    /// Whether propulsion, structure and equipment are fixed by a converged sizing.
    pub is_sized: bool,
}

impl VehicleWeight {
    /// Weights of a vehicle nothing has been computed for.
    pub fn not_sized() -> Self {
        Self {
            max_takeoff_kg: 0.0,
            gross_takeoff_kg: None,
            payload_kg: 0.0,
            battery_kg: 0.0,
            propulsion_kg: 0.0,
            structure_kg: 0.0,
            equipment_kg: 0.0,
            is_sized: false,
        }
    }
}

/// Immutable outcome of [`WeightAnalysis::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct SizingResult {
    pub weight_type: WeightType,
    pub solved_by: SolvedBy,
    pub point: ClosurePoint,
    pub weights: VehicleWeight,
    /// Vehicle the point was evaluated on, with any optimizer-owned twist applied.
    pub vehicle: Vehicle,
    pub mission: Mission,
    /// Hover rotor speeds owned by the optimizer (segment id → rpm).
    pub hover_rpm: BTreeMap<usize, f64>,
    pub iterations: usize,
    pub evaluations: usize,
    /// The closure error reached tolerance.
    pub closure_converged: bool,
    /// Closure and every inner solve converged.
    pub converged: bool,
    pub state: SizingState,
    pub message: String,
}

impl SizingResult {
    pub fn takeoff_weight_kg(&self) -> f64 {
        self.point.takeoff_weight_kg
    }

    /// Squared closure error (kg²).
    pub fn residual(&self) -> f64 {
        self.point.residual()
    }

    pub fn energy_wh(&self) -> f64 {
        self.point.power.energy_wh
    }

    /// Airframe weights a gross evaluation holds fixed.
    pub fn fixed_empty_weight(&self) -> FixedEmptyWeight {
        FixedEmptyWeight::from_breakdown(&self.point.breakdown)
    }

    pub fn outputs(&self) -> Outputs {
        let mut outputs = point_outputs(&self.vehicle, &self.mission, &self.point);
        outputs.insert("Weight|max_takeoff", self.weights.max_takeoff_kg, Unit::Kilogram);
        if let Some(gross) = self.weights.gross_takeoff_kg {
            outputs.insert("Weight|gross_takeoff", gross, Unit::Kilogram);
        }
        outputs.insert(
            "LiftRotor|global_twist",
            self.vehicle.lift_rotor.global_twist_deg,
            Unit::Degree,
        );
        outputs
    }

    /// Named output converted to `unit`.
    pub fn get(&self, name: &str, unit: Unit) -> Result<f64, OutputError> {
        self.outputs().get(name, unit)
    }
}

/// Weight closure of one vehicle flying one mission.
#[derive(Debug, Clone)]
pub struct WeightAnalysis {
    vehicle: Vehicle,
    mission: Mission,
    fidelity: Fidelity,
    settings: PowerSettings,
    weight_type: WeightType,
    solved_by: SolvedBy,
    fixed: Option<FixedEmptyWeight>,
    max_takeoff_kg: Option<f64>,
    options: ClosureOptions,
    state: SizingState,
}

impl WeightAnalysis {
    /// Maximum takeoff weight sizing.
    ///
    /// A gross regime needs the sized airframe and is only reachable through
    /// [`WeightAnalysis::gross`]; asking for it here is an error.
    pub fn new(
        vehicle: Vehicle,
        mission: Mission,
        fidelity: Fidelity,
        weight_type: WeightType,
        solved_by: SolvedBy,
    ) -> Result<Self, WeightError> {
        if weight_type == WeightType::Gross {
            return Err(WeightError::NotSized);
        }
        Self::build(vehicle, mission, fidelity, WeightType::Maximum, solved_by, None)
    }

    /// Gross takeoff weight of the airframe sized by `sized`, flown by `vehicle`
    /// (typically the same geometry with another battery) on `mission`.
    pub fn gross(
        vehicle: Vehicle,
        mission: Mission,
        fidelity: Fidelity,
        solved_by: SolvedBy,
        sized: &SizingResult,
    ) -> Result<Self, WeightError> {
        if !sized.weights.is_sized || sized.weight_type != WeightType::Maximum {
            return Err(WeightError::NotSized);
        }
        let mut analysis = Self::build(
            vehicle,
            mission,
            fidelity,
            WeightType::Gross,
            solved_by,
            Some(sized.fixed_empty_weight()),
        )?;
        analysis.max_takeoff_kg = Some(sized.weights.max_takeoff_kg);
        Ok(analysis)
    }

    fn build(
        vehicle: Vehicle,
        mission: Mission,
        fidelity: Fidelity,
        weight_type: WeightType,
        solved_by: SolvedBy,
        fixed: Option<FixedEmptyWeight>,
    ) -> Result<Self, WeightError> {
        vehicle.validate()?;
        fidelity.validate(vehicle.configuration)?;
        if solved_by == SolvedBy::NonlinearSolver && fidelity.hover.has_inner_trim() {
            return Err(WeightError::IncompatibleSolver {
                hover: fidelity.hover.name(),
            });
        }
        let vehicle = match fidelity.stability {
            Some(tails) => tails.apply(&vehicle),
            None => vehicle,
        };
        Ok(Self {
            settings: fidelity.power_settings(),
            vehicle,
            mission,
            fidelity,
            weight_type,
            solved_by,
            fixed,
            max_takeoff_kg: None,
            options: ClosureOptions::default(),
            state: SizingState::Unsized,
        })
    }

    pub fn with_options(mut self, options: ClosureOptions) -> Self {
        self.options = options;
        self
    }

    /// Use externally supplied wetted areas in the component drag build-up.
    pub fn with_wetted_areas(mut self, wetted: WettedAreas) -> Self {
        self.settings.wetted = Some(wetted);
        self
    }

    pub fn state(&self) -> SizingState {
        self.state
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn fidelity(&self) -> &Fidelity {
        &self.fidelity
    }

    pub fn weight_type(&self) -> WeightType {
        self.weight_type
    }

    /// One pass of the weight balance at `takeoff_weight_kg`, without iterating.
    pub fn evaluate_at(&self, takeoff_weight_kg: f64) -> Result<ClosurePoint, WeightError> {
        evaluate_point(
            &self.vehicle,
            &self.mission,
            &self.fidelity,
            &self.settings,
            takeoff_weight_kg,
            self.fixed.as_ref(),
        )
    }

    /// Close the weight balance starting from `guess_kg`.
    ///
    /// Non-convergence is reported through the result flags; only invalid
    /// inputs produce an `Err`.
    pub fn evaluate(&mut self, guess_kg: f64) -> Result<SizingResult, WeightError> {
        if self.state != SizingState::Sized {
            self.state = SizingState::Sizing;
        }
        let (lo, hi) = self.options.bounds_kg;
        let guess = guess_kg.clamp(lo, hi);
        // surfaces input errors before any iteration
        let start = self.evaluate_at(guess)?;

        let result = match self.solved_by {
            SolvedBy::NonlinearSolver => self.close_with_newton(guess)?,
            SolvedBy::Optimization => self.close_with_minimizer(&start)?,
        };
        if result.converged {
            self.state = SizingState::Sized;
            debug!(
                weight_type = %self.weight_type,
                solved_by = %self.solved_by,
                takeoff_kg = result.takeoff_weight_kg(),
                energy_wh = result.energy_wh(),
                iterations = result.iterations,
                "weight closure converged"
            );
        } else {
            warn!(
                weight_type = %self.weight_type,
                solved_by = %self.solved_by,
                takeoff_kg = result.takeoff_weight_kg(),
                residual = result.residual(),
                message = %result.message,
                "weight closure did not converge"
            );
        }
        Ok(result)
    }

    fn close_with_newton(&self, guess: f64) -> Result<SizingResult, WeightError> {
        let options = NewtonOptions {
            abs_tolerance: self.options.tolerance_kg2.sqrt(),
            rel_step_tolerance: 0.0,
            max_iterations: self.options.max_iterations,
            max_backtracks: 12,
            fd_step: 1e-6,
            bounds: Some(self.options.bounds_kg),
        };
        let root = newton(
            |w| {
                self.evaluate_at(w)
                    .map_or(f64::NAN, |point| point.closure_error_kg)
            },
            guess,
            &options,
        );
        let point = self.evaluate_at(root.root)?;
        let closure_converged = root.converged && point.residual() < self.options.tolerance_kg2;
        let message = if closure_converged {
            "closure error within tolerance".to_string()
        } else {
            format!(
                "closure error {:.3e} kg after {} iterations",
                point.closure_error_kg, root.iterations
            )
        };
        Ok(self.finish(
            point,
            self.vehicle.clone(),
            BTreeMap::new(),
            root.iterations,
            root.evaluations,
            closure_converged,
            message,
        ))
    }

    fn close_with_minimizer(&self, start: &ClosurePoint) -> Result<SizingResult, WeightError> {
        let mut problem = ClosureProblem::new(self, start);
        let x0 = problem.initial_point(start.takeoff_weight_kg);
        let outcome = minimize(&mut problem, &x0, &self.options.minimize)?;
        debug!(
            iterations = outcome.iterations,
            objective = outcome.objective,
            violation = outcome.max_violation,
            "closure minimization finished"
        );

        let (weight, settings, vehicle) = problem.unpack(&outcome.x);
        let point = evaluate_point(
            &vehicle,
            &self.mission,
            &self.fidelity,
            &settings,
            weight,
            self.fixed.as_ref(),
        )?;
        let closure_converged = outcome.success && point.residual() < self.options.tolerance_kg2;
        Ok(self.finish(
            point,
            vehicle,
            settings.hover_rpm,
            outcome.iterations,
            outcome.evaluations,
            closure_converged,
            outcome.message,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        point: ClosurePoint,
        vehicle: Vehicle,
        hover_rpm: BTreeMap<usize, f64>,
        iterations: usize,
        evaluations: usize,
        closure_converged: bool,
        message: String,
    ) -> SizingResult {
        let converged = closure_converged
            && point.power.converged
            && point
                .power
                .segments
                .iter()
                .all(|s| s.lift_rotor.thrust_residual.abs() <= self.options.minimize.feasibility_tolerance);
        let breakdown = &point.breakdown;
        let weights = VehicleWeight {
            max_takeoff_kg: self.max_takeoff_kg.unwrap_or(point.takeoff_weight_kg),
            gross_takeoff_kg: match self.weight_type {
                WeightType::Gross => Some(point.takeoff_weight_kg),
                WeightType::Maximum => None,
            },
            payload_kg: breakdown.payload_kg,
            battery_kg: breakdown.battery_kg,
            propulsion_kg: breakdown.propulsion.total_kg,
            structure_kg: breakdown.structure.total_kg,
            equipment_kg: breakdown.equipment_kg,
            is_sized: match self.weight_type {
                WeightType::Maximum => converged,
                WeightType::Gross => true,
            },
        };
        SizingResult {
            weight_type: self.weight_type,
            solved_by: self.solved_by,
            point,
            weights,
            vehicle,
            mission: self.mission.clone(),
            hover_rpm,
            iterations,
            evaluations,
            closure_converged,
            converged,
            state: if converged {
                SizingState::Sized
            } else {
                SizingState::Sizing
            },
            message,
        }
    }
}

/// Gross takeoff weight of `mtow`'s airframe flown by `vehicle` on `mission`.
pub fn evaluate_gtow(
    vehicle: Vehicle,
    mission: Mission,
    fidelity: Fidelity,
    solved_by: SolvedBy,
    mtow: &SizingResult,
    guess_kg: f64,
) -> Result<SizingResult, WeightError> {
    WeightAnalysis::gross(vehicle, mission, fidelity, solved_by, mtow)?.evaluate(guess_kg)
}

/// Closure posed for the minimizer: takeoff weight, plus hover rotor speeds
/// and lift-rotor pitch when the hover model trims rotor speed internally.
struct ClosureProblem<'a> {
    analysis: &'a WeightAnalysis,
    hover_ids: Vec<usize>,
    /// Warm-start rotor speeds from the internal trim at the initial weight.
    hover_rpm0: Vec<f64>,
    bounds: Vec<(f64, f64)>,
    owns_rotor: bool,
}

impl<'a> ClosureProblem<'a> {
    fn new(analysis: &'a WeightAnalysis, start: &ClosurePoint) -> Self {
        let mut bounds = vec![analysis.options.bounds_kg];
        let mut hover_ids = Vec::new();
        let mut hover_rpm0 = Vec::new();
        let owns_rotor = analysis.fidelity.hover.has_inner_trim();

        if let HoverModel::BladeElementMomentumTheory(bemt) = analysis.fidelity.hover {
            let rotor = &analysis.vehicle.lift_rotor;
            for segment in analysis.mission.segments().iter().filter(|s| s.kind.is_hover()) {
                let max_rpm = rad_s_to_rpm(
                    bemt.max_tip_mach * segment.constants.sound_speed_m_s / rotor.radius_m,
                );
                let trimmed = start
                    .power
                    .segment(segment.id)
                    .map_or(rotor.rpm.hover, |s| s.lift_rotor.rpm);
                hover_ids.push(segment.id);
                hover_rpm0.push(trimmed.clamp(bemt.min_rpm, max_rpm));
                bounds.push((bemt.min_rpm, max_rpm));
            }
            bounds.push(TWIST_BOUNDS_DEG);
        }

        Self {
            analysis,
            hover_ids,
            hover_rpm0,
            bounds,
            owns_rotor,
        }
    }

    fn initial_point(&self, weight_kg: f64) -> Vec<f64> {
        let mut x = vec![weight_kg];
        if self.owns_rotor {
            x.extend(self.hover_rpm0.iter().copied());
            x.push(
                self.analysis
                    .vehicle
                    .lift_rotor
                    .global_twist_deg
                    .clamp(TWIST_BOUNDS_DEG.0, TWIST_BOUNDS_DEG.1),
            );
        }
        x
    }

    fn unpack(&self, x: &[f64]) -> (f64, PowerSettings, Vehicle) {
        let mut settings = self.analysis.settings.clone();
        let mut vehicle = self.analysis.vehicle.clone();
        if self.owns_rotor {
            settings.hover_rpm = self
                .hover_ids
                .iter()
                .zip(&x[1..])
                .map(|(&id, &rpm)| (id, rpm))
                .collect();
            if let Some(&twist) = x.last() {
                vehicle.lift_rotor.global_twist_deg = twist;
            }
        }
        (x[0], settings, vehicle)
    }
}

impl NlpProblem for ClosureProblem<'_> {
    fn variable_bounds(&self) -> Vec<(f64, f64)> {
        self.bounds.clone()
    }

    fn constraint_bounds(&self) -> Vec<ConstraintBounds> {
        vec![ConstraintBounds::equality(0.0); self.hover_ids.len()]
    }

    fn evaluate(&mut self, x: &[f64]) -> NlpEvaluation {
        let (weight, settings, vehicle) = self.unpack(x);
        let analysis = self.analysis;
        match evaluate_point(
            &vehicle,
            &analysis.mission,
            &analysis.fidelity,
            &settings,
            weight,
            analysis.fixed.as_ref(),
        ) {
            Ok(point) => NlpEvaluation {
                objective: (point.closure_error_kg / CLOSURE_SCALE_KG).powi(2),
                constraints: self
                    .hover_ids
                    .iter()
                    .map(|&id| {
                        point
                            .power
                            .segment(id)
                            .map_or(f64::NAN, |s| s.lift_rotor.thrust_residual)
                    })
                    .collect(),
            },
            Err(_) => NlpEvaluation {
                objective: f64::NAN,
                constraints: vec![f64::NAN; self.hover_ids.len()],
            },
        }
    }
}
