//! Design-vector evaluation shared by the optimizer and the final report.

use evtol_core::outputs::Outputs;
use evtol_core::units::{Unit, convert};
use evtol_mission::Mission;
use evtol_solver::{ConstraintBounds, NlpEvaluation, NlpProblem};
use evtol_vehicle::{PointOverride, Vehicle};
use evtol_weight::{
    ClosurePoint, FixedEmptyWeight, SizingResult, SolvedBy, WeightAnalysis, WeightError,
    WeightType, evaluate_point, point_outputs,
};
use tracing::debug;

use crate::DesignError;
use crate::problem::{Constraint, DesignProblem, OffDesignPoint, ProblemKind};
use crate::variables::{DesignParameter, DesignVariable};

/// Closure error scale of the automatic closure constraint (kg).
const CLOSURE_REFERENCE_KG: f64 = 10.0;

/// How a point's airframe weights are obtained.
#[derive(Debug, Clone)]
pub(crate) enum Regime {
    Maximum,
    /// Flies the airframe sized by the first point of the same evaluation.
    GrossOnFirst,
    /// Flies an airframe sized before the run.
    GrossOn(Box<SizingResult>),
}

#[derive(Debug, Clone)]
pub(crate) struct PointSetup {
    /// Output prefix; empty for a single-point problem.
    pub name: String,
    pub overrides: PointOverride,
    pub weight: f64,
    pub regime: Regime,
}

/// Evaluated state of one point.
#[derive(Debug, Clone)]
pub(crate) struct PointState {
    pub name: String,
    pub vehicle: Vehicle,
    pub closure: ClosurePoint,
    /// Nested closure status; always `true` when weight is a design variable.
    pub closure_converged: bool,
    pub outputs: Outputs,
}

#[derive(Debug, Clone)]
pub(crate) struct Evaluation {
    pub points: Vec<PointState>,
    pub outputs: Outputs,
    /// Objective in the objective's unit.
    pub objective: f64,
    /// Constraint values in each constraint's unit.
    pub constraints: Vec<f64>,
}

/// Constraint bound to one concrete output name.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConstraint {
    pub output: String,
    pub spec: Constraint,
}

#[derive(Debug, Clone)]
enum ObjectiveTerm {
    Direct(String),
    /// Weighted sum of the same output over every point.
    Weighted(String),
}

/// Variable slot in the optimizer vector.
#[derive(Debug, Clone)]
struct Slot {
    parameter: DesignParameter,
    unit: Unit,
}

pub(crate) struct Evaluator<'a> {
    problem: &'a DesignProblem,
    points: Vec<PointSetup>,
    shared: Vec<(usize, Slot)>,
    /// Optimizer index of each point's takeoff weight.
    weight_slots: Option<(Vec<usize>, Unit)>,
    pub variables: Vec<DesignVariable>,
    pub constraints: Vec<ResolvedConstraint>,
    objective: ObjectiveTerm,
    warm_start: Vec<f64>,
    pub evaluations: usize,
}

fn prefixed(point: &str, name: &str) -> String {
    if point.is_empty() {
        name.to_string()
    } else {
        format!("{point}|{name}")
    }
}

fn point_setups(problem: &DesignProblem) -> Result<Vec<PointSetup>, DesignError> {
    let single = |regime| {
        vec![PointSetup {
            name: String::new(),
            overrides: PointOverride::default(),
            weight: 1.0,
            regime,
        }]
    };
    let missing = |what| DesignError::MissingOptions {
        kind: problem.kind,
        what,
    };

    let setups = match problem.kind {
        ProblemKind::SingleObjective => single(Regime::Maximum),
        ProblemKind::GrossTakeoff => {
            let sized = problem
                .sized_airframe
                .as_ref()
                .ok_or(DesignError::Weight(WeightError::NotSized))?;
            if !sized.weights.is_sized {
                return Err(WeightError::NotSized.into());
            }
            single(Regime::GrossOn(Box::new(sized.clone())))
        }
        ProblemKind::MultiPoint | ProblemKind::MultiPointWithFixedEmptyWeight => {
            let options = problem
                .multipoint_options
                .as_ref()
                .filter(|o| !o.points.is_empty())
                .ok_or_else(|| missing("multipoint options with at least one point"))?;
            options
                .points
                .iter()
                .enumerate()
                .map(|(i, point)| PointSetup {
                    name: point.name.clone(),
                    overrides: point.overrides.clone(),
                    weight: point.weight,
                    regime: if i > 0 && problem.kind == ProblemKind::MultiPointWithFixedEmptyWeight
                    {
                        Regime::GrossOnFirst
                    } else {
                        Regime::Maximum
                    },
                })
                .collect()
        }
        ProblemKind::OffDesign => {
            let options = problem
                .offdesign_options
                .as_ref()
                .ok_or_else(|| missing("off-design options"))?;
            let (on_weight, off_weight) = match options.objective_point {
                OffDesignPoint::OnDesign => (1.0, 0.0),
                OffDesignPoint::OffDesign => (0.0, 1.0),
            };
            vec![
                PointSetup {
                    name: "OnDesign".to_string(),
                    overrides: options.on_design.clone(),
                    weight: on_weight,
                    regime: Regime::Maximum,
                },
                PointSetup {
                    name: "OffDesign".to_string(),
                    overrides: options.off_design.clone(),
                    weight: off_weight,
                    regime: Regime::GrossOnFirst,
                },
            ]
        }
    };
    Ok(setups)
}

impl<'a> Evaluator<'a> {
    /// Lay out the optimizer vector and bind the objective and constraints to
    /// outputs of an evaluation at the initial design.
    pub fn new(problem: &'a DesignProblem) -> Result<Self, DesignError> {
        problem.vehicle.validate()?;
        problem
            .fidelity
            .validate(problem.vehicle.configuration)
            .map_err(DesignError::Weight)?;
        if problem.design_variables.is_empty() {
            return Err(DesignError::NoDesignVariables);
        }
        let points = point_setups(problem)?;

        let mut variables = Vec::new();
        let mut shared = Vec::new();
        let mut weight_variable = None;
        for variable in &problem.design_variables {
            let parameter = variable.resolve(problem.vehicle.configuration)?;
            if parameter == DesignParameter::TakeoffWeight {
                weight_variable = Some(variable.clone());
                continue;
            }
            shared.push((
                variables.len(),
                Slot {
                    parameter,
                    unit: variable.unit,
                },
            ));
            variables.push(variable.clone());
        }
        let weight_slots = weight_variable.map(|variable| {
            let slots = points
                .iter()
                .map(|point| {
                    variables.push(DesignVariable {
                        name: prefixed(&point.name, &variable.name),
                        ..variable.clone()
                    });
                    variables.len() - 1
                })
                .collect();
            (slots, variable.unit)
        });

        let mut evaluator = Self {
            problem,
            warm_start: vec![problem.closure_guess_kg; points.len()],
            points,
            shared,
            weight_slots,
            variables,
            constraints: Vec::new(),
            objective: ObjectiveTerm::Direct(problem.objective.name.clone()),
            evaluations: 0,
        };

        let x0 = evaluator.initial_point();
        let (points_state, outputs) = evaluator.evaluate_points(&x0)?;
        evaluator.objective = evaluator.bind_objective(&outputs, &points_state)?;
        evaluator.constraints = evaluator.bind_constraints(&outputs, &points_state)?;
        Ok(evaluator)
    }

    pub fn initial_point(&self) -> Vec<f64> {
        self.variables.iter().map(|v| v.initial).collect()
    }

    fn bind_objective(
        &self,
        outputs: &Outputs,
        points: &[PointState],
    ) -> Result<ObjectiveTerm, DesignError> {
        let name = &self.problem.objective.name;
        if outputs.contains(name) {
            return Ok(ObjectiveTerm::Direct(name.clone()));
        }
        if points.iter().all(|p| p.outputs.contains(name)) {
            return Ok(ObjectiveTerm::Weighted(name.clone()));
        }
        Err(DesignError::UnknownOutput(name.clone()))
    }

    fn bind_constraints(
        &self,
        outputs: &Outputs,
        points: &[PointState],
    ) -> Result<Vec<ResolvedConstraint>, DesignError> {
        let mut specs = self.problem.constraints.clone();
        let closes_weight = specs.iter().any(|c| {
            c.name.ends_with("Weight|closure_error") || c.name.ends_with("Weight|residual")
        });
        if self.weight_slots.is_some() && !closes_weight {
            specs.push(Constraint::equal(
                "Weight|closure_error",
                0.0,
                CLOSURE_REFERENCE_KG,
                Unit::Kilogram,
            ));
        }

        let mut resolved = Vec::new();
        for spec in specs {
            spec.validate()?;
            if outputs.contains(&spec.name) {
                resolved.push(ResolvedConstraint {
                    output: spec.name.clone(),
                    spec,
                });
                continue;
            }
            if points.is_empty() || !points.iter().all(|p| p.outputs.contains(&spec.name)) {
                return Err(DesignError::UnknownOutput(spec.name.clone()));
            }
            for point in points {
                resolved.push(ResolvedConstraint {
                    output: prefixed(&point.name, &spec.name),
                    spec: spec.clone(),
                });
            }
        }
        Ok(resolved)
    }

    /// Evaluate every point at design vector `x`.
    pub fn evaluate_points(
        &mut self,
        x: &[f64],
    ) -> Result<(Vec<PointState>, Outputs), DesignError> {
        self.evaluations += 1;
        let problem = self.problem;
        let mut vehicle = problem.vehicle.clone();
        let mut mission: Mission = problem.mission.clone();
        for (index, slot) in &self.shared {
            let value = convert(x[*index], slot.unit, slot.parameter.model_unit()).map_err(
                |source| DesignError::Unit {
                    name: slot.parameter.name().to_string(),
                    source,
                },
            )?;
            slot.parameter.apply(value, &mut vehicle, &mut mission)?;
        }

        let nested_solver = if problem.fidelity.hover.has_inner_trim() {
            SolvedBy::Optimization
        } else {
            SolvedBy::NonlinearSolver
        };

        let mut states: Vec<PointState> = Vec::with_capacity(self.points.len());
        let mut first_sized: Option<SizingResult> = None;
        for (i, setup) in self.points.iter().enumerate() {
            let point_vehicle = vehicle.with_override(&setup.overrides);
            let point_vehicle = match problem.fidelity.stability {
                Some(tails) => tails.apply(&point_vehicle),
                None => point_vehicle,
            };
            point_vehicle.validate()?;

            let (closure, closure_converged, max_takeoff) = match &self.weight_slots {
                Some((slots, unit)) => {
                    let weight = convert(x[slots[i]], *unit, Unit::Kilogram).map_err(|source| {
                        DesignError::Unit {
                            name: "Weight|takeoff".to_string(),
                            source,
                        }
                    })?;
                    let fixed = match &setup.regime {
                        Regime::Maximum => None,
                        Regime::GrossOnFirst => states
                            .first()
                            .map(|first| FixedEmptyWeight::from_breakdown(&first.closure.breakdown)),
                        Regime::GrossOn(sized) => Some(sized.fixed_empty_weight()),
                    };
                    let max_takeoff = match &setup.regime {
                        Regime::Maximum => weight,
                        Regime::GrossOnFirst => states
                            .first()
                            .map_or(weight, |first| first.closure.takeoff_weight_kg),
                        Regime::GrossOn(sized) => sized.weights.max_takeoff_kg,
                    };
                    let closure = evaluate_point(
                        &point_vehicle,
                        &mission,
                        &problem.fidelity,
                        &problem.fidelity.power_settings(),
                        weight,
                        fixed.as_ref(),
                    )?;
                    (closure, true, max_takeoff)
                }
                None => {
                    let analysis = match &setup.regime {
                        Regime::Maximum => WeightAnalysis::new(
                            point_vehicle.clone(),
                            mission.clone(),
                            problem.fidelity,
                            WeightType::Maximum,
                            nested_solver,
                        )?,
                        Regime::GrossOnFirst => WeightAnalysis::gross(
                            point_vehicle.clone(),
                            mission.clone(),
                            problem.fidelity,
                            nested_solver,
                            first_sized.as_ref().ok_or(WeightError::NotSized)?,
                        )?,
                        Regime::GrossOn(sized) => WeightAnalysis::gross(
                            point_vehicle.clone(),
                            mission.clone(),
                            problem.fidelity,
                            nested_solver,
                            sized,
                        )?,
                    };
                    let result = analysis
                        .with_options(problem.closure)
                        .evaluate(self.warm_start[i])?;
                    if result.converged {
                        self.warm_start[i] = result.takeoff_weight_kg();
                    }
                    let converged = result.converged;
                    let max_takeoff = result.weights.max_takeoff_kg;
                    let closure = result.point.clone();
                    if i == 0 {
                        first_sized = Some(result);
                    }
                    (closure, converged, max_takeoff)
                }
            };

            let mut outputs = point_outputs(&point_vehicle, &mission, &closure);
            outputs.insert("Weight|max_takeoff", max_takeoff, Unit::Kilogram);
            if !matches!(setup.regime, Regime::Maximum) {
                outputs.insert("Weight|gross_takeoff", closure.takeoff_weight_kg, Unit::Kilogram);
            }
            states.push(PointState {
                name: setup.name.clone(),
                vehicle: point_vehicle,
                closure,
                closure_converged,
                outputs,
            });
        }

        let combined = match states.as_slice() {
            [only] if only.name.is_empty() => only.outputs.clone(),
            _ => {
                let mut combined = Outputs::new();
                for state in &states {
                    combined.extend_prefixed(&state.name, &state.outputs);
                }
                combined
            }
        };
        Ok((states, combined))
    }

    /// Full evaluation with objective and constraint values.
    pub fn evaluate_design(&mut self, x: &[f64]) -> Result<Evaluation, DesignError> {
        let (points, outputs) = self.evaluate_points(x)?;
        let unit = self.problem.objective.unit;
        let lookup = |outputs: &Outputs, name: &str| {
            outputs
                .get(name, unit)
                .map_err(|_| DesignError::UnknownOutput(name.to_string()))
        };
        let objective = match &self.objective {
            ObjectiveTerm::Direct(name) => lookup(&outputs, name)?,
            ObjectiveTerm::Weighted(name) => {
                let mut total = 0.0;
                for (state, setup) in points.iter().zip(&self.points) {
                    total += setup.weight * lookup(&state.outputs, name)?;
                }
                total
            }
        };
        let mut constraints = Vec::with_capacity(self.constraints.len());
        for constraint in &self.constraints {
            let value = outputs
                .get(&constraint.output, constraint.spec.unit)
                .map_err(|_| DesignError::UnknownOutput(constraint.output.clone()))?;
            constraints.push(value);
        }
        Ok(Evaluation {
            points,
            outputs,
            objective,
            constraints,
        })
    }
}

impl NlpProblem for Evaluator<'_> {
    fn variable_bounds(&self) -> Vec<(f64, f64)> {
        self.variables.iter().map(|v| (v.lower, v.upper)).collect()
    }

    fn constraint_bounds(&self) -> Vec<ConstraintBounds> {
        self.constraints
            .iter()
            .map(|c| {
                let reference = c.spec.reference;
                ConstraintBounds {
                    lower: c.spec.lower.map(|l| l / reference),
                    upper: c.spec.upper.map(|u| u / reference),
                }
            })
            .collect()
    }

    fn evaluate(&mut self, x: &[f64]) -> NlpEvaluation {
        match self.evaluate_design(x) {
            Ok(evaluation) => NlpEvaluation {
                objective: evaluation.objective / self.problem.objective.reference,
                constraints: evaluation
                    .constraints
                    .iter()
                    .zip(&self.constraints)
                    .map(|(value, c)| value / c.spec.reference)
                    .collect(),
            },
            Err(err) => {
                debug!(error = %err, "design evaluation failed");
                NlpEvaluation {
                    objective: f64::NAN,
                    constraints: vec![f64::NAN; self.constraints.len()],
                }
            }
        }
    }
}
