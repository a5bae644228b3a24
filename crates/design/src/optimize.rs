//! Optimizer driver and its report.

use evtol_core::outputs::{OutputError, Outputs};
use evtol_core::units::{Quantity, Unit};
use evtol_solver::{NlpProblem, minimize};
use evtol_vehicle::Vehicle;
use evtol_weight::ClosurePoint;
use serde::Serialize;
use tracing::{info, warn};

use crate::DesignError;
use crate::evaluate::Evaluator;
use crate::problem::DesignProblem;

/// Final value of one constraint, in its own unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstraintReport {
    pub name: String,
    pub value: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub unit: Unit,
    /// Distance outside the bounds, in `unit`; zero when satisfied.
    pub violation: f64,
    pub satisfied: bool,
}

/// Solved state of one evaluation point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointReport {
    pub name: String,
    pub vehicle: Vehicle,
    pub closure: ClosurePoint,
    pub closure_converged: bool,
}

/// Outcome of [`DesignProblem::run_optimization`]. Callers must check `success`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub success: bool,
    pub iterations: usize,
    pub evaluations: usize,
    pub message: String,
    pub objective_name: String,
    /// Objective at the solution, in the objective's unit.
    pub objective: f64,
    /// Design variables at the solution, in the units they were declared in.
    pub design: Vec<(String, Quantity)>,
    pub outputs: Outputs,
    pub constraints: Vec<ConstraintReport>,
    pub points: Vec<PointReport>,
}

impl OptimizationResult {
    /// Design variable or output `name` converted to `unit`.
    pub fn get(&self, name: &str, unit: Unit) -> Result<f64, OutputError> {
        if let Some((_, quantity)) = self.design.iter().find(|(n, _)| n == name) {
            return quantity.to(unit).map_err(|source| OutputError::Unit {
                name: name.to_string(),
                source,
            });
        }
        self.outputs.get(name, unit)
    }

    pub fn constraint(&self, name: &str) -> Option<&ConstraintReport> {
        self.constraints.iter().find(|c| c.name == name)
    }
}

impl DesignProblem {
    /// Build the evaluation graph, run the optimizer and report the solution.
    ///
    /// Malformed problems are `Err`. Running out of iterations, violated
    /// constraints and unconverged inner solves are reported through
    /// `success` and the constraint reports.
    pub fn run_optimization(&self) -> Result<OptimizationResult, DesignError> {
        if !(self.objective.reference > 0.0) {
            return Err(DesignError::UnknownOutput(self.objective.name.clone()));
        }
        let mut evaluator = Evaluator::new(self)?;
        let x0 = evaluator.initial_point();
        let outcome = minimize(&mut evaluator, &x0, &self.optimizer)?;

        let tolerance = self.optimizer.feasibility_tolerance;
        let bounds = evaluator.constraint_bounds();
        let evaluation = evaluator.evaluate_design(&outcome.x)?;

        let constraints: Vec<ConstraintReport> = evaluator
            .constraints
            .iter()
            .zip(&evaluation.constraints)
            .zip(&bounds)
            .map(|((resolved, &value), scaled)| {
                let reference = resolved.spec.reference;
                let scaled_violation = if value.is_finite() {
                    scaled.violation(value / reference)
                } else {
                    f64::INFINITY
                };
                ConstraintReport {
                    name: resolved.output.clone(),
                    value,
                    lower: resolved.spec.lower,
                    upper: resolved.spec.upper,
                    unit: resolved.spec.unit,
                    violation: scaled_violation * reference,
                    satisfied: scaled_violation <= tolerance,
                }
            })
            .collect();

        let closures_converged = evaluation
            .points
            .iter()
            .all(|p| p.closure_converged && p.closure.power.converged);
        let feasible = constraints.iter().all(|c| c.satisfied);
        let success = outcome.success && feasible && closures_converged;

        let mut message = outcome.message.clone();
        if !closures_converged {
            message.push_str("; a nested weight closure or inner power solve did not converge");
        }
        for violated in constraints.iter().filter(|c| !c.satisfied) {
            warn!(
                constraint = %violated.name,
                value = violated.value,
                violation = violated.violation,
                "constraint violated at the reported design"
            );
        }
        info!(
            kind = %self.kind,
            success,
            objective = evaluation.objective,
            iterations = outcome.iterations,
            evaluations = evaluator.evaluations,
            "optimization finished"
        );

        let design = evaluator
            .variables
            .iter()
            .zip(&outcome.x)
            .map(|(variable, &value)| (variable.name.clone(), Quantity::new(value, variable.unit)))
            .collect();
        let points = evaluation
            .points
            .into_iter()
            .map(|p| PointReport {
                name: p.name,
                vehicle: p.vehicle,
                closure: p.closure,
                closure_converged: p.closure_converged,
            })
            .collect();

        Ok(OptimizationResult {
            success,
            iterations: outcome.iterations,
            evaluations: evaluator.evaluations,
            message,
            objective_name: self.objective.name.clone(),
            objective: evaluation.objective,
            design,
            outputs: evaluation.outputs,
            constraints,
            points,
        })
    }
}
