//! Design optimization around the weight closure.
//!
//! A [`DesignProblem`] names an objective, bounded design variables and
//! constrained outputs over one or more evaluation points. When the
//! takeoff weight is itself a design variable, each point's closure error
//! becomes an equality constraint of the optimizer; otherwise every
//! evaluation nests a full weight closure. Sweeps repeat a sizing or an
//! optimization over a grid of mission and battery parameters.

mod evaluate;
pub mod optimize;
pub mod problem;
pub mod sweep;
pub mod variables;

use evtol_core::units::UnitError;
use evtol_mission::MissionError;
use evtol_solver::SolverError;
use evtol_vehicle::{Configuration, VehicleError};
use evtol_weight::WeightError;
use thiserror::Error;

pub use optimize::{ConstraintReport, OptimizationResult, PointReport};
pub use problem::{
    Constraint, DesignProblem, EvaluationPoint, MultiPointOptions, Objective, OffDesignOptions,
    OffDesignPoint, ProblemKind,
};
pub use sweep::{SWEEP_OUTPUTS, SweepGrid, SweepMode, SweepRow, SweepSetup, run_sweep};
pub use variables::{DesignParameter, DesignVariable};

#[derive(Debug, Error)]
pub enum DesignError {
    #[error(transparent)]
    Weight(#[from] WeightError),
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
    #[error(transparent)]
    Mission(#[from] MissionError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("unknown design variable `{0}`")]
    UnknownVariable(String),
    #[error("design variable `{name}` does not apply to a {configuration:?} vehicle")]
    VariableNotApplicable {
        name: String,
        configuration: Configuration,
    },
    #[error("design variable `{name}` needs lower <= initial <= upper, got [{lower}, {upper}] with {initial}")]
    InvalidVariable {
        name: String,
        lower: f64,
        upper: f64,
        initial: f64,
    },
    #[error("`{name}`: {source}")]
    Unit {
        name: String,
        #[source]
        source: UnitError,
    },
    #[error("no output named `{0}` for the objective or a constraint")]
    UnknownOutput(String),
    #[error("constraint `{0}` needs a lower or an upper bound and a positive reference")]
    InvalidConstraint(String),
    #[error("problem has no design variables")]
    NoDesignVariables,
    #[error("{kind} problem needs {what}")]
    MissingOptions { kind: ProblemKind, what: &'static str },
}
