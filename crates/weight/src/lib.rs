//! Component weights and the takeoff-weight closure.
//!
//! A closure evaluation walks the mission at an assumed takeoff weight,
//! turns the resulting energy and sizing loads into component weights and
//! compares their sum with the assumption. [`WeightAnalysis`] drives that
//! error to zero either with a scalar Newton iteration or through the
//! bounded minimizer, for a maximum-takeoff sizing pass or for a gross
//! re-evaluation of an airframe that is already sized.

pub mod analysis;
pub mod closure;
pub mod fidelity;
pub mod regressions;
pub mod report;

use evtol_mission::MissionError;
use evtol_power::PowerError;
use evtol_solver::SolverError;
use evtol_vehicle::{Configuration, VehicleError};
use thiserror::Error;

pub use analysis::{
    ClosureOptions, SizingResult, SizingState, SolvedBy, VehicleWeight, WeightAnalysis, WeightType,
    evaluate_gtow,
};
pub use closure::{ClosurePoint, FixedEmptyWeight, WeightBreakdown, evaluate_point};
pub use fidelity::Fidelity;
pub use regressions::{RotorWeightModel, StructureModel};
pub use report::{clearance_ratio, point_outputs};

#[derive(Debug, Error)]
pub enum WeightError {
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
    #[error(transparent)]
    Mission(#[from] MissionError),
    #[error(transparent)]
    Power(#[from] PowerError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("fidelity key `{key}` is required for a {configuration:?} vehicle")]
    MissingFidelityKey {
        key: &'static str,
        configuration: Configuration,
    },
    #[error("fidelity `{key} = {value}` is not applicable to a {configuration:?} vehicle")]
    IncompatibleFidelity {
        key: &'static str,
        value: &'static str,
        configuration: Configuration,
    },
    #[error("gross takeoff evaluation requires a sized vehicle; run a maximum takeoff sizing first")]
    NotSized,
    #[error("the nonlinear solver cannot close weight with the {hover} hover model; use optimization")]
    IncompatibleSolver { hover: &'static str },
    #[error("unsupported weight type `{0}` (expected `maximum` or `gross`)")]
    UnknownWeightType(String),
    #[error("unsupported solver `{0}` (expected `nonlinear_solver` or `optimization`)")]
    UnknownSolvedBy(String),
}
