//! Numerical kernels shared by the sizing chain.
//!
//! Every solver here is a plain synchronous loop with an iteration cap.
//! Running out of iterations is not an error: results carry a `converged`
//! (or `success`) flag and the caller decides what an unconverged answer
//! means. `Err` is reserved for malformed inputs.

pub mod bisection;
pub mod minimize;
pub mod newton;

use serde::Serialize;
use thiserror::Error;

pub use bisection::bisect;
pub use minimize::{
    ConstraintBounds, MinimizeOptions, MinimizeResult, NlpEvaluation, NlpProblem, minimize,
};
pub use newton::{NewtonOptions, newton, newton_with_derivative};

/// Outcome of a scalar root solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RootResult {
    pub root: f64,
    /// Function value at `root`.
    pub residual: f64,
    pub iterations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum SolverError {
    #[error("invalid bracket [{lower}, {upper}]")]
    InvalidBracket { lower: f64, upper: f64 },
    #[error("variable {index} has invalid bounds [{lower}, {upper}]")]
    InvalidBounds {
        index: usize,
        lower: f64,
        upper: f64,
    },
    #[error("initial guess has {got} entries, problem has {expected} variables")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("constraint {index} has neither a lower nor an upper bound")]
    UnboundedConstraint { index: usize },
}
