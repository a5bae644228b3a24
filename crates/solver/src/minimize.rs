//! Bound-constrained nonlinear programming by augmented Lagrangian.
//!
//! Outer loop: Powell-Hestenes-Rockafellar multipliers and a growing
//! quadratic penalty. Inner loop: projected BFGS over the variable box,
//! with finite-difference gradients. Variables are mapped onto `[0, 1]`
//! before either loop sees them, so design variables with very different
//! magnitudes (kilograms, metres, rpm) share one step length scale.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::SolverError;

/// Admissible range of one constraint value. Equal bounds make an equality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintBounds {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl ConstraintBounds {
    pub fn equality(target: f64) -> Self {
        Self {
            lower: Some(target),
            upper: Some(target),
        }
    }

    pub fn at_least(lower: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    pub fn at_most(upper: f64) -> Self {
        Self {
            lower: None,
            upper: Some(upper),
        }
    }

    pub fn between(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!((self.lower, self.upper), (Some(l), Some(u)) if l == u)
    }

    /// Distance outside the admissible range; zero when satisfied.
    pub fn violation(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return f64::INFINITY;
        }
        let below = self.lower.map_or(0.0, |l| l - value);
        let above = self.upper.map_or(0.0, |u| value - u);
        below.max(above).max(0.0)
    }
}

/// One evaluation of objective and constraint values.
#[derive(Debug, Clone, PartialEq)]
pub struct NlpEvaluation {
    pub objective: f64,
    pub constraints: Vec<f64>,
}

/// Problem contract consumed by [`minimize`].
///
/// Non-finite objective or constraint values mark the point as unusable;
/// the line search backs away from it.
pub trait NlpProblem {
    fn variable_bounds(&self) -> Vec<(f64, f64)>;
    fn constraint_bounds(&self) -> Vec<ConstraintBounds>;
    fn evaluate(&mut self, x: &[f64]) -> NlpEvaluation;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizeOptions {
    pub max_outer_iterations: usize,
    pub max_inner_iterations: usize,
    /// Largest admissible constraint violation at a successful solution.
    pub feasibility_tolerance: f64,
    /// Projected-gradient norm (unit-scaled variables) treated as stationary.
    pub optimality_tolerance: f64,
    pub initial_penalty: f64,
    pub penalty_growth: f64,
    pub max_penalty: f64,
    /// Finite-difference step in unit-scaled variables.
    pub fd_step: f64,
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            max_outer_iterations: 30,
            max_inner_iterations: 200,
            feasibility_tolerance: 1e-4,
            optimality_tolerance: 1e-5,
            initial_penalty: 10.0,
            penalty_growth: 10.0,
            max_penalty: 1e9,
            fd_step: 1e-6,
        }
    }
}

/// Optimizer outcome. Callers must check `success`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinimizeResult {
    pub x: Vec<f64>,
    pub objective: f64,
    pub constraints: Vec<f64>,
    pub max_violation: f64,
    pub success: bool,
    /// Outer (multiplier update) iterations.
    pub iterations: usize,
    pub inner_iterations: usize,
    pub evaluations: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TermKind {
    Equality,
    Inequality,
}

/// Constraint row expanded into `c = 0` or `g <= 0` form.
#[derive(Debug, Clone, Copy)]
struct Term {
    index: usize,
    kind: TermKind,
    bound: f64,
    /// +1 for `value - bound`, -1 for `bound - value`.
    sign: f64,
}

impl Term {
    fn residual(&self, constraints: &[f64]) -> f64 {
        self.sign * (constraints[self.index] - self.bound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum InnerStatus {
    Stationary,
    Stalled,
    IterationLimit,
}

struct Scaled<'p, P: NlpProblem> {
    problem: &'p mut P,
    lower: DVector<f64>,
    span: DVector<f64>,
    terms: Vec<Term>,
    evaluations: usize,
}

impl<P: NlpProblem> Scaled<'_, P> {
    fn to_physical(&self, z: &DVector<f64>) -> Vec<f64> {
        z.iter()
            .zip(self.lower.iter().zip(self.span.iter()))
            .map(|(zi, (lo, span))| lo + zi * span)
            .collect()
    }

    fn evaluate(&mut self, z: &DVector<f64>) -> NlpEvaluation {
        self.evaluations += 1;
        let x = self.to_physical(z);
        self.problem.evaluate(&x)
    }

    fn merit_of(&self, eval: &NlpEvaluation, multipliers: &[f64], penalty: f64) -> f64 {
        if !eval.objective.is_finite() || eval.constraints.iter().any(|c| !c.is_finite()) {
            return f64::INFINITY;
        }
        let mut merit = eval.objective;
        for (term, &lambda) in self.terms.iter().zip(multipliers) {
            let r = term.residual(&eval.constraints);
            merit += match term.kind {
                TermKind::Equality => lambda * r + 0.5 * penalty * r * r,
                TermKind::Inequality => {
                    let shifted = (lambda + penalty * r).max(0.0);
                    (shifted * shifted - lambda * lambda) / (2.0 * penalty)
                }
            };
        }
        merit
    }

    fn merit(&mut self, z: &DVector<f64>, multipliers: &[f64], penalty: f64) -> f64 {
        let eval = self.evaluate(z);
        self.merit_of(&eval, multipliers, penalty)
    }

    fn gradient(
        &mut self,
        z: &DVector<f64>,
        merit: f64,
        multipliers: &[f64],
        penalty: f64,
        step: f64,
    ) -> DVector<f64> {
        let n = z.len();
        let mut grad = DVector::zeros(n);
        for i in 0..n {
            if self.span[i] == 0.0 {
                continue;
            }
            // central where the box allows, one-sided at the faces
            let forward = z[i] + step <= 1.0;
            let backward = z[i] - step >= 0.0;
            let mut plus = z.clone();
            let mut minus = z.clone();
            let (m_plus, m_minus, h) = match (forward, backward) {
                (true, true) => {
                    plus[i] += step;
                    minus[i] -= step;
                    let mp = self.merit(&plus, multipliers, penalty);
                    let mm = self.merit(&minus, multipliers, penalty);
                    (mp, mm, 2.0 * step)
                }
                (true, false) => {
                    plus[i] += step;
                    (self.merit(&plus, multipliers, penalty), merit, step)
                }
                _ => {
                    minus[i] -= step;
                    (merit, self.merit(&minus, multipliers, penalty), step)
                }
            };
            grad[i] = if m_plus.is_finite() && m_minus.is_finite() {
                (m_plus - m_minus) / h
            } else {
                0.0
            };
        }
        grad
    }

    fn max_violation(&self, constraints: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|t| {
                let r = t.residual(constraints);
                if !r.is_finite() {
                    return f64::INFINITY;
                }
                match t.kind {
                    TermKind::Equality => r.abs(),
                    TermKind::Inequality => r.max(0.0),
                }
            })
            .fold(0.0, f64::max)
    }
}

fn project(z: &DVector<f64>) -> DVector<f64> {
    z.map(|v| v.clamp(0.0, 1.0))
}

fn is_active(z: f64, g: f64) -> bool {
    (z <= 0.0 && g > 0.0) || (z >= 1.0 && g < 0.0)
}

fn projected_gradient(z: &DVector<f64>, g: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        z.len(),
        z.iter()
            .zip(g.iter())
            .map(|(&zi, &gi)| if is_active(zi, gi) { 0.0 } else { gi }),
    )
}

struct InnerOutcome {
    z: DVector<f64>,
    iterations: usize,
    status: InnerStatus,
}

fn inner_solve<P: NlpProblem>(
    scaled: &mut Scaled<'_, P>,
    z0: DVector<f64>,
    multipliers: &[f64],
    penalty: f64,
    options: &MinimizeOptions,
) -> InnerOutcome {
    let n = z0.len();
    let mut z = z0;
    let mut merit = scaled.merit(&z, multipliers, penalty);
    if !merit.is_finite() {
        return InnerOutcome {
            z,
            iterations: 0,
            status: InnerStatus::Stalled,
        };
    }
    let mut grad = scaled.gradient(&z, merit, multipliers, penalty, options.fd_step);
    let mut h_inv = DMatrix::<f64>::identity(n, n);

    for iteration in 0..options.max_inner_iterations {
        let pg = projected_gradient(&z, &grad);
        if pg.norm() < options.optimality_tolerance {
            return InnerOutcome {
                z,
                iterations: iteration,
                status: InnerStatus::Stationary,
            };
        }

        let mut direction = -(&h_inv * &pg);
        for i in 0..n {
            if is_active(z[i], grad[i]) || scaled.span[i] == 0.0 {
                direction[i] = 0.0;
            }
        }
        if grad.dot(&direction) >= 0.0 {
            h_inv = DMatrix::identity(n, n);
            direction = -pg.clone();
        }

        let largest = direction.amax();
        let mut alpha = if largest > 0.5 { 0.5 / largest } else { 1.0 };
        let mut accepted = None;
        for _ in 0..40 {
            let trial = project(&(&z + alpha * &direction));
            let trial_merit = scaled.merit(&trial, multipliers, penalty);
            let decrease = grad.dot(&(&trial - &z));
            if trial_merit.is_finite() && trial_merit <= merit + 1e-4 * decrease {
                accepted = Some((trial, trial_merit));
                break;
            }
            alpha *= 0.5;
        }
        let Some((z_new, merit_new)) = accepted else {
            return InnerOutcome {
                z,
                iterations: iteration,
                status: InnerStatus::Stalled,
            };
        };

        let grad_new = scaled.gradient(&z_new, merit_new, multipliers, penalty, options.fd_step);
        let s = &z_new - &z;
        let y = &grad_new - &grad;
        let sy = s.dot(&y);
        if sy > 1e-12 {
            let rho = 1.0 / sy;
            let identity = DMatrix::<f64>::identity(n, n);
            let left = &identity - rho * &s * y.transpose();
            let right = &identity - rho * &y * s.transpose();
            h_inv = &left * &h_inv * &right + rho * &s * s.transpose();
        }

        let improvement = merit - merit_new;
        z = z_new;
        merit = merit_new;
        grad = grad_new;
        if s.norm() < 1e-12 && improvement.abs() <= 1e-14 * (1.0 + merit.abs()) {
            return InnerOutcome {
                z,
                iterations: iteration + 1,
                status: InnerStatus::Stalled,
            };
        }
    }

    InnerOutcome {
        z,
        iterations: options.max_inner_iterations,
        status: InnerStatus::IterationLimit,
    }
}

/// Minimize `problem` from `x0` subject to its variable box and constraint bounds.
pub fn minimize<P: NlpProblem>(
    problem: &mut P,
    x0: &[f64],
    options: &MinimizeOptions,
) -> Result<MinimizeResult, SolverError> {
    let bounds = problem.variable_bounds();
    if bounds.len() != x0.len() {
        return Err(SolverError::DimensionMismatch {
            expected: bounds.len(),
            got: x0.len(),
        });
    }
    for (index, &(lower, upper)) in bounds.iter().enumerate() {
        if !(lower <= upper) || !lower.is_finite() || !upper.is_finite() {
            return Err(SolverError::InvalidBounds {
                index,
                lower,
                upper,
            });
        }
    }

    let mut terms = Vec::new();
    for (index, cb) in problem.constraint_bounds().into_iter().enumerate() {
        match (cb.lower, cb.upper) {
            (None, None) => return Err(SolverError::UnboundedConstraint { index }),
            (Some(l), Some(u)) if l == u => terms.push(Term {
                index,
                kind: TermKind::Equality,
                bound: l,
                sign: 1.0,
            }),
            (lower, upper) => {
                if let Some(l) = lower {
                    terms.push(Term {
                        index,
                        kind: TermKind::Inequality,
                        bound: l,
                        sign: -1.0,
                    });
                }
                if let Some(u) = upper {
                    terms.push(Term {
                        index,
                        kind: TermKind::Inequality,
                        bound: u,
                        sign: 1.0,
                    });
                }
            }
        }
    }

    let n = x0.len();
    let lower = DVector::from_iterator(n, bounds.iter().map(|b| b.0));
    let span = DVector::from_iterator(n, bounds.iter().map(|b| b.1 - b.0));
    let z0 = DVector::from_iterator(
        n,
        x0.iter().enumerate().map(|(i, &x)| {
            if span[i] > 0.0 {
                ((x - lower[i]) / span[i]).clamp(0.0, 1.0)
            } else {
                0.0
            }
        }),
    );

    let mut scaled = Scaled {
        problem,
        lower,
        span,
        terms,
        evaluations: 0,
    };

    let mut multipliers = vec![0.0; scaled.terms.len()];
    let mut penalty = options.initial_penalty;
    let mut z = z0;
    let mut previous_violation = f64::INFINITY;
    let mut previous_objective = f64::NAN;
    let mut inner_total = 0;
    let mut success = false;
    let mut message = String::from("outer iteration limit reached");
    let mut iterations = 0;
    let mut last_eval = scaled.evaluate(&z);

    for outer in 0..options.max_outer_iterations {
        iterations = outer + 1;
        let inner = inner_solve(&mut scaled, z, &multipliers, penalty, options);
        inner_total += inner.iterations;
        z = inner.z;
        last_eval = scaled.evaluate(&z);
        let violation = scaled.max_violation(&last_eval.constraints);
        let objective = last_eval.objective;
        debug!(
            outer,
            objective,
            violation,
            penalty,
            inner_iterations = inner.iterations,
            "augmented lagrangian iteration"
        );

        if !objective.is_finite() {
            message = "objective is not finite at the current iterate".to_string();
            break;
        }

        let feasible = violation <= options.feasibility_tolerance;
        let settled = previous_objective.is_finite()
            && (objective - previous_objective).abs() <= 1e-8 * (1.0 + objective.abs());
        if feasible && (inner.status != InnerStatus::IterationLimit || settled) {
            success = true;
            message = match inner.status {
                InnerStatus::Stationary => "optimization converged".to_string(),
                InnerStatus::Stalled => "optimization converged (line search stalled)".to_string(),
                InnerStatus::IterationLimit => {
                    "optimization converged (objective settled)".to_string()
                }
            };
            break;
        }

        for (term, lambda) in scaled.terms.iter().zip(multipliers.iter_mut()) {
            let r = term.residual(&last_eval.constraints);
            *lambda = match term.kind {
                TermKind::Equality => *lambda + penalty * r,
                TermKind::Inequality => (*lambda + penalty * r).max(0.0),
            };
        }
        if violation > 0.25 * previous_violation || !feasible {
            penalty = (penalty * options.penalty_growth).min(options.max_penalty);
        }
        previous_violation = violation;
        previous_objective = objective;
    }

    let max_violation = scaled.max_violation(&last_eval.constraints);
    if !success && max_violation > options.feasibility_tolerance {
        message = format!("{message}; constraints violated by up to {max_violation:.3e}");
        warn!(max_violation, "optimizer finished infeasible");
    }

    Ok(MinimizeResult {
        x: scaled.to_physical(&z),
        objective: last_eval.objective,
        constraints: last_eval.constraints,
        max_violation,
        success,
        iterations,
        inner_iterations: inner_total,
        evaluations: scaled.evaluations,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quadratic;

    impl NlpProblem for Quadratic {
        fn variable_bounds(&self) -> Vec<(f64, f64)> {
            vec![(-5.0, 5.0), (-5.0, 5.0)]
        }

        fn constraint_bounds(&self) -> Vec<ConstraintBounds> {
            vec![ConstraintBounds::equality(1.0)]
        }

        fn evaluate(&mut self, x: &[f64]) -> NlpEvaluation {
            NlpEvaluation {
                objective: x[0] * x[0] + x[1] * x[1],
                constraints: vec![x[0] + x[1]],
            }
        }
    }

    #[test]
    fn solves_equality_constrained_quadratic() {
        let result = minimize(&mut Quadratic, &[3.0, -1.0], &MinimizeOptions::default()).unwrap();
        assert!(result.success, "{}", result.message);
        assert!((result.x[0] - 0.5).abs() < 1e-3);
        assert!((result.x[1] - 0.5).abs() < 1e-3);
    }

    struct Infeasible;

    impl NlpProblem for Infeasible {
        fn variable_bounds(&self) -> Vec<(f64, f64)> {
            vec![(0.0, 1.0)]
        }

        fn constraint_bounds(&self) -> Vec<ConstraintBounds> {
            vec![ConstraintBounds::at_least(2.0)]
        }

        fn evaluate(&mut self, x: &[f64]) -> NlpEvaluation {
            NlpEvaluation {
                objective: x[0],
                constraints: vec![x[0]],
            }
        }
    }

    #[test]
    fn infeasible_problem_reports_failure() {
        let options = MinimizeOptions {
            max_outer_iterations: 8,
            ..MinimizeOptions::default()
        };
        let result = minimize(&mut Infeasible, &[0.5], &options).unwrap();
        assert!(!result.success);
        assert!(result.max_violation > 0.9);
    }

    #[test]
    fn active_variable_bound_is_respected() {
        struct Slope;
        impl NlpProblem for Slope {
            fn variable_bounds(&self) -> Vec<(f64, f64)> {
                vec![(1.0, 4.0)]
            }
            fn constraint_bounds(&self) -> Vec<ConstraintBounds> {
                Vec::new()
            }
            fn evaluate(&mut self, x: &[f64]) -> NlpEvaluation {
                NlpEvaluation {
                    objective: 2.0 * x[0],
                    constraints: Vec::new(),
                }
            }
        }
        let result = minimize(&mut Slope, &[3.0], &MinimizeOptions::default()).unwrap();
        assert!(result.success, "{}", result.message);
        assert!((result.x[0] - 1.0).abs() < 1e-9);
    }
}
