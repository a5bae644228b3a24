//! Non-dimensional rotor inflow in forward flight.

use evtol_solver::{NewtonOptions, newton_with_derivative};
use serde::Serialize;

/// Bounds on the inflow ratio accepted by the solve. A disk tilted aft in
/// descent sees upflow, so the total inflow may be negative.
pub const INFLOW_BOUNDS: (f64, f64) = (-10.0, 10.0);
/// Relative step at which the inflow Newton iteration is considered converged.
pub const INFLOW_REL_TOLERANCE: f64 = 1e-3;
const INFLOW_MAX_ITERATIONS: usize = 50;

/// Solution of `λ = μ tan α + Ct / (2 √(μ² + λ²))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Inflow {
    /// Advance ratio `V cos α / (Ω R)`.
    pub mu: f64,
    /// Freestream inflow `V sin α / (Ω R)`.
    pub lambda_c: f64,
    /// Total inflow ratio.
    pub lambda: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Solve the inflow equation for thrust coefficient `ct` at disk angle `alpha_rad`.
///
/// `speed_m_s` is the freestream magnitude and `tip_speed_m_s` is `Ω R`.
pub fn solve_inflow(ct: f64, speed_m_s: f64, alpha_rad: f64, tip_speed_m_s: f64) -> Inflow {
    let (sin_a, cos_a) = alpha_rad.sin_cos();
    let mu = speed_m_s * cos_a / tip_speed_m_s;
    let lambda_c = speed_m_s * sin_a / tip_speed_m_s;

    // hover value plus the signed freestream share is a good start on both branches
    let lambda_h = (ct.max(0.0) / 2.0).sqrt();
    let guess = (lambda_c + lambda_h).clamp(INFLOW_BOUNDS.0, INFLOW_BOUNDS.1);

    let options = NewtonOptions {
        abs_tolerance: 1e-12,
        rel_step_tolerance: INFLOW_REL_TOLERANCE * 1e-3,
        max_iterations: INFLOW_MAX_ITERATIONS,
        max_backtracks: 8,
        fd_step: 1e-7,
        bounds: Some(INFLOW_BOUNDS),
    };
    let result = newton_with_derivative(
        |lambda| {
            let root = (mu * mu + lambda * lambda).sqrt().max(1e-12);
            let f = lambda - lambda_c - ct / (2.0 * root);
            let df = 1.0 + ct * lambda / (2.0 * root.powi(3));
            (f, df)
        },
        guess,
        &options,
    );

    // accept anything within the relative tolerance of a fixed point
    let lambda = result.root;
    let root = (mu * mu + lambda * lambda).sqrt().max(1e-12);
    let fixed_point = lambda_c + ct / (2.0 * root);
    let scale = lambda.abs().max(lambda_h).max(1e-6);
    let converged = (fixed_point - lambda).abs() <= INFLOW_REL_TOLERANCE * scale;

    Inflow {
        mu,
        lambda_c,
        lambda,
        iterations: result.iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hover_inflow_matches_momentum_theory() {
        let inflow = solve_inflow(0.008, 0.0, 0.0, 200.0);
        assert!(inflow.converged);
        assert!((inflow.lambda - (0.008f64 / 2.0).sqrt()).abs() < 1e-6);
    }

    #[test]
    fn high_speed_inflow_approaches_glauert_limit() {
        // edgewise at mu = 0.4 with no disk tilt: lambda ≈ Ct / (2 mu)
        let inflow = solve_inflow(0.008, 80.0, 0.0, 200.0);
        assert!(inflow.converged);
        assert!((inflow.mu - 0.4).abs() < 1e-12);
        assert!((inflow.lambda - 0.008 / 0.8).abs() < 1e-3);
    }

    #[test]
    fn axial_climb_adds_freestream() {
        let inflow = solve_inflow(0.01, 20.0, std::f64::consts::FRAC_PI_2, 200.0);
        assert!(inflow.converged);
        assert!(inflow.lambda > inflow.lambda_c);
        assert!(inflow.mu.abs() < 1e-12);
    }

    #[test]
    fn descending_disk_converges_to_upflow_root() {
        let inflow = solve_inflow(0.008, 30.0, -0.2, 200.0);
        assert!(inflow.converged, "{inflow:?}");
        assert!(inflow.lambda_c < 0.0);
        assert!(inflow.lambda < 0.0);
        let root = (inflow.mu * inflow.mu + inflow.lambda * inflow.lambda).sqrt();
        let residual = inflow.lambda - inflow.lambda_c - 0.008 / (2.0 * root);
        assert!(residual.abs() < 1e-6);
        // induced part stays positive even though the total is upflow
        assert!(inflow.lambda > inflow.lambda_c);
    }

    #[test]
    fn shallow_descent_converges_near_zero_inflow() {
        let inflow = solve_inflow(0.005, 40.0, -0.02, 200.0);
        assert!(inflow.converged, "{inflow:?}");
        assert!(inflow.lambda > inflow.lambda_c);
    }
}
