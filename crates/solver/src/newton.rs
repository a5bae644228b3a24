//! Damped scalar Newton iteration with a backtracking safeguard.

use tracing::debug;

use crate::RootResult;

/// Newton iteration settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonOptions {
    /// Stop when `|f(x)|` falls below this.
    pub abs_tolerance: f64,
    /// Also stop when the relative step `|Δx| / max(|x|, 1e-12)` falls below this.
    /// Zero disables the step test.
    pub rel_step_tolerance: f64,
    pub max_iterations: usize,
    /// Halvings tried before accepting a non-improving step.
    pub max_backtracks: usize,
    /// Relative finite-difference step for [`newton`].
    pub fd_step: f64,
    /// Iterates are clamped into this interval when set.
    pub bounds: Option<(f64, f64)>,
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self {
            abs_tolerance: 1e-8,
            rel_step_tolerance: 0.0,
            max_iterations: 100,
            max_backtracks: 12,
            fd_step: 1e-6,
            bounds: None,
        }
    }
}

/// Newton iteration on `f` with a forward-difference derivative.
pub fn newton(mut f: impl FnMut(f64) -> f64, x0: f64, options: &NewtonOptions) -> RootResult {
    let step = options.fd_step;
    let bounds = options.bounds;
    newton_with_derivative(
        |x| {
            let fx = f(x);
            let mut h = step * x.abs().max(1.0);
            if let Some((_, upper)) = bounds {
                if x + h > upper {
                    h = -h;
                }
            }
            let dfx = (f(x + h) - fx) / h;
            (fx, dfx)
        },
        x0,
        options,
    )
}

/// Newton iteration on `fdf(x) = (f(x), f'(x))`.
///
/// Each step is backtracked on `|f|²` until it improves; if no halving
/// improves, the shortest trial step is taken so the iteration can escape
/// a flat region rather than stall.
pub fn newton_with_derivative(
    mut fdf: impl FnMut(f64) -> (f64, f64),
    x0: f64,
    options: &NewtonOptions,
) -> RootResult {
    let clamp = |x: f64| match options.bounds {
        Some((lo, hi)) => x.clamp(lo, hi),
        None => x,
    };

    let mut x = clamp(x0);
    let (mut fx, mut dfx) = fdf(x);
    let mut evaluations = 1;

    for iteration in 0..options.max_iterations {
        if fx.abs() < options.abs_tolerance {
            return RootResult {
                root: x,
                residual: fx,
                iterations: iteration,
                evaluations,
                converged: true,
            };
        }
        if !fx.is_finite() || !dfx.is_finite() || dfx == 0.0 {
            debug!(x, fx, dfx, "newton: degenerate derivative");
            break;
        }

        let full_step = -fx / dfx;
        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..=options.max_backtracks {
            let trial = clamp(x + alpha * full_step);
            let (ft, dft) = fdf(trial);
            evaluations += 1;
            if ft.is_finite() && ft * ft < fx * fx {
                accepted = Some((trial, ft, dft));
                break;
            }
            accepted = Some((trial, ft, dft));
            alpha *= 0.5;
        }
        let Some((x_new, f_new, df_new)) = accepted else {
            break;
        };
        if !f_new.is_finite() {
            break;
        }

        let step = (x_new - x).abs();
        debug!(iteration, x = x_new, residual = f_new, alpha, "newton step");
        x = x_new;
        fx = f_new;
        dfx = df_new;

        if options.rel_step_tolerance > 0.0
            && step / x.abs().max(1e-12) < options.rel_step_tolerance
        {
            return RootResult {
                root: x,
                residual: fx,
                iterations: iteration + 1,
                evaluations,
                converged: true,
            };
        }
    }

    let converged = fx.abs() < options.abs_tolerance;
    RootResult {
        root: x,
        residual: fx,
        iterations: options.max_iterations,
        evaluations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_square_root_of_two() {
        let result = newton(|x| x * x - 2.0, 1.0, &NewtonOptions::default());
        assert!(result.converged);
        assert!((result.root - 2f64.sqrt()).abs() < 1e-7);
    }

    #[test]
    fn reports_failure_when_no_root_exists() {
        let options = NewtonOptions {
            max_iterations: 20,
            ..NewtonOptions::default()
        };
        let result = newton(|x| x * x + 1.0, 3.0, &options);
        assert!(!result.converged);
    }

    #[test]
    fn respects_bounds() {
        let options = NewtonOptions {
            bounds: Some((0.0, 10.0)),
            ..NewtonOptions::default()
        };
        let result = newton_with_derivative(|x| (x - 4.0, 1.0), 50.0, &options);
        assert!(result.converged);
        assert!((result.root - 4.0).abs() < 1e-9);
    }
}
