use crate::{RootResult, SolverError};

/// Bisection on `[lower, upper]` until the bracket is narrower than `x_tolerance`
/// or `|f| < f_tolerance`.
///
/// A bracket without a sign change returns the better endpoint with
/// `converged = false`.
pub fn bisect(
    mut f: impl FnMut(f64) -> f64,
    lower: f64,
    upper: f64,
    x_tolerance: f64,
    f_tolerance: f64,
    max_iterations: usize,
) -> Result<RootResult, SolverError> {
    if !(lower < upper) || !lower.is_finite() || !upper.is_finite() {
        return Err(SolverError::InvalidBracket { lower, upper });
    }
    let (mut a, mut b) = (lower, upper);
    let (mut fa, fb) = (f(a), f(b));
    let mut evaluations = 2;

    if fa * fb > 0.0 || !fa.is_finite() || !fb.is_finite() {
        let (root, residual) = if fa.abs() <= fb.abs() { (a, fa) } else { (b, fb) };
        return Ok(RootResult {
            root,
            residual,
            iterations: 0,
            evaluations,
            converged: false,
        });
    }

    let mut mid = 0.5 * (a + b);
    let mut fm = f(mid);
    evaluations += 1;
    for iteration in 0..max_iterations {
        if fm.abs() < f_tolerance || (b - a) < x_tolerance {
            return Ok(RootResult {
                root: mid,
                residual: fm,
                iterations: iteration,
                evaluations,
                converged: true,
            });
        }
        if fa * fm <= 0.0 {
            b = mid;
        } else {
            a = mid;
            fa = fm;
        }
        mid = 0.5 * (a + b);
        fm = f(mid);
        evaluations += 1;
    }

    Ok(RootResult {
        root: mid,
        residual: fm,
        iterations: max_iterations,
        evaluations,
        converged: fm.abs() < f_tolerance || (b - a) < x_tolerance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brackets_cubic_root() {
        let result = bisect(|x| x * x * x - 8.0, 0.0, 5.0, 1e-10, 0.0, 200).unwrap();
        assert!(result.converged);
        assert!((result.root - 2.0).abs() < 1e-8);
    }

    #[test]
    fn no_sign_change_is_flagged() {
        let result = bisect(|x| x * x + 1.0, -1.0, 1.0, 1e-10, 0.0, 200).unwrap();
        assert!(!result.converged);
    }

    #[test]
    fn rejects_inverted_bracket() {
        assert!(bisect(|x| x, 1.0, -1.0, 1e-6, 0.0, 10).is_err());
    }
}
