//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;

/// Brent's method root finder.
///
/// Keeps a bracket `[b, c]` around the root and takes inverse quadratic
/// (or secant) steps when they land inside it and shrink fast enough,
/// bisecting otherwise. Guaranteed to converge for continuous functions
/// with a valid bracket.
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
///
/// let f = |x: f64| x * x * x - x - 2.0;
/// let root = solver.find_root(f, 1.0, 2.0).unwrap();
/// assert!(f(root).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Create a new Brent solver with the given configuration.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SolverConfig::default())
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }

    /// Find a root of `f` in `[a, b]`.
    ///
    /// # Errors
    ///
    /// - `SolverError::NoBracket` if `f(a)` and `f(b)` share a sign
    /// - `SolverError::NumericalInstability` if `f` returns a non-finite value
    /// - `SolverError::MaxIterationsExceeded` if the bracket does not close in time
    pub fn find_root<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let two = T::one() + T::one();
        let half = T::one() / two;
        let three = two + T::one();
        let tol = self.config.tolerance;

        let (mut a, mut b) = (a, b);
        let (mut fa, mut fb) = (f(a), f(b));
        check_finite(fa)?;
        check_finite(fb)?;

        if fa == T::zero() {
            return Ok(a);
        }
        if fb == T::zero() {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(SolverError::NoBracket {
                a: a.to_f64().unwrap_or(f64::NAN),
                b: b.to_f64().unwrap_or(f64::NAN),
            });
        }

        let (mut c, mut fc) = (b, fb);
        let mut d = b - a;
        let mut e = d;

        for _ in 0..self.config.max_iterations {
            // Keep the root between b and c.
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            // b is the best estimate so far.
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol1 = two * T::epsilon() * b.abs() + half * tol;
            let xm = half * (c - b);
            if xm.abs() <= tol1 || fb.abs() < tol {
                return Ok(b);
            }

            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (p, q) = if a == c {
                    (two * xm * s, T::one() - s)
                } else {
                    let qa = fa / fc;
                    let r = fb / fc;
                    (
                        s * (two * xm * qa * (qa - r) - (b - a) * (r - T::one())),
                        (qa - T::one()) * (r - T::one()) * (s - T::one()),
                    )
                };
                let (p, q) = if p > T::zero() { (p, -q) } else { (-p, q) };

                let min1 = three * xm * q - (tol1 * q).abs();
                let min2 = (e * q).abs();
                if two * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            b = if d.abs() > tol1 {
                b + d
            } else {
                b + tol1 * xm.signum()
            };
            fb = f(b);
            check_finite(fb)?;
        }

        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }
}

fn check_finite<T: Float>(value: T) -> Result<(), SolverError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SolverError::NumericalInstability(
            "Objective returned a non-finite value".to_string(),
        ))
    }
}
