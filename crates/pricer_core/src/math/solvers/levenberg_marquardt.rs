//! Levenberg-Marquardt nonlinear least-squares solver.
//!
//! Each iteration solves the scaled normal equations
//!
//! ```text
//! (J^T J + λ diag(J^T J)) δ = -J^T r
//! p_{n+1} = Π(p_n + δ)
//! ```
//!
//! where `J` is the forward-difference Jacobian, `λ` the damping factor and
//! `Π` the projection onto the parameter box (identity for [`solve`]).
//! Marquardt scaling keeps the step well conditioned when parameters live on
//! very different scales, as SABR's `(rho, alpha, nu)` do.
//!
//! [`solve`]: LevenbergMarquardtSolver::solve
//!
//! # Example
//!
//! ```
//! use pricer_core::math::solvers::{LevenbergMarquardtSolver, LMConfig};
//!
//! // Fit y = a * exp(-b * x)
//! let x_data = vec![0.0, 1.0, 2.0, 3.0, 4.0];
//! let y_data: Vec<f64> = x_data.iter().map(|&x: &f64| 2.0 * (-0.5 * x).exp()).collect();
//!
//! let solver = LevenbergMarquardtSolver::new(LMConfig::default());
//! let residuals = |params: &[f64]| -> Vec<f64> {
//!     x_data
//!         .iter()
//!         .zip(&y_data)
//!         .map(|(&x, &y)| params[0] * (-params[1] * x).exp() - y)
//!         .collect()
//! };
//!
//! let result = solver.solve(residuals, vec![1.0, 1.0]).unwrap();
//! assert!((result.params[0] - 2.0).abs() < 1e-6);
//! assert!((result.params[1] - 0.5).abs() < 1e-6);
//! ```

use crate::traits::calibration::ParameterBounds;
use crate::types::SolverError;

/// Diagonal floor used by Marquardt scaling for insensitive parameters.
const DIAGONAL_FLOOR: f64 = 1e-12;

/// Configuration for Levenberg-Marquardt solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LMConfig {
    /// Convergence tolerance on the residual norm.
    pub tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Initial damping factor.
    pub initial_lambda: f64,
    /// Factor to increase lambda on rejected step.
    pub lambda_up: f64,
    /// Factor to decrease lambda on accepted step.
    pub lambda_down: f64,
    /// Minimum damping factor.
    pub min_lambda: f64,
    /// Maximum damping factor; reaching it with a rejected step ends the run.
    pub max_lambda: f64,
    /// Tolerance for relative parameter change convergence.
    pub param_tolerance: f64,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 100,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            min_lambda: 1e-10,
            max_lambda: 1e10,
            param_tolerance: 1e-10,
        }
    }
}

impl LMConfig {
    /// Create a new LM configuration.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
            ..Default::default()
        }
    }

    /// Override the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Result of Levenberg-Marquardt optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct LMResult {
    /// Final optimized parameters.
    pub params: Vec<f64>,
    /// Final residual sum of squares.
    pub residual_ss: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether a convergence criterion was met before the cap.
    pub converged: bool,
    /// Final lambda value.
    pub final_lambda: f64,
}

impl LMResult {
    /// Create a new LM result.
    pub fn new(
        params: Vec<f64>,
        residual_ss: f64,
        iterations: usize,
        converged: bool,
        final_lambda: f64,
    ) -> Self {
        Self {
            params,
            residual_ss,
            iterations,
            converged,
            final_lambda,
        }
    }

    /// Root mean square of the final residuals.
    pub fn rmse(&self, n_observations: usize) -> f64 {
        if n_observations == 0 {
            return 0.0;
        }
        (self.residual_ss / n_observations as f64).sqrt()
    }
}

/// Levenberg-Marquardt nonlinear least-squares solver.
///
/// Solves `min_p ||f(p)||^2`, optionally subject to per-parameter box
/// constraints.
///
/// # Example
///
/// ```
/// use pricer_core::math::solvers::LevenbergMarquardtSolver;
/// use pricer_core::traits::calibration::ParameterBounds;
///
/// // Unconstrained optimum at 3.0 lies outside [0, 1].
/// let residuals = |p: &[f64]| vec![p[0] - 3.0];
/// let bounds = [ParameterBounds::new(0.0, 1.0)];
///
/// let solver = LevenbergMarquardtSolver::with_defaults();
/// let result = solver.solve_bounded(residuals, vec![0.5], &bounds).unwrap();
/// assert!((result.params[0] - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LevenbergMarquardtSolver {
    config: LMConfig,
}

impl LevenbergMarquardtSolver {
    /// Create a new LM solver with the given configuration.
    pub fn new(config: LMConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: LMConfig::default(),
        }
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &LMConfig {
        &self.config
    }

    /// Solve the unconstrained least-squares problem.
    ///
    /// Hitting the iteration cap is not an error: the best point found is
    /// returned with `converged = false` and the caller decides.
    pub fn solve<F>(&self, residuals: F, initial_params: Vec<f64>) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        self.minimise(&residuals, initial_params, None)
    }

    /// Solve the least-squares problem inside a parameter box.
    ///
    /// The initial point is projected onto the box first. `bounds` must have
    /// one entry per parameter.
    pub fn solve_bounded<F>(
        &self,
        residuals: F,
        initial_params: Vec<f64>,
        bounds: &[ParameterBounds],
    ) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        if bounds.len() != initial_params.len() {
            return Err(SolverError::DimensionMismatch {
                params: initial_params.len(),
                bounds: bounds.len(),
            });
        }
        if let Some(i) = bounds.iter().position(|b| !b.is_valid()) {
            return Err(SolverError::NumericalInstability(format!(
                "Invalid bounds for parameter {}",
                i
            )));
        }
        let start = ParameterBounds::clamp_all(bounds, &initial_params);
        self.minimise(&residuals, start, Some(bounds))
    }

    fn minimise<F>(
        &self,
        residuals: &F,
        initial_params: Vec<f64>,
        bounds: Option<&[ParameterBounds]>,
    ) -> Result<LMResult, SolverError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let n_params = initial_params.len();
        if n_params == 0 {
            return Err(SolverError::NumericalInstability(
                "Empty parameter vector".to_string(),
            ));
        }

        let mut params = initial_params;
        let mut lambda = self.config.initial_lambda;

        let mut r = residuals(&params);
        if r.is_empty() {
            return Err(SolverError::NumericalInstability(
                "Empty residual vector".to_string(),
            ));
        }
        let mut ss = sum_of_squares(&r);
        if !ss.is_finite() {
            return Err(SolverError::NumericalInstability(
                "Non-finite residuals at the initial point".to_string(),
            ));
        }

        let mut jacobian = compute_jacobian(residuals, &params, &r, bounds);

        for iteration in 0..self.config.max_iterations {
            if ss.sqrt() < self.config.tolerance {
                return Ok(LMResult::new(params, ss, iteration, true, lambda));
            }

            let delta = match solve_normal_equations(&jacobian, &r, lambda) {
                Some(d) => d,
                None => {
                    if lambda >= self.config.max_lambda {
                        break;
                    }
                    lambda = (lambda * self.config.lambda_up).min(self.config.max_lambda);
                    continue;
                }
            };

            let mut trial: Vec<f64> = params.iter().zip(&delta).map(|(p, d)| p + d).collect();
            if let Some(b) = bounds {
                trial = ParameterBounds::clamp_all(b, &trial);
            }

            // Measured after projection so a step pinned at a bound counts as zero.
            let step = trial
                .iter()
                .zip(&params)
                .map(|(t, p)| (t - p) * (t - p))
                .sum::<f64>()
                .sqrt();
            let param_norm = params.iter().map(|p| p * p).sum::<f64>().sqrt().max(1.0);
            if step / param_norm < self.config.param_tolerance {
                return Ok(LMResult::new(params, ss, iteration, true, lambda));
            }

            let trial_r = residuals(&trial);
            let trial_ss = sum_of_squares(&trial_r);

            if trial_ss.is_finite() && trial_ss < ss {
                params = trial;
                r = trial_r;
                ss = trial_ss;
                lambda = (lambda * self.config.lambda_down).max(self.config.min_lambda);
                jacobian = compute_jacobian(residuals, &params, &r, bounds);
            } else {
                if lambda >= self.config.max_lambda {
                    break;
                }
                lambda = (lambda * self.config.lambda_up).min(self.config.max_lambda);
            }
        }

        Ok(LMResult::new(
            params,
            ss,
            self.config.max_iterations,
            false,
            lambda,
        ))
    }
}

/// Solve `(J^T J + λ diag(J^T J)) δ = -J^T r`.
fn solve_normal_equations(
    jacobian: &[Vec<f64>],
    residuals: &[f64],
    lambda: f64,
) -> Option<Vec<f64>> {
    let n_params = jacobian.first().map_or(0, Vec::len);

    let mut jtj = vec![vec![0.0; n_params]; n_params];
    for row in jacobian {
        for i in 0..n_params {
            for j in 0..=i {
                jtj[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..n_params {
        for j in 0..i {
            jtj[j][i] = jtj[i][j];
        }
    }

    for (i, row) in jtj.iter_mut().enumerate() {
        row[i] += lambda * row[i].max(DIAGONAL_FLOOR);
    }

    let mut jtr = vec![0.0; n_params];
    for (row, &res) in jacobian.iter().zip(residuals) {
        for (g, &j) in jtr.iter_mut().zip(row) {
            *g -= j * res;
        }
    }

    solve_cholesky(&jtj, &jtr)
}

/// Forward-difference Jacobian, stepping backwards at an upper bound.
fn compute_jacobian<F>(
    residuals: &F,
    params: &[f64],
    r0: &[f64],
    bounds: Option<&[ParameterBounds]>,
) -> Vec<Vec<f64>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n_params = params.len();
    let n_residuals = r0.len();
    let eps = 1e-8;

    let mut jacobian = vec![vec![0.0; n_params]; n_residuals];
    let mut bumped = params.to_vec();

    for j in 0..n_params {
        let mut h = eps * params[j].abs().max(1.0);
        if let Some(b) = bounds.and_then(|b| b.get(j)) {
            if params[j] + h > b.max {
                h = -h;
            }
        }

        bumped[j] = params[j] + h;
        let r_bumped = residuals(&bumped);
        bumped[j] = params[j];

        for (i, row) in jacobian.iter_mut().enumerate() {
            let value = (r_bumped.get(i).copied().unwrap_or(f64::NAN) - r0[i]) / h;
            row[j] = if value.is_finite() { value } else { 0.0 };
        }
    }

    jacobian
}

#[inline]
fn sum_of_squares(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

/// Solve Ax = b for symmetric positive definite A.
fn solve_cholesky(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if !(sum > 0.0) {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}
