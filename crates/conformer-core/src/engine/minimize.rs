use crate::core::forcefield::uff::ForceField;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;
use tracing::trace;

/// A differentiable scalar function of a flat coordinate vector.
pub trait Objective {
    fn dimension(&self) -> usize;
    fn value(&self, x: &[f64]) -> f64;
    /// Writes the gradient at `x` into `grad`, overwriting it.
    fn gradient(&self, x: &[f64], grad: &mut [f64]);
}

impl Objective for ForceField {
    fn dimension(&self) -> usize {
        3 * self.num_atoms()
    }

    fn value(&self, x: &[f64]) -> f64 {
        self.energy(x)
    }

    fn gradient(&self, x: &[f64], grad: &mut [f64]) {
        ForceField::gradient(self, x, grad)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum MinimizationError {
    #[error("Objective is not finite at iteration {iteration}")]
    NonFinite { iteration: usize },
    #[error("Coordinate vector has {found} values, objective expects {expected}")]
    Dimension { expected: usize, found: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BfgsOptions {
    pub max_iterations: usize,
    /// Converged when the largest gradient component falls below this.
    pub gradient_tolerance: f64,
    /// Converged when an accepted step changes the value by less than this,
    /// relative to the value.
    pub value_tolerance: f64,
    /// Longest step, per coordinate on average, taken from one iteration.
    pub max_step: f64,
}

impl Default for BfgsOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            gradient_tolerance: 1e-4,
            value_tolerance: 1e-12,
            max_step: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizationReport {
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

const ARMIJO_C1: f64 = 1e-4;
const BACKTRACK_FACTOR: f64 = 0.5;
const MAX_BACKTRACKS: usize = 40;

fn max_abs(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

/// Minimizes `objective` in place with BFGS and a backtracking Armijo line
/// search. `x` holds the final point on success, including when the
/// iteration limit is reached without convergence.
pub fn minimize<O: Objective + ?Sized>(
    objective: &O,
    x: &mut [f64],
    options: &BfgsOptions,
) -> Result<MinimizationReport, MinimizationError> {
    let n = objective.dimension();
    if x.len() != n {
        return Err(MinimizationError::Dimension {
            expected: n,
            found: x.len(),
        });
    }
    if n == 0 {
        return Ok(MinimizationReport {
            value: objective.value(x),
            iterations: 0,
            converged: true,
        });
    }

    let mut value = objective.value(x);
    if !value.is_finite() {
        return Err(MinimizationError::NonFinite { iteration: 0 });
    }
    let mut grad = DVector::zeros(n);
    objective.gradient(x, grad.as_mut_slice());
    if grad.iter().any(|g| !g.is_finite()) {
        return Err(MinimizationError::NonFinite { iteration: 0 });
    }

    let max_step_norm = options.max_step * (n as f64).sqrt();
    let mut inv_hessian = DMatrix::<f64>::identity(n, n);
    let mut first_update = true;
    let mut trial = vec![0.0; n];
    let mut trial_grad = DVector::zeros(n);

    for iteration in 1..=options.max_iterations {
        if max_abs(&grad) < options.gradient_tolerance {
            return Ok(MinimizationReport {
                value,
                iterations: iteration - 1,
                converged: true,
            });
        }

        let mut direction = -(&inv_hessian * &grad);
        let mut slope = direction.dot(&grad);
        if slope >= 0.0 {
            // Not a descent direction; restart from steepest descent.
            inv_hessian.fill_with_identity();
            first_update = true;
            direction = -grad.clone();
            slope = direction.dot(&grad);
        }
        let norm = direction.norm();
        if norm > max_step_norm {
            direction *= max_step_norm / norm;
            slope *= max_step_norm / norm;
        }

        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..MAX_BACKTRACKS {
            for (t, (xi, di)) in trial.iter_mut().zip(x.iter().zip(direction.iter())) {
                *t = xi + alpha * di;
            }
            let trial_value = objective.value(&trial);
            if trial_value.is_finite() && trial_value <= value + ARMIJO_C1 * alpha * slope {
                accepted = Some(trial_value);
                break;
            }
            alpha *= BACKTRACK_FACTOR;
        }

        let Some(new_value) = accepted else {
            trace!(iteration, value, "line search stalled");
            return Ok(MinimizationReport {
                value,
                iterations: iteration,
                converged: max_abs(&grad) < options.gradient_tolerance,
            });
        };

        objective.gradient(&trial, trial_grad.as_mut_slice());
        if trial_grad.iter().any(|g| !g.is_finite()) {
            return Err(MinimizationError::NonFinite { iteration });
        }

        let s = &direction * alpha;
        let y = &trial_grad - &grad;
        x.copy_from_slice(&trial);
        std::mem::swap(&mut grad, &mut trial_grad);
        let value_change = (value - new_value).abs();
        value = new_value;

        if value_change <= options.value_tolerance * value.abs().max(1.0) {
            return Ok(MinimizationReport {
                value,
                iterations: iteration,
                converged: true,
            });
        }

        let sy = s.dot(&y);
        if sy > 1e-10 {
            if first_update {
                inv_hessian.fill_with_identity();
                inv_hessian *= sy / y.dot(&y);
                first_update = false;
            }
            let hy = &inv_hessian * &y;
            let yhy = y.dot(&hy);
            let scale = (sy + yhy) / (sy * sy);
            inv_hessian += (&s * s.transpose()) * scale;
            inv_hessian -= (&hy * s.transpose() + &s * hy.transpose()) / sy;
        }
    }

    Ok(MinimizationReport {
        value,
        iterations: options.max_iterations,
        converged: max_abs(&grad) < options.gradient_tolerance,
    })
}
