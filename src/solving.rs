//! Value iteration solver configuration and diagnostics.

use serde::{Deserialize, Serialize};

use crate::error::{MdpError, Result};

/// How one sweep applies the Bellman operator across the grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SweepPolicy {
    /// Read only the previous sweep's table and write into a second buffer.
    Jacobi,
    /// Update in place, days from `D` down to `0`.
    GaussSeidel,
    /// Gauss-Seidel order, storing `(1 - ω) V_old + ω T(V)`.
    Sor { omega: f64 },
}

impl SweepPolicy {
    /// Relaxation factor applied to stored values; `1.0` for unrelaxed sweeps.
    pub fn omega(&self) -> f64 {
        match *self {
            SweepPolicy::Sor { omega } => omega,
            SweepPolicy::Jacobi | SweepPolicy::GaussSeidel => 1.0,
        }
    }

    /// Short name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            SweepPolicy::Jacobi => "jacobi",
            SweepPolicy::GaussSeidel => "gauss-seidel",
            SweepPolicy::Sor { .. } => "sor",
        }
    }
}

/// Configuration for the value iteration loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Update schedule of each sweep.
    pub sweep: SweepPolicy,
    /// Supremum norm tolerance for convergence.
    pub tolerance: f64,
    /// Maximum number of sweeps allowed before giving up.
    pub max_iterations: usize,
    /// Split the Jacobi sweep across day columns with rayon. Ignored by in-place sweeps.
    #[serde(default)]
    pub parallel: bool,
}

impl SolverOptions {
    pub fn new(sweep: SweepPolicy, tolerance: f64, max_iterations: usize) -> Self {
        Self {
            sweep,
            tolerance,
            max_iterations,
            parallel: false,
        }
    }

    /// Enables or disables the parallel Jacobi sweep.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_sweep(mut self, sweep: SweepPolicy) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(MdpError::invalid(
                "tolerance",
                "must be positive and finite",
                self.tolerance,
            ));
        }
        if self.max_iterations == 0 {
            return Err(MdpError::invalid(
                "max_iterations",
                "must be positive",
                0.0,
            ));
        }
        if let SweepPolicy::Sor { omega } = self.sweep {
            if !(1.0..2.0).contains(&omega) {
                return Err(MdpError::invalid("omega", "must lie in [1, 2)", omega));
            }
        }
        Ok(())
    }
}

/// Why a solve stopped without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveOutcome {
    /// The last sweep changed no entry by `tolerance` or more.
    Converged,
    /// `max_iterations` sweeps ran without meeting the tolerance.
    IterationLimitReached,
}

/// Diagnostics returned alongside the value table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolveSummary {
    pub outcome: SolveOutcome,
    /// Number of completed sweeps.
    pub iterations: usize,
    /// Maximum absolute change of the unrelaxed update in the final sweep.
    pub max_diff: f64,
}

impl SolveSummary {
    pub fn is_converged(&self) -> bool {
        self.outcome == SolveOutcome::Converged
    }
}
