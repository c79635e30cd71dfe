//! Complete, immutable input of one solve.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{DamageProbability, ModelParameters};
use crate::solving::{SolverOptions, SweepPolicy};

/// Aggregated model and solver configuration.
///
/// Every numeric field is required; there are no defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Grid dimensions, costs and discounting.
    pub model: ModelParameters,
    /// Sweep policy, tolerance and iteration limit.
    pub solver: SolverOptions,
}

impl Configuration {
    pub fn new(model: ModelParameters, solver: SolverOptions) -> Self {
        Self { model, solver }
    }

    /// Override the sweep policy while preserving other settings.
    pub fn with_sweep(mut self, sweep: SweepPolicy) -> Self {
        self.solver.sweep = sweep;
        self
    }

    /// Override the convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.solver.tolerance = tolerance;
        self
    }

    /// Override the maximum number of sweeps.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.solver.max_iterations = max_iterations;
        self
    }

    /// Enable or disable the parallel Jacobi sweep.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.solver.parallel = parallel;
        self
    }

    /// Override the repair cost `R`.
    pub fn with_repair_cost(mut self, repair_cost: f64) -> Self {
        self.model.repair_cost = repair_cost;
        self
    }

    /// Override the discount factor `γ`.
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.model.discount = discount;
        self
    }

    /// Override the damage probability model.
    pub fn with_damage_probability(mut self, damage_probability: DamageProbability) -> Self {
        self.model.damage_probability = damage_probability;
        self
    }

    /// Rejects configurations that cannot start a solve.
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.solver.validate()
    }
}
