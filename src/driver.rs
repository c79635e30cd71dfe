//! Value iteration driver: repeated Bellman sweeps until convergence.
//!
//! A solve starts from a zero table and runs sweeps until the largest
//! per-entry change of a sweep falls below the tolerance, the iteration limit
//! is exhausted, or an entry becomes non-finite. The three sweep policies
//! differ only in which table the operator reads:
//!
//! - **Jacobi** reads the previous sweep's table and writes into a second
//!   buffer, swapped after the sweep. Order is irrelevant, so day columns may
//!   be computed in parallel.
//! - **Gauss-Seidel** updates in place, days from `D` down to `0`. The defer
//!   branch then sees day `d + 1` already refreshed while the maintain branch
//!   still reads the previous sweep's day `0`.
//! - **SOR** follows the Gauss-Seidel order and stores
//!   `(1 - ω) V_old + ω T(V)`. The reported change is measured on the
//!   unrelaxed `T(V)`, so convergence does not depend on `ω`.

use rayon::prelude::*;

use crate::bellman::BellmanOperator;
use crate::error::{MdpError, Result};
use crate::model::{ModelParameters, State};
use crate::observer::{NoopObserver, SweepObserver, SweepReport};
use crate::options::Configuration;
use crate::solving::{SolveOutcome, SolveSummary, SweepPolicy};
use crate::table::{PolicyTable, ValueTable};

/// First non-finite cell met by a sweep.
#[derive(Clone, Copy, Debug)]
struct NonFinite {
    day: usize,
    damage: usize,
    value: f64,
}

type SweepResult = std::result::Result<f64, NonFinite>;

/// Runs value iteration for one validated [`Configuration`].
#[derive(Clone, Debug)]
pub struct IterationDriver {
    config: Configuration,
    operator: BellmanOperator,
}

impl IterationDriver {
    /// Validates `config` and prepares the Bellman operator.
    pub fn new(config: Configuration) -> Result<Self> {
        config.validate()?;
        Ok(Self::new_unchecked(config))
    }

    /// Skips validation so the divergence guard can be exercised.
    pub(crate) fn new_unchecked(config: Configuration) -> Self {
        Self {
            operator: BellmanOperator::new(config.model),
            config,
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Solves without progress callbacks.
    pub fn solve(&self) -> Result<Solution> {
        self.solve_with_observer(&mut NoopObserver)
    }

    /// Solves, reporting every sweep and the final table to `observer`.
    ///
    /// Returns [`MdpError::Diverged`] as soon as an entry becomes non-finite.
    /// Exhausting the iteration limit is not an error; it is reported as
    /// [`SolveOutcome::IterationLimitReached`].
    pub fn solve_with_observer<O>(&self, observer: &mut O) -> Result<Solution>
    where
        O: SweepObserver + ?Sized,
    {
        let options = &self.config.solver;
        let space = self.operator.state_space();
        let mut table = ValueTable::zeros(space);
        let mut scratch = match options.sweep {
            SweepPolicy::Jacobi => Some(ValueTable::zeros(space)),
            SweepPolicy::GaussSeidel | SweepPolicy::Sor { .. } => None,
        };

        log::debug!(
            "starting {} value iteration over {} states (tolerance {:e}, limit {})",
            options.sweep.name(),
            space.state_count(),
            options.tolerance,
            options.max_iterations
        );

        let mut max_diff = f64::INFINITY;
        let mut iterations = 0usize;
        let mut outcome = SolveOutcome::IterationLimitReached;

        while iterations < options.max_iterations {
            let sweep = match scratch.as_mut() {
                Some(next) => {
                    let result = self.sweep_jacobi(table.as_slice(), next.as_mut_slice());
                    if result.is_ok() {
                        std::mem::swap(&mut table, next);
                    }
                    result
                }
                None => self.sweep_in_place(table.as_mut_slice(), options.sweep.omega()),
            };
            max_diff = sweep.map_err(|cell| self.diverged(iterations, cell))?;
            iterations += 1;

            log::debug!("sweep {iterations}: max change {max_diff:e}");
            observer.on_sweep(&SweepReport {
                iteration: iterations,
                max_diff,
            });

            if max_diff < options.tolerance {
                outcome = SolveOutcome::Converged;
                break;
            }
        }

        match outcome {
            SolveOutcome::Converged => log::info!(
                "{} value iteration converged in {iterations} sweeps",
                options.sweep.name()
            ),
            SolveOutcome::IterationLimitReached => log::warn!(
                "{} value iteration stopped at the limit of {iterations} sweeps; max change {max_diff:e}",
                options.sweep.name()
            ),
        }

        let summary = SolveSummary {
            outcome,
            iterations,
            max_diff,
        };
        observer.on_finish(&summary, &table);

        Ok(Solution {
            table,
            summary,
            model: self.config.model,
        })
    }

    fn diverged(&self, iteration: usize, cell: NonFinite) -> MdpError {
        log::error!(
            "{} value iteration diverged in sweep {iteration} at (day {}, damage {}): {}",
            self.config.solver.sweep.name(),
            cell.day,
            cell.damage,
            cell.value
        );
        MdpError::Diverged {
            iteration,
            day: cell.day,
            damage: cell.damage,
            value: cell.value,
        }
    }

    /// Gauss-Seidel (`omega == 1`) or SOR sweep over `values`, days descending.
    fn sweep_in_place(&self, values: &mut [f64], omega: f64) -> SweepResult {
        let space = self.operator.state_space();
        let mut max_diff = 0.0_f64;

        for day in space.days_descending() {
            for damage in space.damage_levels() {
                let index = space.index(day, damage);
                let previous = values[index];
                let update = self.operator.update(values, State::new(day, damage));
                // With omega == 1 the first term is exactly zero, so the stored value is `update`.
                let relaxed = (1.0 - omega) * previous + omega * update;
                if !relaxed.is_finite() {
                    return Err(NonFinite {
                        day,
                        damage,
                        value: relaxed,
                    });
                }
                values[index] = relaxed;
                max_diff = max_diff.max((update - previous).abs());
            }
        }

        Ok(max_diff)
    }

    /// Jacobi sweep reading `current` and writing `next`, one day column at a time.
    fn sweep_jacobi(&self, current: &[f64], next: &mut [f64]) -> SweepResult {
        let width = self.operator.state_space().damage_count();

        if self.config.solver.parallel {
            let columns: Vec<SweepResult> = next
                .par_chunks_mut(width)
                .enumerate()
                .map(|(day, column)| self.jacobi_column(current, day, column))
                .collect();
            // Folding in day order reports the same cell as the sequential sweep.
            columns
                .into_iter()
                .try_fold(0.0_f64, |acc, column| column.map(|diff| acc.max(diff)))
        } else {
            next.chunks_mut(width)
                .enumerate()
                .try_fold(0.0_f64, |acc, (day, column)| {
                    self.jacobi_column(current, day, column)
                        .map(|diff| acc.max(diff))
                })
        }
    }

    fn jacobi_column(&self, current: &[f64], day: usize, column: &mut [f64]) -> SweepResult {
        let space = self.operator.state_space();
        let mut max_diff = 0.0_f64;

        for (damage, slot) in column.iter_mut().enumerate() {
            let update = self.operator.update(current, State::new(day, damage));
            if !update.is_finite() {
                return Err(NonFinite {
                    day,
                    damage,
                    value: update,
                });
            }
            *slot = update;
            max_diff = max_diff.max((update - current[space.index(day, damage)]).abs());
        }

        Ok(max_diff)
    }
}

/// Final value table of a solve together with its diagnostics.
#[derive(Clone, Debug)]
pub struct Solution {
    table: ValueTable,
    summary: SolveSummary,
    model: ModelParameters,
}

impl Solution {
    /// Read-only view of the final value table.
    pub fn table(&self) -> &ValueTable {
        &self.table
    }

    pub fn summary(&self) -> &SolveSummary {
        &self.summary
    }

    /// Model the table was solved for.
    pub fn model(&self) -> &ModelParameters {
        &self.model
    }

    pub fn is_converged(&self) -> bool {
        self.summary.is_converged()
    }

    /// Gives up the table regardless of the outcome.
    pub fn into_table(self) -> ValueTable {
        self.table
    }

    /// Gives up the table, or [`MdpError::DidNotConverge`] if the iteration limit was hit.
    pub fn into_converged(self) -> Result<ValueTable> {
        match self.summary.outcome {
            SolveOutcome::Converged => Ok(self.table),
            SolveOutcome::IterationLimitReached => Err(MdpError::DidNotConverge {
                iterations: self.summary.iterations,
                max_diff: self.summary.max_diff,
            }),
        }
    }

    /// Greedy action of every state against the final table.
    pub fn policy(&self) -> PolicyTable {
        let operator = BellmanOperator::new(self.model);
        let space = operator.state_space();
        let values = self.table.as_slice();
        let actions = space
            .states()
            .map(|state| operator.backup(values, state).action)
            .collect();
        PolicyTable::new(space, actions)
    }
}

/// Validates `config` and solves it.
pub fn solve(config: &Configuration) -> Result<Solution> {
    IterationDriver::new(*config)?.solve()
}
