//! One-step Bellman backup of the maintenance problem.
//!
//! For a state `(d, k)` below the failure level the operator returns
//! `min(maintain, defer)` where
//!
//! - `maintain = C + γ V(0, k)`: pay for maintenance, keep the damage, reset the day;
//! - `defer = γ [(1 - p(d)) V(d', k) + p(d) V(d', k + 1)]` with `d' = min(d + 1, D)`.
//!
//! When `k + 1 == K` the damaged branch is the failure transition itself,
//! `R + γ V(0, 0)`, so row `K` of the table is never read by other rows. At
//! `k == K` there is no choice: the cost is `R + γ V(0, 0)` with no operating
//! cost on top.

use serde::{Deserialize, Serialize};

use crate::error::{MdpError, Result};
use crate::model::{ModelParameters, State, StateSpace};
use crate::table::ValueTable;

/// Decision taken in a state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Pay the maintenance cost and reset the day counter.
    Maintain,
    /// Do nothing and let damage accumulate.
    Defer,
    /// The failure level's only transition: pay the repair cost and reset to `(0, 0)`.
    ForcedRepair,
}

/// Value of a backup together with the action that attains it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Backup {
    pub value: f64,
    pub action: Action,
}

/// Bellman operator for a fixed model. Reads values, never writes them.
#[derive(Clone, Debug)]
pub struct BellmanOperator {
    model: ModelParameters,
    space: StateSpace,
    probabilities: Vec<f64>,
}

impl BellmanOperator {
    pub fn new(model: ModelParameters) -> Self {
        let space = model.state_space();
        let probabilities = (0..space.day_count())
            .map(|day| model.damage_probability(day))
            .collect();
        Self {
            model,
            space,
            probabilities,
        }
    }

    pub fn model(&self) -> &ModelParameters {
        &self.model
    }

    pub fn state_space(&self) -> StateSpace {
        self.space
    }

    /// Cached `p(day)`.
    #[inline]
    pub fn damage_probability(&self, day: usize) -> f64 {
        self.probabilities[day]
    }

    /// `R + γ V(0, 0)`.
    #[inline]
    pub fn forced_repair_cost(&self, values: &[f64]) -> f64 {
        self.model.repair_cost + self.model.discount * values[self.space.index(0, 0)]
    }

    /// `C + γ V(0, k)`.
    #[inline]
    pub fn maintain_cost(&self, values: &[f64], damage: usize) -> f64 {
        self.model.maintenance_cost + self.model.discount * values[self.space.index(0, damage)]
    }

    /// Discounted expected value of doing nothing in `state`.
    #[inline]
    pub fn defer_cost(&self, values: &[f64], state: State) -> f64 {
        let next = self.space.next_day(state.day);
        let p = self.probabilities[state.day];
        let undamaged = values[self.space.index(next, state.damage)];
        let damaged = if state.damage + 1 < self.space.max_damages() {
            values[self.space.index(next, state.damage + 1)]
        } else {
            self.forced_repair_cost(values)
        };
        self.model.discount * ((1.0 - p) * undamaged + p * damaged)
    }

    /// Optimal one-step value and the action attaining it.
    ///
    /// `values` is a flat table in [`StateSpace::index`] order. Ties go to
    /// [`Action::Maintain`].
    #[inline]
    pub fn backup(&self, values: &[f64], state: State) -> Backup {
        if self.space.is_failure_level(state.damage) {
            return Backup {
                value: self.forced_repair_cost(values),
                action: Action::ForcedRepair,
            };
        }
        let maintain = self.maintain_cost(values, state.damage);
        let defer = self.defer_cost(values, state);
        if defer < maintain {
            Backup {
                value: defer,
                action: Action::Defer,
            }
        } else {
            Backup {
                value: maintain,
                action: Action::Maintain,
            }
        }
    }

    /// Optimal one-step value of `state`.
    #[inline]
    pub fn update(&self, values: &[f64], state: State) -> f64 {
        self.backup(values, state).value
    }

    /// Returns an error unless `table` covers this operator's grid.
    pub fn check_table(&self, table: &ValueTable) -> Result<()> {
        let found = table.state_space();
        if found != self.space {
            return Err(MdpError::dimension_mismatch(
                "value table states",
                self.space.state_count(),
                found.state_count(),
            ));
        }
        Ok(())
    }

    /// Checked one-step value of `state` against `table`.
    pub fn update_table(&self, table: &ValueTable, state: State) -> Result<f64> {
        self.check_table(table)?;
        self.space.check(state)?;
        Ok(self.update(table.as_slice(), state))
    }

    /// Largest `|T(V)(s) - V(s)|` over the grid.
    pub fn max_residual(&self, table: &ValueTable) -> Result<f64> {
        self.check_table(table)?;
        let values = table.as_slice();
        Ok(table.iter().fold(0.0_f64, |acc, (state, value)| {
            acc.max((self.update(values, state) - value).abs())
        }))
    }
}

/// Applies the Bellman operator of `model` to one state of `table`.
///
/// Builds a fresh operator on every call; sweeps and whole-table checks
/// should hold a [`BellmanOperator`] instead.
pub fn bellman_update(table: &ValueTable, state: State, model: &ModelParameters) -> Result<f64> {
    BellmanOperator::new(*model).update_table(table, state)
}
