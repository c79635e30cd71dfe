//! State grid and reward model of the maintenance problem.
//!
//! A state is a pair `(d, k)`: `d` days elapsed since the last maintenance and
//! `k` accumulated damage levels. Days saturate at `max_days`; the damage level
//! `max_damages` is the failure level that forces a repair back to `(0, 0)`.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{MdpError, Result};

/// Damage probability on day zero of the linear ramp.
pub const BASE_DAMAGE_PROBABILITY: f64 = 0.01;

/// Increase in damage probability between day zero and `max_days`.
pub const DAMAGE_PROBABILITY_RAMP: f64 = 0.19;

/// A `(day, damage)` coordinate on the state grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct State {
    /// Days elapsed since the last maintenance.
    pub day: usize,
    /// Accumulated damage level.
    pub damage: usize,
}

impl State {
    pub fn new(day: usize, damage: usize) -> Self {
        Self { day, damage }
    }

    /// The state every repair resets to.
    pub fn origin() -> Self {
        Self::new(0, 0)
    }
}

/// Dimensions of the `(max_days + 1) x (max_damages + 1)` state grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSpace {
    max_days: usize,
    max_damages: usize,
}

impl StateSpace {
    pub fn new(max_days: usize, max_damages: usize) -> Self {
        Self {
            max_days,
            max_damages,
        }
    }

    /// Largest day index `D`.
    pub fn max_days(&self) -> usize {
        self.max_days
    }

    /// Failure damage level `K`.
    pub fn max_damages(&self) -> usize {
        self.max_damages
    }

    /// Number of day columns, `D + 1`.
    pub fn day_count(&self) -> usize {
        self.max_days + 1
    }

    /// Number of damage levels per day, `K + 1`.
    pub fn damage_count(&self) -> usize {
        self.max_damages + 1
    }

    /// Total number of states on the grid.
    pub fn state_count(&self) -> usize {
        self.day_count() * self.damage_count()
    }

    /// Flat position of `(day, damage)`. Damage levels of one day are contiguous.
    #[inline]
    pub fn index(&self, day: usize, damage: usize) -> usize {
        debug_assert!(day <= self.max_days && damage <= self.max_damages);
        day * self.damage_count() + damage
    }

    /// Inverse of [`index`](Self::index).
    pub fn state_at(&self, index: usize) -> State {
        State::new(index / self.damage_count(), index % self.damage_count())
    }

    pub fn contains(&self, state: State) -> bool {
        state.day <= self.max_days && state.damage <= self.max_damages
    }

    /// Returns an error when `state` falls outside the grid.
    pub fn check(&self, state: State) -> Result<()> {
        if self.contains(state) {
            Ok(())
        } else {
            Err(MdpError::StateOutOfBounds {
                day: state.day,
                damage: state.damage,
                max_days: self.max_days,
                max_damages: self.max_damages,
            })
        }
    }

    /// True iff `damage` is the absorbing failure level `K`.
    #[inline]
    pub fn is_failure_level(&self, damage: usize) -> bool {
        damage == self.max_damages
    }

    /// Day reached after one more step without maintenance, clamped to `D`.
    #[inline]
    pub fn next_day(&self, day: usize) -> usize {
        (day + 1).min(self.max_days)
    }

    /// Days from `D` down to `0`, the in-place sweep order.
    pub fn days_descending(&self) -> impl Iterator<Item = usize> {
        (0..=self.max_days).rev()
    }

    /// Damage levels `0..=K`.
    pub fn damage_levels(&self) -> Range<usize> {
        0..self.damage_count()
    }

    /// Iterates all states in flat index order.
    pub fn states(&self) -> impl Iterator<Item = State> + '_ {
        (0..self.state_count()).map(move |index| self.state_at(index))
    }
}

/// How the per-day damage probability `p(d)` is computed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DamageProbability {
    /// `p(d) = clamp(0.01 + 0.19 * d / D, 0, 1)`.
    #[default]
    LinearRamp,
    /// The same probability on every day.
    Constant { probability: f64 },
}

impl DamageProbability {
    /// Probability that one more day without maintenance adds a damage level.
    pub fn at(&self, day: usize, max_days: usize) -> f64 {
        match *self {
            DamageProbability::LinearRamp => {
                let ramp = DAMAGE_PROBABILITY_RAMP * day as f64 / max_days as f64;
                (BASE_DAMAGE_PROBABILITY + ramp).clamp(0.0, 1.0)
            }
            DamageProbability::Constant { probability } => probability,
        }
    }
}

/// Costs, discounting and grid dimensions of the maintenance problem.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Largest day index `D`; later days saturate here.
    pub max_days: usize,
    /// Failure damage level `K`.
    pub max_damages: usize,
    /// Fixed cost `C` of a maintenance action.
    pub maintenance_cost: f64,
    /// Cost `R` paid when the failure level is reached.
    pub repair_cost: f64,
    /// Discount factor `γ` in `(0, 1]`.
    pub discount: f64,
    /// Damage probability model, the linear ramp unless overridden.
    #[serde(default)]
    pub damage_probability: DamageProbability,
}

impl ModelParameters {
    /// Creates a model using the linear damage probability ramp.
    pub fn new(
        max_days: usize,
        max_damages: usize,
        maintenance_cost: f64,
        repair_cost: f64,
        discount: f64,
    ) -> Self {
        Self {
            max_days,
            max_damages,
            maintenance_cost,
            repair_cost,
            discount,
            damage_probability: DamageProbability::LinearRamp,
        }
    }

    /// Overrides the damage probability model.
    pub fn with_damage_probability(mut self, damage_probability: DamageProbability) -> Self {
        self.damage_probability = damage_probability;
        self
    }

    /// Overrides the repair cost `R`.
    pub fn with_repair_cost(mut self, repair_cost: f64) -> Self {
        self.repair_cost = repair_cost;
        self
    }

    /// Overrides the discount factor `γ`.
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn state_space(&self) -> StateSpace {
        StateSpace::new(self.max_days, self.max_damages)
    }

    /// `p(d)` for this model.
    pub fn damage_probability(&self, day: usize) -> f64 {
        self.damage_probability.at(day, self.max_days)
    }

    /// Checks costs, discount and the probability model.
    pub fn validate(&self) -> Result<()> {
        if !self.maintenance_cost.is_finite() {
            return Err(MdpError::invalid(
                "maintenance_cost",
                "must be finite",
                self.maintenance_cost,
            ));
        }
        if !self.repair_cost.is_finite() {
            return Err(MdpError::invalid(
                "repair_cost",
                "must be finite",
                self.repair_cost,
            ));
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(MdpError::invalid(
                "discount",
                "must lie in (0, 1]",
                self.discount,
            ));
        }
        match self.damage_probability {
            DamageProbability::LinearRamp if self.max_days == 0 => Err(MdpError::invalid(
                "max_days",
                "must be positive for the linear damage ramp",
                0.0,
            )),
            DamageProbability::Constant { probability } if !(0.0..=1.0).contains(&probability) => {
                Err(MdpError::invalid(
                    "damage_probability",
                    "must lie in [0, 1]",
                    probability,
                ))
            }
            _ => Ok(()),
        }
    }
}
