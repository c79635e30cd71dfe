//! Dense value and policy tables over the state grid.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::bellman::Action;
use crate::error::{MdpError, Result};
use crate::model::{State, StateSpace};

/// Minimum expected discounted cost for every `(day, damage)` state.
///
/// Stored as a `(K + 1) x (D + 1)` column-major matrix so that each day is one
/// contiguous column and the matrix's linear index equals
/// [`StateSpace::index`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ValueTableRepr")]
pub struct ValueTable {
    values: DMatrix<f64>,
}

#[derive(Deserialize)]
struct ValueTableRepr {
    values: DMatrix<f64>,
}

impl TryFrom<ValueTableRepr> for ValueTable {
    type Error = MdpError;

    fn try_from(repr: ValueTableRepr) -> Result<Self> {
        let (rows, columns) = repr.values.shape();
        if rows == 0 {
            return Err(MdpError::dimension_mismatch("value table damage levels", 1, 0));
        }
        if columns == 0 {
            return Err(MdpError::dimension_mismatch("value table days", 1, 0));
        }
        Ok(Self {
            values: repr.values,
        })
    }
}

impl ValueTable {
    /// Zero-initialized table, the starting point of every solve.
    pub fn zeros(space: StateSpace) -> Self {
        Self {
            values: DMatrix::zeros(space.damage_count(), space.day_count()),
        }
    }

    /// Wraps a flat buffer laid out in [`StateSpace::index`] order.
    pub fn from_vec(space: StateSpace, values: Vec<f64>) -> Result<Self> {
        if values.len() != space.state_count() {
            return Err(MdpError::dimension_mismatch(
                "value table length",
                space.state_count(),
                values.len(),
            ));
        }
        Ok(Self {
            values: DMatrix::from_vec(space.damage_count(), space.day_count(), values),
        })
    }

    pub fn state_space(&self) -> StateSpace {
        StateSpace::new(self.values.ncols() - 1, self.values.nrows() - 1)
    }

    /// Value of `(day, damage)`.
    ///
    /// # Panics
    ///
    /// Panics when the state lies outside the grid; use [`get`](Self::get) for a checked lookup.
    pub fn value(&self, day: usize, damage: usize) -> f64 {
        self.values[(damage, day)]
    }

    /// Checked lookup of a state's value.
    pub fn get(&self, state: State) -> Result<f64> {
        self.state_space().check(state)?;
        Ok(self.value(state.day, state.damage))
    }

    /// All damage levels of one day, ordered by damage.
    pub fn day(&self, day: usize) -> &[f64] {
        let width = self.values.nrows();
        &self.values.as_slice()[day * width..(day + 1) * width]
    }

    /// Flat view in [`StateSpace::index`] order.
    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        self.values.as_mut_slice()
    }

    /// Underlying matrix with damage levels as rows and days as columns.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Iterates `(state, value)` pairs in flat index order.
    pub fn iter(&self) -> impl Iterator<Item = (State, f64)> + '_ {
        let space = self.state_space();
        self.as_slice()
            .iter()
            .enumerate()
            .map(move |(index, value)| (space.state_at(index), *value))
    }

    /// Largest absolute entry-wise difference, or `None` when the grids differ in shape.
    pub fn max_abs_difference(&self, other: &ValueTable) -> Option<f64> {
        if self.values.shape() != other.values.shape() {
            return None;
        }
        Some(
            self.as_slice()
                .iter()
                .zip(other.as_slice())
                .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs())),
        )
    }
}

/// Cost-minimizing action for every state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyTableRepr")]
pub struct PolicyTable {
    space: StateSpace,
    actions: Vec<Action>,
}

#[derive(Deserialize)]
struct PolicyTableRepr {
    space: StateSpace,
    actions: Vec<Action>,
}

impl TryFrom<PolicyTableRepr> for PolicyTable {
    type Error = MdpError;

    fn try_from(repr: PolicyTableRepr) -> Result<Self> {
        Self::from_actions(repr.space, repr.actions)
    }
}

impl PolicyTable {
    pub(crate) fn new(space: StateSpace, actions: Vec<Action>) -> Self {
        debug_assert_eq!(actions.len(), space.state_count());
        Self { space, actions }
    }

    /// Wraps actions laid out in [`StateSpace::index`] order.
    ///
    /// The failure level must hold [`Action::ForcedRepair`] and no other
    /// level may.
    pub fn from_actions(space: StateSpace, actions: Vec<Action>) -> Result<Self> {
        if actions.len() != space.state_count() {
            return Err(MdpError::dimension_mismatch(
                "policy table length",
                space.state_count(),
                actions.len(),
            ));
        }
        for (index, action) in actions.iter().enumerate() {
            let state = space.state_at(index);
            let repair = *action == Action::ForcedRepair;
            if repair != space.is_failure_level(state.damage) {
                return Err(MdpError::InadmissibleAction {
                    day: state.day,
                    damage: state.damage,
                    action: *action,
                });
            }
        }
        Ok(Self::new(space, actions))
    }

    pub fn state_space(&self) -> StateSpace {
        self.space
    }

    /// Action at `(day, damage)`.
    ///
    /// # Panics
    ///
    /// Panics when the state lies outside the grid.
    pub fn action(&self, day: usize, damage: usize) -> Action {
        self.actions[self.space.index(day, damage)]
    }

    /// Flat view in [`StateSpace::index`] order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}
