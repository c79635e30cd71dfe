use thiserror::Error;

use crate::bellman::Action;

/// Unified error type for `maintenance_mdp` operations.
#[derive(Debug, Error)]
pub enum MdpError {
    /// Raised before a solve when a configuration field is out of range.
    #[error("invalid configuration: {parameter} {reason} (found {value})")]
    InvalidConfiguration {
        /// Name of the offending field.
        parameter: &'static str,
        /// Human-readable constraint that was violated.
        reason: &'static str,
        /// The value that was supplied.
        value: f64,
    },

    /// Raised when a value table entry becomes NaN or infinite mid-sweep.
    #[error(
        "value iteration diverged during sweep {iteration} at state (day {day}, damage {damage}): {value}"
    )]
    Diverged {
        /// Zero-based index of the sweep that produced the non-finite value.
        iteration: usize,
        /// Day coordinate of the first non-finite cell.
        day: usize,
        /// Damage coordinate of the first non-finite cell.
        damage: usize,
        /// The non-finite value itself.
        value: f64,
    },

    /// Raised when a caller requires a converged table but the solve hit its iteration limit.
    #[error("value iteration did not converge after {iterations} sweeps; last max change {max_diff}")]
    DidNotConverge {
        /// Number of sweeps performed before termination.
        iterations: usize,
        /// Maximum absolute change in the last sweep.
        max_diff: f64,
    },

    /// Raised when a state lies outside the configured grid.
    #[error(
        "state (day {day}, damage {damage}) lies outside the grid [0, {max_days}] x [0, {max_damages}]"
    )]
    StateOutOfBounds {
        day: usize,
        damage: usize,
        max_days: usize,
        max_damages: usize,
    },

    /// Raised when provided buffers have incompatible dimensions.
    #[error("dimension mismatch in {context}: expected {expected} but found {found}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    /// Raised when a per-day damage probability cannot parameterize a Bernoulli draw.
    #[error("damage probability {probability} on day {day} is not a valid probability")]
    InvalidProbability { day: usize, probability: f64 },

    /// Raised when a policy table assigns an action a state does not admit.
    #[error("action {action:?} is not admissible at state (day {day}, damage {damage})")]
    InadmissibleAction {
        day: usize,
        damage: usize,
        action: Action,
    },
}

impl MdpError {
    /// Helper to format an [`InvalidConfiguration`](MdpError::InvalidConfiguration) error.
    pub fn invalid(parameter: &'static str, reason: &'static str, value: f64) -> Self {
        Self::InvalidConfiguration {
            parameter,
            reason,
            value,
        }
    }

    /// Helper to format a [`DimensionMismatch`](MdpError::DimensionMismatch) error.
    pub fn dimension_mismatch(context: &'static str, expected: usize, found: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            found,
        }
    }
}

/// Type alias for results returned by this crate.
pub type Result<T> = std::result::Result<T, MdpError>;
