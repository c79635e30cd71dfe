//! Value iteration for a two-action equipment maintenance Markov decision process.
//!
//! Equipment accumulates damage at a rate that grows with the days elapsed
//! since its last maintenance. Every day the operator either maintains (fixed
//! cost, day counter reset) or defers; reaching the failure damage level forces
//! an expensive repair back to the pristine state. This crate computes the
//! minimum expected discounted cost of every `(day, damage)` state by iterating
//! the Bellman operator to its fixed point. It offers tools to
//!
//! - describe the state grid and cost model (`model` module),
//! - apply the one-step Bellman backup (`bellman` module),
//! - run Jacobi, Gauss-Seidel or SOR sweeps to convergence (`driver` module),
//! - observe progress without printing from the numeric loop (`observer` module), and
//! - check a derived policy by Monte Carlo simulation (`simulation` module).
//!
//! # Quick start
//!
//! ```no_run
//! use maintenance_mdp::{solve, Configuration, ModelParameters, SolverOptions, SweepPolicy};
//!
//! let model = ModelParameters::new(365, 10, 5.0, 100.0, 0.8);
//! let solver = SolverOptions::new(SweepPolicy::Sor { omega: 1.01 }, 1e-6, 10_000);
//! let config = Configuration::new(model, solver);
//!
//! let solution = solve(&config).expect("finite values");
//! assert!(solution.is_converged());
//! println!("V(0, 0) = {}", solution.table().value(0, 0));
//! println!("action at (100, 3): {:?}", solution.policy().action(100, 3));
//! ```
//!
//! Divergence is returned as [`MdpError::Diverged`] with the offending cell;
//! hitting the iteration limit is a normal [`SolveOutcome`] that callers must
//! inspect.

pub mod bellman;
pub mod driver;
pub mod error;
pub mod model;
pub mod observer;
pub mod options;
pub mod simulation;
pub mod solving;
pub mod table;

pub use bellman::{bellman_update, Action, BellmanOperator};
pub use driver::{solve, IterationDriver, Solution};
pub use error::{MdpError, Result};
pub use model::{DamageProbability, ModelParameters, State, StateSpace};
pub use observer::{LoggingObserver, NoopObserver, SweepObserver, SweepReport};
pub use options::Configuration;
pub use solving::{SolveOutcome, SolveSummary, SolverOptions, SweepPolicy};
pub use table::{PolicyTable, ValueTable};
