//! Monte Carlo evaluation of a maintenance policy.
//!
//! Trajectories follow the same transition structure as the Bellman operator:
//! maintaining pays `C` and moves to `(0, k)`, deferring moves to
//! `(min(d + 1, D), k)` or, with probability `p(d)`, to damage `k + 1`, and the
//! failure level pays `R` and moves to `(0, 0)`. The mean discounted cost from a
//! start state estimates that state's value under the policy.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Bernoulli, Distribution};

use crate::bellman::Action;
use crate::error::{MdpError, Result};
use crate::model::{ModelParameters, State};
use crate::table::PolicyTable;

/// Controls the number and length of simulated trajectories.
#[derive(Clone, Copy, Debug)]
pub struct SimulationOptions {
    /// Number of independent trajectories.
    pub episodes: usize,
    /// Steps per trajectory; later costs are truncated.
    pub horizon: usize,
    /// Seed of the pseudo-random generator.
    pub seed: u64,
}

impl SimulationOptions {
    pub fn new(episodes: usize, horizon: usize, seed: u64) -> Self {
        Self {
            episodes,
            horizon,
            seed,
        }
    }
}

/// Sample statistics of simulated discounted costs.
#[derive(Clone, Copy, Debug)]
pub struct SimulationSummary {
    pub episodes: usize,
    /// Sample mean of the discounted cost.
    pub mean_cost: f64,
    /// Standard error of `mean_cost`.
    pub standard_error: f64,
}

/// Simulates `policy` under `model` from `start`.
pub fn simulate_policy(
    model: &ModelParameters,
    policy: &PolicyTable,
    start: State,
    options: &SimulationOptions,
) -> Result<SimulationSummary> {
    let space = model.state_space();
    if policy.state_space() != space {
        return Err(MdpError::dimension_mismatch(
            "policy table states",
            space.state_count(),
            policy.state_space().state_count(),
        ));
    }
    space.check(start)?;
    if options.episodes == 0 {
        return Err(MdpError::invalid("episodes", "must be positive", 0.0));
    }

    let damage_draws = (0..space.day_count())
        .map(|day| {
            let probability = model.damage_probability(day);
            Bernoulli::new(probability).map_err(|_| MdpError::InvalidProbability { day, probability })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rng = SmallRng::seed_from_u64(options.seed);
    let mut sum = 0.0_f64;
    let mut sum_squares = 0.0_f64;

    for _ in 0..options.episodes {
        let mut state = start;
        let mut weight = 1.0_f64;
        let mut total = 0.0_f64;

        for _ in 0..options.horizon {
            let (cost, next) = match policy.action(state.day, state.damage) {
                Action::ForcedRepair => (model.repair_cost, State::origin()),
                Action::Maintain => (model.maintenance_cost, State::new(0, state.damage)),
                Action::Defer => {
                    let damaged = damage_draws[state.day].sample(&mut rng);
                    let damage = state.damage + usize::from(damaged);
                    (0.0, State::new(space.next_day(state.day), damage))
                }
            };
            total += weight * cost;
            weight *= model.discount;
            state = next;
        }

        sum += total;
        sum_squares += total * total;
    }

    let n = options.episodes as f64;
    let mean_cost = sum / n;
    let standard_error = if options.episodes > 1 {
        let variance = ((sum_squares - n * mean_cost * mean_cost) / (n - 1.0)).max(0.0);
        (variance / n).sqrt()
    } else {
        0.0
    };

    Ok(SimulationSummary {
        episodes: options.episodes,
        mean_cost,
        standard_error,
    })
}
