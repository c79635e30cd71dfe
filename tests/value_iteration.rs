use approx::{assert_abs_diff_eq, assert_relative_eq};
use maintenance_mdp::simulation::{simulate_policy, SimulationOptions};
use maintenance_mdp::{
    bellman_update, solve, Action, BellmanOperator, Configuration, DamageProbability, IterationDriver,
    LoggingObserver, ModelParameters, SolveOutcome, SolverOptions, State, SweepPolicy,
};

fn configuration(model: ModelParameters, sweep: SweepPolicy, tolerance: f64) -> Configuration {
    Configuration::new(model, SolverOptions::new(sweep, tolerance, 100_000))
}

/// All three schedules share one fixed point even though their paths differ.
#[test]
fn sweep_policies_agree_on_the_fixed_point() {
    let model = ModelParameters::new(60, 5, 5.0, 100.0, 0.9);
    let jacobi = solve(&configuration(model, SweepPolicy::Jacobi, 1e-10)).unwrap();
    let gauss_seidel = solve(&configuration(model, SweepPolicy::GaussSeidel, 1e-10)).unwrap();
    let sor_unit = solve(&configuration(model, SweepPolicy::Sor { omega: 1.0 }, 1e-10)).unwrap();
    let sor = solve(&configuration(model, SweepPolicy::Sor { omega: 1.01 }, 1e-10)).unwrap();

    for solution in [&jacobi, &gauss_seidel, &sor_unit, &sor] {
        assert!(solution.is_converged());
    }
    let reference = jacobi.table();
    for other in [&gauss_seidel, &sor_unit, &sor] {
        let gap = reference.max_abs_difference(other.table()).unwrap();
        assert!(gap < 1e-7, "fixed points differ by {gap}");
    }
    assert_eq!(gauss_seidel.policy(), sor_unit.policy());
}

/// With certain damage every day, deferring at damage 0 buys one step of delay
/// before maintaining forever at damage 1: a geometric series independent of the day.
#[test]
fn certain_damage_scenario_has_closed_form_values() {
    let model = ModelParameters::new(5, 2, 5.0, 100.0, 0.9)
        .with_damage_probability(DamageProbability::Constant { probability: 1.0 });
    for sweep in [
        SweepPolicy::Jacobi,
        SweepPolicy::GaussSeidel,
        SweepPolicy::Sor { omega: 1.01 },
    ] {
        let solution = solve(&configuration(model, sweep, 1e-6)).unwrap();
        assert!(solution.is_converged());
        let table = solution.table();
        let policy = solution.policy();

        let maintain_forever = 5.0 / (1.0 - 0.9);
        for day in 0..=5 {
            assert_abs_diff_eq!(table.value(day, 1), maintain_forever, epsilon = 1e-4);
            assert_abs_diff_eq!(table.value(day, 0), 0.9 * maintain_forever, epsilon = 1e-4);
            assert_abs_diff_eq!(
                table.value(day, 2),
                100.0 + 0.9 * 0.9 * maintain_forever,
                epsilon = 1e-4
            );
            assert_eq!(policy.action(day, 0), Action::Defer);
            assert_eq!(policy.action(day, 1), Action::Maintain);
            assert_eq!(policy.action(day, 2), Action::ForcedRepair);
        }
    }
}

/// Without damage, deferring is free forever and only the failure row carries cost.
#[test]
fn zero_damage_scenario_costs_nothing_below_failure() {
    let model = ModelParameters::new(5, 2, 5.0, 100.0, 0.9)
        .with_damage_probability(DamageProbability::Constant { probability: 0.0 });
    let solution = solve(&configuration(model, SweepPolicy::GaussSeidel, 1e-6)).unwrap();

    assert!(solution.is_converged());
    assert_eq!(solution.summary().iterations, 2);
    for day in 0..=5 {
        assert_eq!(solution.table().value(day, 0), 0.0);
        assert_eq!(solution.table().value(day, 1), 0.0);
        assert_eq!(solution.table().value(day, 2), 100.0);
        assert_eq!(solution.policy().action(day, 0), Action::Defer);
    }
}

#[test]
fn failure_row_is_repair_plus_discounted_origin() {
    let model = ModelParameters::new(30, 4, 5.0, 100.0, 0.95);
    let tolerance = 1e-8;
    for (sweep, slack) in [
        (SweepPolicy::Jacobi, 1.0),
        (SweepPolicy::GaussSeidel, 1.0),
        (SweepPolicy::Sor { omega: 1.01 }, 2.0),
    ] {
        let solution = solve(&configuration(model, sweep, tolerance)).unwrap();
        let table = solution.table();
        let expected = 100.0 + 0.95 * table.value(0, 0);
        for day in 0..=30 {
            assert!((table.value(day, 4) - expected).abs() < slack * tolerance);
            assert_eq!(
                bellman_update(table, State::new(day, 4), &model).unwrap(),
                expected,
                "the operator itself is exact at the failure level"
            );
        }
    }
}

#[test]
fn converged_table_is_a_fixed_point() {
    let model = ModelParameters::new(40, 4, 5.0, 100.0, 0.95);
    let operator = BellmanOperator::new(model);
    let tolerance = 1e-8;
    for sweep in [SweepPolicy::Jacobi, SweepPolicy::GaussSeidel] {
        let solution = solve(&configuration(model, sweep, tolerance)).unwrap();
        let residual = operator.max_residual(solution.table()).unwrap();
        assert!(residual <= tolerance, "{sweep:?}: residual {residual}");
    }
}

#[test]
fn higher_repair_cost_never_lowers_values() {
    let base = ModelParameters::new(50, 4, 5.0, 50.0, 0.9);
    let cheap = solve(&configuration(base, SweepPolicy::GaussSeidel, 1e-10)).unwrap();
    let expensive = solve(&configuration(
        base.with_repair_cost(150.0),
        SweepPolicy::GaussSeidel,
        1e-10,
    ))
    .unwrap();

    for ((state, low), (_, high)) in cheap.table().iter().zip(expensive.table().iter()) {
        assert!(high >= low - 1e-8, "V{state:?} fell from {low} to {high}");
    }
}

/// As γ → 0 the future vanishes: only the discounted immediate failure risk remains.
#[test]
fn tiny_discount_leaves_only_immediate_costs() {
    let gamma = 1e-3;
    let model = ModelParameters::new(20, 3, 5.0, 100.0, gamma);
    let solution = solve(&configuration(model, SweepPolicy::Jacobi, 1e-12)).unwrap();
    let table = solution.table();

    for day in 0..=20 {
        for damage in 0..3 {
            let immediate = if damage + 1 == 3 {
                gamma * model.damage_probability(day) * model.repair_cost
            } else {
                0.0
            };
            let expected = immediate.min(model.maintenance_cost);
            assert_abs_diff_eq!(table.value(day, damage), expected, epsilon = 1e-3);
        }
    }
}

#[test]
fn undiscounted_problem_stops_at_the_limit() {
    let model = ModelParameters::new(10, 2, 5.0, 100.0, 1.0);
    let config = Configuration::new(
        model,
        SolverOptions::new(SweepPolicy::GaussSeidel, 1e-6, 200),
    );
    let solution = IterationDriver::new(config)
        .unwrap()
        .solve_with_observer(&mut LoggingObserver::new(5))
        .unwrap();

    assert_eq!(solution.summary().outcome, SolveOutcome::IterationLimitReached);
    assert_eq!(solution.summary().iterations, 200);
    assert!(solution.table().as_slice().iter().all(|v| v.is_finite()));
    assert!(solution.into_converged().is_err());
}

#[test]
fn configuration_loads_from_json() {
    let json = r#"{
        "model": {
            "max_days": 30,
            "max_damages": 3,
            "maintenance_cost": 5.0,
            "repair_cost": 100.0,
            "discount": 0.9
        },
        "solver": {
            "sweep": { "kind": "sor", "omega": 1.01 },
            "tolerance": 1e-8,
            "max_iterations": 5000
        }
    }"#;
    let config: Configuration = serde_json::from_str(json).unwrap();
    assert_eq!(config.model.damage_probability, DamageProbability::LinearRamp);
    assert_eq!(config.solver.sweep, SweepPolicy::Sor { omega: 1.01 });
    assert!(!config.solver.parallel);
    assert!(solve(&config).unwrap().is_converged());

    let constant = r#"{ "kind": "constant", "probability": 0.25 }"#;
    let damage: DamageProbability = serde_json::from_str(constant).unwrap();
    assert_eq!(damage, DamageProbability::Constant { probability: 0.25 });

    let sweep: SweepPolicy = serde_json::from_str(r#"{ "kind": "gauss_seidel" }"#).unwrap();
    assert_eq!(sweep, SweepPolicy::GaussSeidel);
}

/// Simulated discounted costs under the greedy policy reproduce the value table.
#[test]
fn simulated_policy_cost_matches_value_function() {
    let model = ModelParameters::new(20, 3, 5.0, 100.0, 0.9);
    let solution = solve(&configuration(model, SweepPolicy::GaussSeidel, 1e-10)).unwrap();
    let policy = solution.policy();

    for (start, seed) in [(State::origin(), 11), (State::new(12, 2), 29)] {
        let options = SimulationOptions::new(20_000, 300, seed);
        let summary = simulate_policy(&model, &policy, start, &options).unwrap();
        let expected = solution.table().get(start).unwrap();
        assert!(
            (summary.mean_cost - expected).abs() <= 5.0 * summary.standard_error + 1e-6,
            "simulated {} ± {} vs V = {expected}",
            summary.mean_cost,
            summary.standard_error
        );
    }

    let repair = simulate_policy(
        &model,
        &policy,
        State::new(7, 3),
        &SimulationOptions::new(10_000, 300, 3),
    )
    .unwrap();
    assert_relative_eq!(
        repair.mean_cost,
        solution.table().value(7, 3),
        max_relative = 0.05
    );
}
