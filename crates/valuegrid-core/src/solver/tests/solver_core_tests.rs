use crate::{
    ActionId, SolveError, SolverConfig, StateKey, TabularMdp, UpdateMode, ValueIteration,
    greedy_policy, solve,
};

use super::deterministic_mdp;

/// State 0 (reward 0) reaches state 1 only through `goal_action`; every other
/// action stays put. State 1 (reward 10) self-loops.
fn two_state_chain(goal_action: usize) -> TabularMdp {
    let mut transitions = vec![0.0; 2 * 4 * 2];
    for action in 0..4 {
        let target = if action == goal_action { 1 } else { 0 };
        transitions[action * 2 + target] = 1.0;
        transitions[(4 + action) * 2 + 1] = 1.0;
    }
    TabularMdp::new(4, vec![0.0, 10.0], transitions).expect("valid model")
}

#[test]
fn single_state_converges_to_geometric_sum() {
    let mdp = deterministic_mdp(vec![5.0], &[0], 4);

    let solution = solve(&mdp, 0.9, 0.0001);

    assert!((solution.values[0] - 50.0).abs() < 1e-3);
    assert!(solution.policy[0].index() < 4);
}

#[test]
fn two_state_chain_reaches_discounted_goal_value() {
    let mdp = two_state_chain(0);

    let solution = solve(&mdp, 0.9, 0.0001);

    assert!((solution.values[1] - 100.0).abs() < 1e-3);
    assert!((solution.values[0] - 90.0).abs() < 1e-3);
    assert_eq!(solution.policy[0], ActionId::from(0));
}

#[test]
fn policy_picks_the_only_action_that_reaches_the_goal() {
    let mdp = two_state_chain(2);

    let solution = solve(&mdp, 0.9, 0.0001);

    assert_eq!(solution.action(StateKey::from(0)), Some(ActionId::from(2)));
    assert!((solution.values[0] - 90.0).abs() < 1e-3);
}

#[test]
fn ties_break_toward_the_lowest_action_index() {
    // Actions 1 and 3 both reach the goal with certainty.
    let mut transitions = vec![0.0; 2 * 4 * 2];
    for action in 0..4 {
        let target = if action == 1 || action == 3 { 1 } else { 0 };
        transitions[action * 2 + target] = 1.0;
        transitions[(4 + action) * 2 + 1] = 1.0;
    }
    let mdp = TabularMdp::new(4, vec![0.0, 1.0], transitions).expect("valid model");

    let solution = solve(&mdp, 0.5, 0.0001);

    assert_eq!(solution.policy[0], ActionId::from(1));
    // Every action of the goal state is equivalent.
    assert_eq!(solution.policy[1], ActionId::from(0));
}

#[test]
fn repeated_solves_are_bit_identical() {
    let mdp = two_state_chain(3);

    let first = solve(&mdp, 0.95, 0.001);
    let second = solve(&mdp, 0.95, 0.001);

    assert_eq!(first, second);
}

#[test]
fn returned_policy_is_greedy_under_final_values() {
    let mdp = two_state_chain(1);

    let solution = solve(&mdp, 0.9, 0.0001);
    let greedy = greedy_policy(&mdp, &solution.values).expect("matching length");

    assert_eq!(solution.policy, greedy);
}

#[test]
fn zero_discount_runs_a_single_sweep() {
    let mdp = two_state_chain(0);

    let solution = solve(&mdp, 0.0, 0.01);

    assert_eq!(solution.sweeps, 1);
    assert_eq!(solution.values, vec![0.0, 10.0]);
    assert!(solution.threshold.is_infinite());
}

#[test]
fn sweep_cap_reports_non_convergence() {
    // Undiscounted self-loop with positive reward grows without bound.
    let mdp = deterministic_mdp(vec![1.0], &[0], 4);
    let solver = ValueIteration::new(SolverConfig {
        gamma: 1.0,
        epsilon: 0.0001,
        max_sweeps: Some(10),
        update: UpdateMode::GaussSeidel,
    });

    let err = solver.solve(&mdp).expect_err("should not converge");

    assert_eq!(
        err,
        SolveError::DidNotConverge {
            sweeps: 10,
            delta: 1.0,
            threshold: 0.0001,
        }
    );
}

#[test]
fn sweep_cap_is_not_hit_when_convergence_comes_first() {
    let mdp = deterministic_mdp(vec![-1.0, 0.0], &[1, 1], 4);
    let solver = ValueIteration::new(SolverConfig {
        gamma: 1.0,
        epsilon: 0.0001,
        max_sweeps: Some(2),
        update: UpdateMode::GaussSeidel,
    });

    let solution = solver.solve(&mdp).expect("converges within the cap");

    assert_eq!(solution.sweeps, 2);
    assert_eq!(solution.values, vec![-1.0, 0.0]);
}

#[test]
fn hook_sees_every_sweep_in_order() {
    let mdp = two_state_chain(0);
    let solver = ValueIteration::new(SolverConfig::default());
    let mut seen = Vec::new();

    let solution = solver
        .solve_with_hook(&mdp, |metrics| seen.push(*metrics))
        .expect("discounted model converges");

    assert_eq!(seen.len(), solution.sweeps);
    for (idx, metrics) in seen.iter().enumerate() {
        assert_eq!(metrics.sweep, idx + 1);
        assert_eq!(metrics.threshold, solution.threshold);
    }
    let last = seen.last().expect("at least one sweep");
    assert!(last.delta <= last.threshold);
    assert_eq!(last.delta, solution.final_delta);
}

#[test]
fn into_parts_returns_values_and_action_indices() {
    let mdp = two_state_chain(2);

    let (values, policy) = solve(&mdp, 0.9, 0.0001).into_parts();

    assert_eq!(values.len(), 2);
    assert_eq!(policy[0], 2);
}

#[test]
fn non_finite_changes_do_not_count_toward_delta() {
    let mdp = deterministic_mdp(vec![f64::NAN], &[0], 4);

    let solution = solve(&mdp, 0.9, 0.0001);

    assert_eq!(solution.sweeps, 1);
    assert_eq!(solution.final_delta, 0.0);
    assert!(solution.values[0].is_nan());
}
