mod property_policy_tests;
mod solver_core_tests;

use crate::{ActionId, StateKey, TabularMdp, convergence_threshold};

/// Every action of every state moves deterministically to `next[s]`.
pub(super) fn deterministic_mdp(
    rewards: Vec<f64>,
    next: &[usize],
    action_count: usize,
) -> TabularMdp {
    let n = rewards.len();
    let mut transitions = vec![0.0; n * action_count * n];
    for (state, &target) in next.iter().enumerate() {
        for action in 0..action_count {
            transitions[(state * action_count + action) * n + target] = 1.0;
        }
    }
    TabularMdp::new(action_count, rewards, transitions).expect("valid model")
}

/// Plain in-place value iteration: nested loops, policy recorded by each backup.
pub(super) fn reference_gauss_seidel(
    mdp: &TabularMdp,
    gamma: f64,
    epsilon: f64,
) -> (Vec<f64>, Vec<usize>) {
    let n = mdp.state_count();
    let threshold = convergence_threshold(gamma, epsilon);
    let mut values = vec![0.0; n];
    let mut policy = vec![0; n];

    loop {
        let mut delta = 0.0_f64;
        for s in 0..n {
            let q: Vec<f64> = (0..mdp.action_count())
                .map(|a| {
                    let row = mdp
                        .transition_row(StateKey::from(s), ActionId::from(a))
                        .expect("in range");
                    row.iter().zip(&values).map(|(p, v)| p * v).sum()
                })
                .collect();
            let best = q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let value = mdp.rewards()[s] + gamma * best;
            delta = delta.max((value - values[s]).abs());
            values[s] = value;
            policy[s] = q.iter().position(|v| *v == best).expect("non-empty");
        }
        if delta <= threshold {
            return (values, policy);
        }
    }
}
