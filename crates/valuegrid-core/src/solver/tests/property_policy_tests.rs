use proptest::prelude::*;

use crate::{
    SolverConfig, TabularMdp, UpdateMode, ValueIteration, bellman_residual, greedy_action,
};

use super::reference_gauss_seidel;

fn random_mdp() -> impl Strategy<Value = TabularMdp> {
    (1usize..6, 1usize..5).prop_flat_map(|(n, m)| {
        (
            proptest::collection::vec(-5.0f64..5.0, n),
            proptest::collection::vec(0.0f64..1.0, n * m * n),
        )
            .prop_map(move |(rewards, weights)| {
                let mut transitions = weights;
                for row in transitions.chunks_mut(n) {
                    let sum: f64 = row.iter().sum::<f64>() + 1e-3;
                    for p in row.iter_mut() {
                        *p = (*p + 1e-3 / n as f64) / sum;
                    }
                }
                TabularMdp::new(m, rewards, transitions).expect("valid shape")
            })
    })
}

proptest! {
    #[test]
    fn greedy_action_picks_first_maximizer(q in proptest::collection::vec(0u8..4u8, 1..16)) {
        let values: Vec<f64> = q.iter().map(|v| f64::from(*v)).collect();
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let first = values.iter().position(|v| *v == max).expect("non-empty");

        prop_assert_eq!(greedy_action(&values).map(|a| a.index()), Some(first));
    }

    #[test]
    fn jacobi_residual_is_bounded_by_last_delta(mdp in random_mdp(), gamma in 0.1f64..0.95) {
        let solution = ValueIteration::new(SolverConfig {
            gamma,
            epsilon: 0.001,
            max_sweeps: None,
            update: UpdateMode::Jacobi,
        })
        .solve(&mdp)
        .expect("discounted model converges");

        let residual = bellman_residual(&mdp, &solution.values, gamma).expect("matching length");
        prop_assert!(residual <= gamma * solution.final_delta + 1e-9);
        prop_assert!(solution.final_delta <= solution.threshold);
    }

    #[test]
    fn policy_stays_within_action_range(mdp in random_mdp(), gamma in 0.0f64..0.95) {
        let solution = crate::solve(&mdp, gamma, 0.01);

        prop_assert_eq!(solution.policy.len(), mdp.state_count());
        prop_assert!(solution.policy.iter().all(|a| a.index() < mdp.action_count()));
        prop_assert_eq!(solution.values.len(), mdp.state_count());
    }

    #[test]
    fn gauss_seidel_matches_the_reference_loop(mdp in random_mdp(), gamma in 0.0f64..0.95) {
        let solution = crate::solve(&mdp, gamma, 0.01);
        let (values, policy) = reference_gauss_seidel(&mdp, gamma, 0.01);

        prop_assert_eq!(&solution.values, &values);
        prop_assert_eq!(solution.policy_indices(), policy);
    }
}
