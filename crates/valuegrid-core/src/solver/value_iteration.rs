use tracing::{debug, trace, warn};

use crate::solver::{
    config::{SolverConfig, UpdateMode},
    error::SolveError,
    ids::ActionId,
    model::TabularMdp,
    policy::best_action,
    solution::Solution,
};

/// Stopping threshold for the per-sweep maximum change.
///
/// For `gamma < 1` the tolerance is scaled by `(1 - gamma) / gamma` so that
/// stopping bounds the distance to the optimal values by `epsilon`.
pub fn convergence_threshold(gamma: f64, epsilon: f64) -> f64 {
    if gamma < 1.0 {
        epsilon * (1.0 - gamma) / gamma
    } else {
        epsilon
    }
}

/// Solve `mdp` with in-place value iteration and no sweep cap.
///
/// For `gamma >= 1` this only returns if the model's values settle, as they do
/// for episodic models with an absorbing zero-reward state.
pub fn solve(mdp: &TabularMdp, gamma: f64, epsilon: f64) -> Solution {
    let (solution, _) = iterate(
        mdp,
        gamma,
        epsilon,
        UpdateMode::GaussSeidel,
        None,
        &mut |_| {},
    );
    solution
}

/// Per-sweep metrics emitted by [`ValueIteration::solve_with_hook`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepMetrics {
    /// 1-based sweep number.
    pub sweep: usize,
    pub delta: f64,
    pub threshold: f64,
}

/// Value-iteration solver bound to a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValueIteration {
    config: SolverConfig,
}

impl ValueIteration {
    /// Create a solver that runs with `config`.
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Borrow the solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run value iteration to convergence, or until `max_sweeps` if set.
    pub fn solve(&self, mdp: &TabularMdp) -> Result<Solution, SolveError> {
        self.solve_with_hook(mdp, |_| {})
    }

    /// Run value iteration and invoke a callback after every sweep.
    pub fn solve_with_hook<FHook>(
        &self,
        mdp: &TabularMdp,
        mut on_sweep: FHook,
    ) -> Result<Solution, SolveError>
    where
        FHook: FnMut(&SweepMetrics),
    {
        let (solution, converged) = iterate(
            mdp,
            self.config.gamma,
            self.config.epsilon,
            self.config.update,
            self.config.max_sweeps,
            &mut on_sweep,
        );

        if converged {
            Ok(solution)
        } else {
            warn!(
                sweeps = solution.sweeps,
                delta = solution.final_delta,
                threshold = solution.threshold,
                "value iteration hit the sweep cap"
            );
            Err(SolveError::DidNotConverge {
                sweeps: solution.sweeps,
                delta: solution.final_delta,
                threshold: solution.threshold,
            })
        }
    }
}

/// Shared sweep loop. Returns the last solution and whether the stopping test passed.
fn iterate(
    mdp: &TabularMdp,
    gamma: f64,
    epsilon: f64,
    update: UpdateMode,
    max_sweeps: Option<usize>,
    on_sweep: &mut dyn FnMut(&SweepMetrics),
) -> (Solution, bool) {
    let n = mdp.state_count();
    let threshold = convergence_threshold(gamma, epsilon);

    let mut values = vec![0.0; n];
    let mut policy = vec![0_usize; n];
    // Only used by the Jacobi update.
    let mut next_values = match update {
        UpdateMode::GaussSeidel => Vec::new(),
        UpdateMode::Jacobi => vec![0.0; n],
    };

    let mut sweeps = 0;
    let mut delta;
    let converged = loop {
        delta = match update {
            UpdateMode::GaussSeidel => sweep_in_place(mdp, gamma, &mut values, &mut policy),
            UpdateMode::Jacobi => {
                let delta = sweep_jacobi(mdp, gamma, &values, &mut next_values, &mut policy);
                std::mem::swap(&mut values, &mut next_values);
                delta
            }
        };
        sweeps += 1;

        let metrics = SweepMetrics {
            sweep: sweeps,
            delta,
            threshold,
        };
        trace!(sweep = sweeps, delta, threshold, "value iteration sweep");
        on_sweep(&metrics);

        if delta <= threshold {
            break true;
        }
        if max_sweeps.is_some_and(|cap| sweeps >= cap) {
            break false;
        }
    };

    if converged {
        debug!(sweeps, delta, threshold, ?update, "value iteration converged");
    }

    let solution = Solution {
        values,
        policy: policy.into_iter().map(ActionId::from).collect(),
        sweeps,
        final_delta: delta,
        threshold,
    };
    (solution, converged)
}

/// One Gauss-Seidel sweep: states are updated in ascending order and each
/// backup reads the values already written earlier in the same sweep.
///
/// `policy[state]` is the argmax seen by that backup, so it can trail the
/// returned values when a later state in the same sweep changes.
fn sweep_in_place(
    mdp: &TabularMdp,
    gamma: f64,
    values: &mut [f64],
    policy: &mut [usize],
) -> f64 {
    let mut delta = 0.0_f64;
    for state in 0..mdp.state_count() {
        let (action, q) = best_action(mdp, state, values);
        let value = mdp.rewards()[state] + gamma * q;
        delta = delta.max((value - values[state]).abs());
        values[state] = value;
        policy[state] = action;
    }
    delta
}

/// One Jacobi sweep: every backup reads `previous`, results land in `next`.
fn sweep_jacobi(
    mdp: &TabularMdp,
    gamma: f64,
    previous: &[f64],
    next: &mut [f64],
    policy: &mut [usize],
) -> f64 {
    let mut delta = 0.0_f64;
    for state in 0..mdp.state_count() {
        let (action, q) = best_action(mdp, state, previous);
        let value = mdp.rewards()[state] + gamma * q;
        delta = delta.max((value - previous[state]).abs());
        next[state] = value;
        policy[state] = action;
    }
    delta
}
