use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use valuegrid_core::{ActionId, StateKey, TabularMdp};

#[derive(Debug, Clone)]
/// Seeded simulator that samples transitions of a tabular MDP.
pub struct PolicySimulator {
    mdp: TabularMdp,
    /// Cumulative distribution per `(s, a)` row, laid out like the transition tensor.
    cdf: Vec<f64>,
    rng: ChaCha8Rng,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// States visited and actions taken during one walk.
pub struct Trajectory {
    /// Visited states, starting with the start state.
    pub states: Vec<StateKey>,
    /// `actions[i]` was taken in `states[i]`.
    pub actions: Vec<ActionId>,
    /// Sum of the rewards of every visited state.
    pub total_reward: f64,
}

impl PolicySimulator {
    /// Create a simulator with deterministic RNG seed.
    pub fn new(mdp: TabularMdp, seed: u64) -> Self {
        let n = mdp.state_count();
        let mut cdf = Vec::with_capacity(n * mdp.action_count() * n);
        for s in 0..n {
            for a in 0..mdp.action_count() {
                let row = mdp
                    .transition_row(StateKey::from(s), ActionId::from(a))
                    .unwrap_or_default();
                let mut cumulative = 0.0_f64;
                cdf.extend(row.iter().map(|p| {
                    cumulative += p;
                    cumulative
                }));
            }
        }

        Self {
            mdp,
            cdf,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Borrow the underlying model.
    pub fn mdp(&self) -> &TabularMdp {
        &self.mdp
    }

    /// Sample the next state for `(state, action)`.
    /// Invalid state/action inputs are treated as a self transition.
    pub fn step(&mut self, state: StateKey, action: ActionId) -> StateKey {
        let n = self.mdp.state_count();
        if state.index() >= n || action.index() >= self.mdp.action_count() {
            return state;
        }

        let sample = (self.rng.next_u64() as f64) / ((u64::MAX as f64) + 1.0);
        let start = (state.index() * self.mdp.action_count() + action.index()) * n;
        let row = &self.cdf[start..start + n];

        // Scale by the row total so unnormalized rows still sample proportionally.
        let total = row[n - 1];
        if total <= 0.0 {
            return state;
        }
        let chosen = row.partition_point(|p| *p <= sample * total);
        StateKey::from(chosen.min(n - 1))
    }

    /// Follow `policy` from `start` for at most `max_steps` transitions, stopping
    /// early once `is_done` holds for the current state.
    pub fn walk<FDone>(
        &mut self,
        start: StateKey,
        policy: &[ActionId],
        max_steps: usize,
        mut is_done: FDone,
    ) -> Trajectory
    where
        FDone: FnMut(StateKey) -> bool,
    {
        let mut state = start;
        let mut trajectory = Trajectory {
            states: vec![start],
            actions: Vec::new(),
            total_reward: self.mdp.reward(start).unwrap_or(0.0),
        };

        for _ in 0..max_steps {
            if is_done(state) {
                break;
            }
            let Some(action) = policy.get(state.index()).copied() else {
                break;
            };

            state = self.step(state, action);
            trajectory.actions.push(action);
            trajectory.states.push(state);
            trajectory.total_reward += self.mdp.reward(state).unwrap_or(0.0);
        }

        trajectory
    }
}
