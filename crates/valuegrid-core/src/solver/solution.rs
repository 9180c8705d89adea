use serde::{Deserialize, Serialize};

use crate::solver::ids::{ActionId, StateKey};

/// Result of a value-iteration run: converged values, greedy policy and run stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub values: Vec<f64>,
    pub policy: Vec<ActionId>,
    /// Completed sweeps, including the one that passed the stopping test.
    pub sweeps: usize,
    /// Largest per-state change observed during the last sweep.
    pub final_delta: f64,
    pub threshold: f64,
}

impl Solution {
    /// Return the value estimate for `state`.
    pub fn value(&self, state: StateKey) -> Option<f64> {
        self.values.get(state.index()).copied()
    }

    /// Return the greedy action for `state`.
    pub fn action(&self, state: StateKey) -> Option<ActionId> {
        self.policy.get(state.index()).copied()
    }

    /// Policy as plain action indices.
    pub fn policy_indices(&self) -> Vec<usize> {
        self.policy.iter().map(|action| action.index()).collect()
    }

    /// Split into `(V, pi)`.
    pub fn into_parts(self) -> (Vec<f64>, Vec<usize>) {
        let policy = self.policy.into_iter().map(ActionId::index).collect();
        (self.values, policy)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
