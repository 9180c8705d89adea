use serde::{Deserialize, Serialize};

use crate::solver::{
    error::ModelError,
    ids::{ActionId, StateKey},
};

/// Tabular MDP with state-based rewards and a dense transition tensor.
///
/// The tensor is stored flat, with the row for `(s, a)` starting at
/// `(s * action_count + a) * state_count`. Once built the model is never
/// mutated, so it can be shared freely between solver runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularMdp {
    state_count: usize,
    action_count: usize,
    rewards: Vec<f64>,
    transitions: Vec<f64>,
}

impl TabularMdp {
    /// Build a model from per-state rewards and a flat `[s][a][s']` tensor.
    ///
    /// Only the shape is checked. Rows are not required to sum to 1; see
    /// [`TabularMdp::check_distributions`] for an explicit check.
    pub fn new(
        action_count: usize,
        rewards: Vec<f64>,
        transitions: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let state_count = rewards.len();
        if state_count == 0 {
            return Err(ModelError::NoStates);
        }
        if action_count == 0 {
            return Err(ModelError::NoActions);
        }

        let expected = state_count * action_count * state_count;
        if transitions.len() != expected {
            return Err(ModelError::TransitionShape {
                expected,
                actual: transitions.len(),
            });
        }

        Ok(Self {
            state_count,
            action_count,
            rewards,
            transitions,
        })
    }

    /// Build a model from nested `[s][a][s']` rows.
    pub fn from_nested(
        rewards: Vec<f64>,
        transitions: Vec<Vec<Vec<f64>>>,
    ) -> Result<Self, ModelError> {
        let state_count = rewards.len();
        if transitions.len() != state_count {
            return Err(ModelError::TransitionShape {
                expected: state_count,
                actual: transitions.len(),
            });
        }

        let action_count = transitions.first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(state_count * action_count * state_count);
        for per_state in transitions {
            if per_state.len() != action_count {
                return Err(ModelError::TransitionShape {
                    expected: action_count,
                    actual: per_state.len(),
                });
            }
            for row in per_state {
                if row.len() != state_count {
                    return Err(ModelError::TransitionShape {
                        expected: state_count,
                        actual: row.len(),
                    });
                }
                flat.extend(row);
            }
        }

        Self::new(action_count, rewards, flat)
    }

    /// Return the number of states.
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// Return the number of actions available in every state.
    pub fn action_count(&self) -> usize {
        self.action_count
    }

    /// Borrow the reward vector.
    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Return the reward for occupying `state`.
    pub fn reward(&self, state: StateKey) -> Option<f64> {
        self.rewards.get(state.index()).copied()
    }

    /// Return `T(state, action, next)`.
    pub fn transition(&self, state: StateKey, action: ActionId, next: StateKey) -> Option<f64> {
        self.transition_row(state, action)?.get(next.index()).copied()
    }

    /// Borrow the distribution over next states for `(state, action)`.
    pub fn transition_row(&self, state: StateKey, action: ActionId) -> Option<&[f64]> {
        if state.index() >= self.state_count || action.index() >= self.action_count {
            return None;
        }
        Some(self.row(state.index(), action.index()))
    }

    /// Unchecked row access for the solver's inner loops.
    pub(crate) fn row(&self, state: usize, action: usize) -> &[f64] {
        let start = (state * self.action_count + action) * self.state_count;
        &self.transitions[start..start + self.state_count]
    }

    /// Check that every `(s, a)` row is non-negative, finite and sums to 1 within `tolerance`.
    pub fn check_distributions(&self, tolerance: f64) -> Result<(), ModelError> {
        for state in 0..self.state_count {
            for action in 0..self.action_count {
                let row = self.row(state, action);
                let sum: f64 = row.iter().sum();
                let valid_entries = row.iter().all(|p| p.is_finite() && *p >= 0.0);
                if !valid_entries || (sum - 1.0).abs() > tolerance {
                    return Err(ModelError::InvalidDistribution {
                        state: StateKey::from(state),
                        action: ActionId::from(action),
                        sum,
                    });
                }
            }
        }
        Ok(())
    }
}
