use std::fmt;

use crate::solver::ids::{ActionId, StateKey};

/// Error type for building or checking a tabular model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A model needs at least one state.
    NoStates,
    /// A model needs at least one action.
    NoActions,
    /// The transition tensor does not hold `n * m * n` entries.
    TransitionShape { expected: usize, actual: usize },
    /// A transition row is not a probability distribution.
    InvalidDistribution {
        state: StateKey,
        action: ActionId,
        sum: f64,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NoStates => write!(f, "model must contain at least one state"),
            ModelError::NoActions => write!(f, "model must contain at least one action"),
            ModelError::TransitionShape { expected, actual } => write!(
                f,
                "transition tensor has {actual} entries, expected {expected}"
            ),
            ModelError::InvalidDistribution { state, action, sum } => write!(
                f,
                "transition row for state {} action {} is not a distribution (sum {sum})",
                state.index(),
                action.index()
            ),
        }
    }
}

impl std::error::Error for ModelError {}

/// Error type for a value-iteration run.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// The sweep cap was reached before the stopping test passed.
    DidNotConverge {
        sweeps: usize,
        delta: f64,
        threshold: f64,
    },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::DidNotConverge {
                sweeps,
                delta,
                threshold,
            } => write!(
                f,
                "value iteration did not converge after {sweeps} sweeps (delta {delta}, threshold {threshold})"
            ),
        }
    }
}

impl std::error::Error for SolveError {}
