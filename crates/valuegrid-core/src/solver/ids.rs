use serde::{Deserialize, Serialize};

/// Dense index of a state in a tabular model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(usize);

impl StateKey {
    /// Return the underlying state index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for StateKey {
    /// Wrap a raw state index.
    fn from(value: usize) -> Self {
        StateKey(value)
    }
}

/// Dense index of an action, shared by every state of a model.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(usize);

impl ActionId {
    /// Return the underlying action index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ActionId {
    /// Wrap a raw action index.
    fn from(value: usize) -> Self {
        ActionId(value)
    }
}
