use valuegrid_core::TabularMdp;

use crate::MdpError;

#[derive(Debug, Clone)]
/// Struct to build tabular MDPs entry by entry
pub struct MdpBuilder {
    state_count: usize,
    action_count: usize,
    rewards: Vec<f64>,
    transitions: Vec<f64>,
}

impl MdpBuilder {
    /// Create a builder with zero rewards and an all-zero transition tensor
    pub fn new(state_count: usize, action_count: usize) -> Self {
        Self {
            state_count,
            action_count,
            rewards: vec![0.0; state_count],
            transitions: vec![0.0; state_count * action_count * state_count],
        }
    }

    /// Set the reward for occupying a state
    pub fn set_reward(&mut self, state: usize, reward: f64) -> Result<&mut Self, MdpError> {
        self.check_state(state)?;
        self.rewards[state] = reward;
        Ok(self)
    }

    /// Overwrite `T(state, action, next)`
    pub fn set_transition(
        &mut self,
        state: usize,
        action: usize,
        next: usize,
        prob: f64,
    ) -> Result<&mut Self, MdpError> {
        let idx = self.index(state, action, next)?;
        self.transitions[idx] = prob;
        Ok(self)
    }

    /// Add probability mass to `T(state, action, next)`
    /// Several outcomes of one action can land on the same next state, so mass accumulates
    pub fn add_transition(
        &mut self,
        state: usize,
        action: usize,
        next: usize,
        prob: f64,
    ) -> Result<&mut Self, MdpError> {
        let idx = self.index(state, action, next)?;
        self.transitions[idx] += prob;
        Ok(self)
    }

    /// Freeze the builder into a shape-checked model
    pub fn build(self) -> Result<TabularMdp, MdpError> {
        let mdp = TabularMdp::new(self.action_count, self.rewards, self.transitions)?;
        Ok(mdp)
    }

    fn check_state(&self, state: usize) -> Result<(), MdpError> {
        if state >= self.state_count {
            return Err(MdpError::BuilderUnknownState { state });
        }
        Ok(())
    }

    fn index(&self, state: usize, action: usize, next: usize) -> Result<usize, MdpError> {
        self.check_state(state)?;
        self.check_state(next)?;
        if action >= self.action_count {
            return Err(MdpError::BuilderUnknownAction { action });
        }
        Ok((state * self.action_count + action) * self.state_count + next)
    }
}
