use crate::solver::{
    ids::{ActionId, StateKey},
    model::TabularMdp,
};

/// Expected next-state value `Σ T(s,a,s')·V[s']` for one transition row.
pub(crate) fn expected_value(row: &[f64], values: &[f64]) -> f64 {
    row.iter().zip(values).map(|(p, v)| p * v).sum()
}

/// Best action and its `Q` for `state`, keeping the lowest index on ties.
///
/// The model guarantees at least one action, so there is always a winner.
pub(crate) fn best_action(mdp: &TabularMdp, state: usize, values: &[f64]) -> (usize, f64) {
    let mut best = (0, expected_value(mdp.row(state, 0), values));
    for action in 1..mdp.action_count() {
        let q = expected_value(mdp.row(state, action), values);
        if q > best.1 {
            best = (action, q);
        }
    }
    best
}

/// Compute `Q(state, a)` for every action under `values`.
///
/// Returns `None` if `state` is out of range or `values` has the wrong length.
pub fn q_values(mdp: &TabularMdp, values: &[f64], state: StateKey) -> Option<Vec<f64>> {
    if state.index() >= mdp.state_count() || values.len() != mdp.state_count() {
        return None;
    }
    Some(
        (0..mdp.action_count())
            .map(|action| expected_value(mdp.row(state.index(), action), values))
            .collect(),
    )
}

/// First-occurrence argmax over a slice of action values.
pub fn greedy_action(q: &[f64]) -> Option<ActionId> {
    let mut best: Option<(usize, f64)> = None;
    for (action, &value) in q.iter().enumerate() {
        best = match best {
            Some((_, best_q)) if best_q >= value => best,
            _ => Some((action, value)),
        };
    }
    best.map(|(action, _)| ActionId::from(action))
}

/// Greedy policy with respect to `values`, one action per state.
pub fn greedy_policy(mdp: &TabularMdp, values: &[f64]) -> Option<Vec<ActionId>> {
    if values.len() != mdp.state_count() {
        return None;
    }
    Some(
        (0..mdp.state_count())
            .map(|state| ActionId::from(best_action(mdp, state, values).0))
            .collect(),
    )
}

/// Largest one-step Bellman change `|R(s) + γ·max_a Q(s,a) − V[s]|` over all states.
pub fn bellman_residual(mdp: &TabularMdp, values: &[f64], gamma: f64) -> Option<f64> {
    if values.len() != mdp.state_count() {
        return None;
    }
    let residual = (0..mdp.state_count())
        .map(|state| {
            let (_, q) = best_action(mdp, state, values);
            (mdp.rewards()[state] + gamma * q - values[state]).abs()
        })
        .fold(0.0_f64, f64::max);
    Some(residual)
}
