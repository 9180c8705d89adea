mod solver;

pub use solver::config::{SolverConfig, SolverConfigError, UpdateMode};
pub use solver::error::{ModelError, SolveError};
pub use solver::ids::{ActionId, StateKey};
pub use solver::model::TabularMdp;
pub use solver::policy::{bellman_residual, greedy_action, greedy_policy, q_values};
pub use solver::solution::Solution;
pub use solver::value_iteration::{SweepMetrics, ValueIteration, convergence_threshold, solve};
