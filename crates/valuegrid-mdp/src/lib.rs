mod builder;
mod error;
mod grid;
mod io;
mod simulator;

pub use builder::MdpBuilder;
pub use error::MdpError;
pub use grid::{
    Action, CellType, DEVIATE_PROB, FORWARD_PROB, GridLayout, GridWorld, TERMINAL_REWARD,
};
pub use io::{
    ACTION_COUNT, load_grid_csv, load_grid_yaml, load_mdp_csv, parse_mdp_csv, save_grid_csv,
    save_grid_yaml, save_mdp_csv, write_mdp_csv,
};
pub use simulator::{PolicySimulator, Trajectory};
