mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, ArgMatches, Command, arg, value_parser};
use tracing::debug;
use valuegrid_core::{
    ActionId, Solution, SolverConfig, StateKey, TabularMdp, UpdateMode, ValueIteration,
};
use valuegrid_mdp::{
    GridWorld, PolicySimulator, Trajectory, load_grid_csv, load_mdp_csv, save_mdp_csv,
};

fn cli() -> Command {
    Command::new("valuegrid")
        .about("Solves tabular and grid-world MDPs with value iteration")
        .arg_required_else_help(true)
        .arg(
            arg!(<FILE> "Path to a tabular model file, or a grid layout with --grid")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--grid "Treat FILE as a grid layout and compile it first")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--gamma <GAMMA> "Discount factor [default: 1.0]")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            arg!(--epsilon <EPSILON> "Convergence tolerance [default: 0.0001]")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            arg!(--"max-sweeps" <N> "Stop with an error after N sweeps")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--jacobi "Update from the previous sweep's values only")
                .action(ArgAction::SetTrue),
        )
        .arg(
            arg!(--config <YAML> "Solver config file; explicit flags override it")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            arg!(--export <PATH> "Write the tabular model to PATH and exit without solving")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(--json "Print the solution as JSON").action(ArgAction::SetTrue))
        .arg(
            arg!(--walk <START> "Simulate the solved policy from state START")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            arg!(--seed <SEED> "Seed for the simulated walk")
                .value_parser(value_parser!(u64))
                .default_value("0"),
        )
        .arg(
            arg!(--steps <STEPS> "Maximum steps of the simulated walk")
                .value_parser(value_parser!(usize))
                .default_value("100"),
        )
}

fn main() {
    logging::init_logging("warn");

    let matches = cli().get_matches();
    if let Err(e) = run(&matches) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let path = matches
        .get_one::<PathBuf>("FILE")
        .ok_or_else(|| anyhow!("missing model file"))?;

    let grid = if matches.get_flag("grid") {
        let grid = load_grid_csv(path)
            .with_context(|| format!("failed to load grid layout {}", path.display()))?;
        Some(grid)
    } else {
        None
    };
    let mdp = match &grid {
        Some(grid) => grid.compile().context("failed to compile grid layout")?,
        None => load_mdp_csv(path)
            .with_context(|| format!("failed to load model {}", path.display()))?,
    };
    debug!(
        states = mdp.state_count(),
        actions = mdp.action_count(),
        "model ready"
    );

    let config = solver_config(matches)?;

    if let Some(export) = matches.get_one::<PathBuf>("export") {
        save_mdp_csv(export, &mdp, config.gamma)
            .with_context(|| format!("failed to export model to {}", export.display()))?;
        return Ok(());
    }

    let solution = ValueIteration::new(config).solve(&mdp)?;

    let trajectory = match matches.get_one::<usize>("walk") {
        Some(start) => Some(simulate(matches, &mdp, &solution, *start)?),
        None => None,
    };

    if matches.get_flag("json") {
        let report = serde_json::json!({
            "solution": solution,
            "trajectory": trajectory,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:?}", solution.values);
    println!("{:?}", solution.policy_indices());
    if let Some(grid) = &grid {
        println!("{}", grid.render_policy(&solution.policy));
    }
    if let Some(trajectory) = &trajectory {
        print_trajectory(grid.as_ref(), trajectory);
    }

    Ok(())
}

/// Command-line defaults, then the config file, then explicit flags.
fn solver_config(matches: &ArgMatches) -> Result<SolverConfig> {
    let defaults = SolverConfig::cli_default();
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => defaults
            .overlay_yaml_path(path)
            .with_context(|| format!("failed to load solver config {}", path.display()))?,
        None => defaults,
    };

    if let Some(gamma) = matches.get_one::<f64>("gamma") {
        config.gamma = *gamma;
    }
    if let Some(epsilon) = matches.get_one::<f64>("epsilon") {
        config.epsilon = *epsilon;
    }
    if let Some(cap) = matches.get_one::<usize>("max-sweeps") {
        config.max_sweeps = Some(*cap);
    }
    if matches.get_flag("jacobi") {
        config.update = UpdateMode::Jacobi;
    }

    config.validate()?;
    Ok(config)
}

fn simulate(
    matches: &ArgMatches,
    mdp: &TabularMdp,
    solution: &Solution,
    start: usize,
) -> Result<Trajectory> {
    if start >= mdp.state_count() {
        return Err(anyhow!(
            "walk start {start} is outside the model's {} states",
            mdp.state_count()
        ));
    }
    let seed = matches.get_one::<u64>("seed").copied().unwrap_or_default();
    let steps = matches.get_one::<usize>("steps").copied().unwrap_or(100);

    let mut simulator = PolicySimulator::new(mdp.clone(), seed);
    let trajectory = simulator.walk(StateKey::from(start), &solution.policy, steps, |state| {
        is_absorbing(mdp, state)
    });
    Ok(trajectory)
}

/// A state every action leaves in place with certainty.
fn is_absorbing(mdp: &TabularMdp, state: StateKey) -> bool {
    (0..mdp.action_count())
        .all(|a| mdp.transition(state, ActionId::from(a), state) == Some(1.0))
}

fn print_trajectory(grid: Option<&GridWorld>, trajectory: &Trajectory) {
    let label = |state: StateKey| match grid.and_then(|grid| grid.coords_of(state)) {
        Some((x, y)) => format!("{}({x},{y})", state.index()),
        None => state.index().to_string(),
    };

    let path: Vec<String> = trajectory.states.iter().copied().map(label).collect();
    println!("{}", path.join(" -> "));
    println!("total reward: {}", trajectory.total_reward);
}
