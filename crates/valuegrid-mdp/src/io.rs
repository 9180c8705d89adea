use std::{fs, path::Path};

use tracing::debug;
use valuegrid_core::{ActionId, StateKey, TabularMdp};

use crate::{GridLayout, GridWorld, MdpError};

/// Actions per state in the tabular file format. It is not stored in the file.
pub const ACTION_COUNT: usize = 4;

/// Split comma-delimited text into rows of trimmed fields.
pub(crate) fn split_rows(text: &str) -> Vec<Vec<&str>> {
    text.lines()
        .map(|line| line.split(',').map(str::trim).collect())
        .collect()
}

fn field<'a>(
    rows: &[Vec<&'a str>],
    row: usize,
    column: usize,
    expected_rows: usize,
) -> Result<&'a str, MdpError> {
    let cells = rows.get(row).ok_or(MdpError::MissingRow { row, expected_rows })?;
    cells
        .get(column)
        .copied()
        .ok_or(MdpError::MissingField { row, column })
}

fn number(
    rows: &[Vec<&str>],
    row: usize,
    column: usize,
    expected_rows: usize,
) -> Result<f64, MdpError> {
    let raw = field(rows, row, column, expected_rows)?;
    raw.parse::<f64>().map_err(|_| MdpError::InvalidNumber {
        row,
        column,
        value: raw.to_string(),
    })
}

/// Parse the tabular model format.
///
/// Row 0 column 0 holds the state count `n`. Rows `1..=n` hold one reward each
/// in column 0. Row `n + 1 + n * a + s` holds `T(s, a, ·)` in columns `0..n`.
/// Extra columns and trailing rows are ignored.
pub fn parse_mdp_csv(text: &str) -> Result<TabularMdp, MdpError> {
    let rows = split_rows(text);

    let raw_count = rows
        .first()
        .and_then(|cells| cells.first())
        .copied()
        .filter(|raw| !raw.is_empty())
        .ok_or(MdpError::MissingStateCount)?;
    let invalid_count = || MdpError::InvalidStateCount {
        value: raw_count.to_string(),
    };
    let n = raw_count.parse::<usize>().map_err(|_| invalid_count())?;

    // Table sizes must fit in usize.
    let expected_rows = n
        .checked_mul(ACTION_COUNT)
        .and_then(|blocks| blocks.checked_add(n + 1))
        .ok_or_else(invalid_count)?;
    let entries = n
        .checked_mul(ACTION_COUNT)
        .and_then(|rows| rows.checked_mul(n))
        .ok_or_else(invalid_count)?;

    let rewards = (0..n)
        .map(|s| number(&rows, s + 1, 0, expected_rows))
        .collect::<Result<Vec<_>, _>>()?;

    // Flat [s][a][s'] order, while the file stores one block per action.
    let capacity = if rows.len() >= expected_rows { entries } else { 0 };
    let mut transitions = Vec::with_capacity(capacity);
    for s in 0..n {
        for a in 0..ACTION_COUNT {
            let row = n + 1 + n * a + s;
            for sp in 0..n {
                transitions.push(number(&rows, row, sp, expected_rows)?);
            }
        }
    }

    let mdp = TabularMdp::new(ACTION_COUNT, rewards, transitions)?;
    debug!(states = n, actions = ACTION_COUNT, "parsed tabular model");
    Ok(mdp)
}

/// Load a tabular model from disk.
pub fn load_mdp_csv(path: impl AsRef<Path>) -> Result<TabularMdp, MdpError> {
    let text = fs::read_to_string(path)?;
    parse_mdp_csv(&text)
}

/// Render a model in the tabular format.
///
/// The header row is `n,m,1,0,0,gamma` and each reward is repeated once per
/// action, as the grid exporter has always written it. Only column 0 of those
/// rows is read back.
pub fn write_mdp_csv(mdp: &TabularMdp, gamma: f64) -> String {
    let n = mdp.state_count();
    let m = mdp.action_count();
    let mut lines = Vec::with_capacity(1 + n + n * m);
    lines.push(format!("{n},{m},1,0,0,{gamma}"));

    for reward in mdp.rewards() {
        lines.push(vec![reward.to_string(); m].join(","));
    }

    for a in 0..m {
        for s in 0..n {
            let row = mdp
                .transition_row(StateKey::from(s), ActionId::from(a))
                .unwrap_or_default();
            let cells: Vec<String> = row.iter().map(f64::to_string).collect();
            lines.push(cells.join(","));
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write a model to disk in the tabular format.
pub fn save_mdp_csv(
    path: impl AsRef<Path>,
    mdp: &TabularMdp,
    gamma: f64,
) -> Result<(), MdpError> {
    fs::write(path, write_mdp_csv(mdp, gamma))?;
    Ok(())
}

/// Load a grid layout from its comma-delimited file.
pub fn load_grid_csv(path: impl AsRef<Path>) -> Result<GridWorld, MdpError> {
    let text = fs::read_to_string(path)?;
    GridWorld::parse_csv(&text)
}

/// Write a grid layout to its comma-delimited file.
pub fn save_grid_csv(path: impl AsRef<Path>, grid: &GridWorld) -> Result<(), MdpError> {
    fs::write(path, grid.to_csv())?;
    Ok(())
}

/// Load a grid layout from YAML on disk.
pub fn load_grid_yaml(path: impl AsRef<Path>) -> Result<GridWorld, MdpError> {
    let yaml = fs::read_to_string(path)?;
    let layout: GridLayout = serde_yaml::from_str(&yaml)?;
    GridWorld::from_layout(&layout)
}

/// Serialize and write a grid layout to YAML.
pub fn save_grid_yaml(path: impl AsRef<Path>, grid: &GridWorld) -> Result<(), MdpError> {
    let yaml = serde_yaml::to_string(&grid.to_layout())?;
    fs::write(path, yaml)?;
    Ok(())
}
