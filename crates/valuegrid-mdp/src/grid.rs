use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use valuegrid_core::{ActionId, StateKey, TabularMdp};

use crate::{MdpBuilder, MdpError, io::split_rows};

/// Probability of moving in the chosen direction.
pub const FORWARD_PROB: f64 = 0.8;
/// Probability of slipping to each side of the chosen direction.
pub const DEVIATE_PROB: f64 = 0.1;

/// Reward for the absorbing state appended after the grid cells.
pub const TERMINAL_REWARD: f64 = 0.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
/// Kind of a grid cell. The discriminant is the code used in grid files.
pub enum CellType {
    #[default]
    Empty = 0,
    Obstacle = 1,
    Success = 2,
    Failure = 3,
    DeadEnd = 4,
}

impl CellType {
    /// Decode a grid file cell code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(CellType::Empty),
            1 => Some(CellType::Obstacle),
            2 => Some(CellType::Success),
            3 => Some(CellType::Failure),
            4 => Some(CellType::DeadEnd),
            _ => None,
        }
    }

    /// Cell code written to grid files.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Reward for occupying a cell of this kind.
    pub fn reward(self) -> f64 {
        match self {
            CellType::Empty => -0.03,
            CellType::Obstacle => 0.0,
            CellType::Success => 1.0,
            CellType::Failure | CellType::DeadEnd => -1.0,
        }
    }

    fn glyph(self) -> Option<char> {
        match self {
            CellType::Empty => None,
            CellType::Obstacle => Some('#'),
            CellType::Success => Some('+'),
            CellType::Failure => Some('-'),
            CellType::DeadEnd => Some('x'),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Grid moves, in action index order.
pub enum Action {
    Left = 0,
    Up = 1,
    Right = 2,
    Down = 3,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Left, Action::Up, Action::Right, Action::Down];

    /// Action index in the compiled model.
    pub fn id(self) -> ActionId {
        ActionId::from(self as usize)
    }

    /// Grid move for an action index; `None` past the four moves.
    pub fn from_id(action: ActionId) -> Option<Self> {
        Self::ALL.get(action.index()).copied()
    }

    /// Arrow glyph used by [`GridWorld::render_policy`].
    pub fn arrow(self) -> char {
        match self {
            Action::Left => '←',
            Action::Up => '↑',
            Action::Right => '→',
            Action::Down => '↓',
        }
    }

    /// Directions an agent may slip into when choosing `self`.
    fn deviations(self) -> [Action; 2] {
        match self {
            Action::Left | Action::Right => [Action::Up, Action::Down],
            Action::Up | Action::Down => [Action::Left, Action::Right],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Serializable grid layout used for YAML IO.
pub struct GridLayout {
    pub width: usize,
    pub height: usize,
    /// `height` rows of `width` cell codes, top row first.
    pub rows: Vec<Vec<i64>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Rectangular grid world. States are numbered left to right, then top to
/// bottom, followed by one absorbing terminal state.
pub struct GridWorld {
    width: usize,
    height: usize,
    cells: Vec<CellType>,
}

impl GridWorld {
    /// Create a grid of empty cells.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`. The file and layout
    /// loaders reject such sizes with an error instead.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellType::Empty; width * height],
        }
    }

    /// Return the number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Return the number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Return the cell at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<CellType> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x])
    }

    /// Overwrite the cell at column `x`, row `y`. Out-of-range writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, cell: CellType) -> &mut Self {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
        self
    }

    /// Number of states in the compiled model, including the terminal state.
    pub fn state_count(&self) -> usize {
        self.width * self.height + 1
    }

    /// The absorbing state every success or failure cell leads to.
    pub fn terminal_state(&self) -> StateKey {
        StateKey::from(self.width * self.height)
    }

    /// State index of the cell at column `x`, row `y`.
    pub fn state_of(&self, x: usize, y: usize) -> Option<StateKey> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(StateKey::from(y * self.width + x))
    }

    /// Cell coordinates of a state; `None` for the terminal state.
    pub fn coords_of(&self, state: StateKey) -> Option<(usize, usize)> {
        if state.index() >= self.width * self.height {
            return None;
        }
        Some((state.index() % self.width, state.index() / self.width))
    }

    /// Parse the comma-delimited grid file: a `width,height` header, then one
    /// line of cell codes per row.
    ///
    /// Unknown cell codes become empty cells and missing rows stay empty.
    /// Lines past `height` rows are ignored.
    pub fn parse_csv(text: &str) -> Result<Self, MdpError> {
        let rows = split_rows(text);
        let header = rows.first().ok_or_else(|| MdpError::InvalidGridHeader {
            line: String::new(),
        })?;

        let invalid_header = || MdpError::InvalidGridHeader {
            line: header.join(","),
        };
        let [raw_width, raw_height] = header.as_slice() else {
            return Err(invalid_header());
        };
        let width = raw_width.parse::<usize>().map_err(|_| invalid_header())?;
        let height = raw_height.parse::<usize>().map_err(|_| invalid_header())?;
        checked_state_count(width, height).ok_or_else(invalid_header)?;

        let mut grid = Self::new(width, height);
        let body = &rows[1..];
        if body.len() > height {
            warn!(
                extra = body.len() - height,
                "grid file has more rows than its header declares; ignoring the rest"
            );
        }
        if body.len() < height {
            warn!(
                missing = height - body.len(),
                "grid file has fewer rows than its header declares; padding with empty cells"
            );
        }

        for (y, cells) in body.iter().take(height).enumerate() {
            if cells.len() != width {
                return Err(MdpError::GridRowWidth {
                    row: y,
                    expected: width,
                    actual: cells.len(),
                });
            }
            for (x, raw) in cells.iter().enumerate() {
                let code = raw.parse::<i64>().map_err(|_| MdpError::InvalidGridCell {
                    row: y,
                    column: x,
                    value: raw.to_string(),
                })?;
                grid.set(x, y, decode_cell(code, x, y));
            }
        }

        Ok(grid)
    }

    /// Render in the comma-delimited grid file format.
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.height + 1);
        lines.push(format!("{},{}", self.width, self.height));
        for row in self.cells.chunks(self.width.max(1)) {
            let codes: Vec<String> = row.iter().map(|cell| cell.code().to_string()).collect();
            lines.push(codes.join(","));
        }
        lines.join("\n")
    }

    /// Build a grid from a YAML layout. Unknown cell codes become empty cells.
    pub fn from_layout(layout: &GridLayout) -> Result<Self, MdpError> {
        checked_state_count(layout.width, layout.height).ok_or_else(|| {
            MdpError::InvalidGridHeader {
                line: format!("{},{}", layout.width, layout.height),
            }
        })?;
        if layout.rows.len() != layout.height {
            return Err(MdpError::GridRowCount {
                expected: layout.height,
                actual: layout.rows.len(),
            });
        }

        let mut grid = Self::new(layout.width, layout.height);
        for (y, row) in layout.rows.iter().enumerate() {
            if row.len() != layout.width {
                return Err(MdpError::GridRowWidth {
                    row: y,
                    expected: layout.width,
                    actual: row.len(),
                });
            }
            for (x, code) in row.iter().enumerate() {
                grid.set(x, y, decode_cell(*code, x, y));
            }
        }
        Ok(grid)
    }

    /// Convert into the serializable layout, one `Vec` of codes per row.
    pub fn to_layout(&self) -> GridLayout {
        GridLayout {
            width: self.width,
            height: self.height,
            rows: self
                .cells
                .chunks(self.width.max(1))
                .map(|row| row.iter().map(|cell| i64::from(cell.code())).collect())
                .collect(),
        }
    }

    /// State reached by moving one step in `direction` from `(x, y)`, or
    /// `None` when the grid edge or an obstacle blocks the move.
    fn neighbor(&self, x: usize, y: usize, direction: Action) -> Option<StateKey> {
        let (nx, ny) = match direction {
            Action::Left => (x.checked_sub(1)?, y),
            Action::Up => (x, y.checked_sub(1)?),
            Action::Right => (x + 1, y),
            Action::Down => (x, y + 1),
        };
        match self.get(nx, ny)? {
            CellType::Obstacle => None,
            _ => self.state_of(nx, ny),
        }
    }

    /// Compile into a tabular MDP with the four grid moves.
    ///
    /// Moves succeed with [`FORWARD_PROB`] and slip sideways with
    /// [`DEVIATE_PROB`] each way; blocked moves leave the agent in place.
    /// Obstacles and dead ends trap the agent, success and failure cells exit
    /// to the terminal state.
    pub fn compile(&self) -> Result<TabularMdp, MdpError> {
        let n = self.state_count();
        let terminal = self.terminal_state().index();
        let mut builder = MdpBuilder::new(n, Action::ALL.len());

        for action in Action::ALL {
            let a = action as usize;
            for y in 0..self.height {
                for x in 0..self.width {
                    let s = y * self.width + x;
                    match self.cells[s] {
                        CellType::Obstacle | CellType::DeadEnd => {
                            builder.set_transition(s, a, s, 1.0)?;
                        }
                        CellType::Success | CellType::Failure => {
                            builder.set_transition(s, a, terminal, 1.0)?;
                        }
                        CellType::Empty => {
                            let [left, right] = action.deviations();
                            for (direction, prob) in [
                                (action, FORWARD_PROB),
                                (left, DEVIATE_PROB),
                                (right, DEVIATE_PROB),
                            ] {
                                let next = self
                                    .neighbor(x, y, direction)
                                    .map_or(s, StateKey::index);
                                builder.add_transition(s, a, next, prob)?;
                            }
                        }
                    }
                }
            }
            builder.set_transition(terminal, a, terminal, 1.0)?;
        }

        for (s, cell) in self.cells.iter().enumerate() {
            builder.set_reward(s, cell.reward())?;
        }
        builder.set_reward(terminal, TERMINAL_REWARD)?;

        let mdp = builder.build()?;
        debug!(
            width = self.width,
            height = self.height,
            states = n,
            "compiled grid world"
        );
        Ok(mdp)
    }

    /// Draw the policy as arrows on empty cells; other cells show their kind.
    pub fn render_policy(&self, policy: &[ActionId]) -> String {
        let mut lines = Vec::with_capacity(self.height);
        for y in 0..self.height {
            let line: String = (0..self.width)
                .map(|x| {
                    let s = y * self.width + x;
                    self.cells[s].glyph().unwrap_or_else(|| {
                        policy
                            .get(s)
                            .and_then(|action| Action::from_id(*action))
                            .map_or('?', Action::arrow)
                    })
                })
                .collect();
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// State count of a `width` x `height` grid, or `None` if the compiled
/// transition tensor could not be indexed.
fn checked_state_count(width: usize, height: usize) -> Option<usize> {
    let n = width.checked_mul(height)?.checked_add(1)?;
    n.checked_mul(Action::ALL.len())?.checked_mul(n).map(|_| n)
}

fn decode_cell(code: i64, x: usize, y: usize) -> CellType {
    CellType::from_code(code).unwrap_or_else(|| {
        warn!(code, x, y, "unknown grid cell code; treating it as empty");
        CellType::Empty
    })
}
