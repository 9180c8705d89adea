use thiserror::Error;
use valuegrid_core::ModelError;

#[derive(Debug, Error)]
/// Error type for model and grid loading, writing, and builder operations.
pub enum MdpError {
    #[error("failed to access file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("model file is empty; expected the state count in row 0, column 0")]
    MissingStateCount,

    #[error("invalid state count '{value}' in row 0, column 0")]
    InvalidStateCount { value: String },

    #[error("model needs {expected_rows} rows but row {row} is missing")]
    MissingRow { row: usize, expected_rows: usize },

    #[error("row {row} has no column {column}")]
    MissingField { row: usize, column: usize },

    #[error("row {row}, column {column}: '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("invalid model: {0}")]
    Model(#[from] ModelError),

    #[error("invalid grid header '{line}'; expected 'width,height'")]
    InvalidGridHeader { line: String },

    #[error("grid row {row} has {actual} cells, expected {expected}")]
    GridRowWidth {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("grid declares {expected} rows but lists {actual}")]
    GridRowCount { expected: usize, actual: usize },

    #[error("grid row {row}, column {column}: '{value}' is not a cell code")]
    InvalidGridCell {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("builder referenced unknown state {state}")]
    BuilderUnknownState { state: usize },

    #[error("builder referenced unknown action {action}")]
    BuilderUnknownAction { action: usize },
}

impl MdpError {
    /// Whether the input text was readable but does not describe a valid model.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            MdpError::MissingStateCount
                | MdpError::InvalidStateCount { .. }
                | MdpError::MissingRow { .. }
                | MdpError::MissingField { .. }
                | MdpError::InvalidNumber { .. }
                | MdpError::Model(_)
        )
    }
}
