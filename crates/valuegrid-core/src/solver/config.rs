use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};

const DEFAULT_SOLVER_CONFIG_YAML: &str = include_str!("../../config/solver.default.yaml");

/// Controls which values a sweep reads while updating a state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Update values in place; later states in a sweep see earlier fresh values.
    #[default]
    GaussSeidel,
    /// Read only the previous sweep's values (double-buffered).
    Jacobi,
}

/// Parameters for a value-iteration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub gamma: f64,
    pub epsilon: f64,
    pub max_sweeps: Option<usize>,
    pub update: UpdateMode,
}

/// Fields of a config file; `None` for every key the file leaves out.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SolverConfigOverlay {
    gamma: Option<f64>,
    epsilon: Option<f64>,
    max_sweeps: Option<usize>,
    update: Option<UpdateMode>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            gamma: 0.9,
            epsilon: 0.01,
            max_sweeps: None,
            update: UpdateMode::GaussSeidel,
        }
    }
}

impl SolverConfig {
    /// Parameters used by the command-line solver: undiscounted, tight tolerance.
    pub fn cli_default() -> Self {
        SolverConfig {
            gamma: 1.0,
            epsilon: 0.0001,
            ..SolverConfig::default()
        }
    }

    /// Parse a solver config from YAML text. Missing fields take [`SolverConfig::default`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SolverConfigError> {
        SolverConfig::default().overlay_yaml_str(yaml)
    }

    /// Parse a solver config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SolverConfigError> {
        let yaml = fs::read_to_string(path).map_err(SolverConfigError::Io)?;
        Self::from_yaml_str(&yaml)
    }

    /// Apply the fields present in `yaml` on top of `self`.
    ///
    /// Absent fields, and an explicit `max_sweeps: null`, keep the value from `self`.
    pub fn overlay_yaml_str(&self, yaml: &str) -> Result<Self, SolverConfigError> {
        let overlay: SolverConfigOverlay =
            serde_yaml::from_str(yaml).map_err(SolverConfigError::Yaml)?;

        let config = SolverConfig {
            gamma: overlay.gamma.unwrap_or(self.gamma),
            epsilon: overlay.epsilon.unwrap_or(self.epsilon),
            max_sweeps: overlay.max_sweeps.or(self.max_sweeps),
            update: overlay.update.unwrap_or(self.update),
        };
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file and apply it on top of `self`.
    pub fn overlay_yaml_path(&self, path: impl AsRef<Path>) -> Result<Self, SolverConfigError> {
        let yaml = fs::read_to_string(path).map_err(SolverConfigError::Io)?;
        self.overlay_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_SOLVER_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, SolverConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    /// Check the fields a run cannot proceed without.
    ///
    /// The range of `gamma` is not checked: values outside `[0, 1]` are
    /// accepted and simply have no convergence guarantee.
    pub fn validate(&self) -> Result<(), SolverConfigError> {
        if !self.gamma.is_finite() {
            return Err(SolverConfigError::Invalid(
                "gamma must be finite".to_string(),
            ));
        }
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(SolverConfigError::Invalid(
                "epsilon must be finite and >= 0".to_string(),
            ));
        }
        if self.max_sweeps == Some(0) {
            return Err(SolverConfigError::Invalid(
                "max_sweeps must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error type for loading and validating `SolverConfig`.
#[derive(Debug)]
pub enum SolverConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for SolverConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            SolverConfigError::Yaml(err) => write!(f, "failed to parse config YAML: {err}"),
            SolverConfigError::Invalid(err) => write!(f, "invalid solver config: {err}"),
        }
    }
}

impl std::error::Error for SolverConfigError {}
