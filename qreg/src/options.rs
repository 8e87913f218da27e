//! Option structs for the register algebra, noise model and memory budget.
//!
//! Every struct deserialises with `#[serde(default)]`, so a JSON config only
//! needs to name the fields it changes.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Default maximum rotation scale for injected errors.
pub const DEFAULT_ERROR_SIZE: f64 = 0.01;

/// Default budget for a single dense operator (1 GiB).
pub const DEFAULT_MAX_OPERATOR_BYTES: usize = 1 << 30;

/// Which qubits a unary gate is placed on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Targets {
    #[default]
    All,
    Only(Vec<usize>),
}

impl Targets {
    pub fn contains(&self, qubit: usize) -> bool {
        match self {
            Targets::All => true,
            Targets::Only(targets) => targets.contains(&qubit),
        }
    }
}

impl From<Vec<usize>> for Targets {
    fn from(targets: Vec<usize>) -> Self {
        Targets::Only(targets)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendOptions {
    pub targets: Targets,
    /// Report tensor-product progress at debug level.
    pub verbose: bool,
}

impl ExtendOptions {
    pub fn targets(targets: impl Into<Vec<usize>>) -> Self {
        Self {
            targets: Targets::Only(targets.into()),
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Random small-rotation gate errors. Noise is disabled by passing `None`
/// wherever an `Option<&NoiseConfig>` is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Chance that an insertion point receives an error, and that each extra
    /// qubit joins an error's target set.
    pub error_probability: f64,
    /// Rotation angles are drawn from `[0, 4π·error_size)`.
    pub error_size: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            error_probability: 0.0,
            error_size: DEFAULT_ERROR_SIZE,
        }
    }
}

impl NoiseConfig {
    pub fn new(error_probability: f64) -> Self {
        Self {
            error_probability,
            ..Self::default()
        }
    }

    pub fn with_error_size(mut self, error_size: f64) -> Self {
        self.error_size = error_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.error_probability) {
            return Err(SimError::invalid_argument(format!(
                "error probability must lie in [0, 1], got {}",
                self.error_probability
            )));
        }
        if !self.error_size.is_finite() || self.error_size < 0.0 {
            return Err(SimError::invalid_argument(format!(
                "error size must be a finite non-negative number, got {}",
                self.error_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Largest dense operator, in bytes, a backend may allocate.
    pub max_operator_bytes: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_operator_bytes: DEFAULT_MAX_OPERATOR_BYTES,
        }
    }
}

impl ResourceLimits {
    pub fn with_max_operator_bytes(max_operator_bytes: usize) -> Self {
        Self { max_operator_bytes }
    }
}
