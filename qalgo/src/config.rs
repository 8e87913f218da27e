//! Run-wide settings shared by every subcommand of the driver.

use qreg::{NoiseConfig, ResourceLimits, Result};
use serde::{Deserialize, Serialize};

/// ```json
/// { "noise": { "error_probability": 0.01, "error_size": 0.02 },
///   "limits": { "max_operator_bytes": 268435456 } }
/// ```
///
/// Both sections are optional. Without `noise` every run is noiseless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub noise: Option<NoiseConfig>,
    pub limits: ResourceLimits,
}

impl RunConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Rejects noise settings the injector would refuse later.
    pub fn validate(&self) -> Result<()> {
        match &self.noise {
            Some(noise) => noise.validate(),
            None => Ok(()),
        }
    }
}
