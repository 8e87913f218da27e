use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

/// A lightweight error enum so callers don't rely on the register internals.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid qubit index {index} for a {num_qubits}-qubit register")]
    QubitIndex { index: usize, num_qubits: usize },
    /// Accumulated rounding left a state too far from unit norm to be repaired.
    #[error("Numerical drift: state norm {norm} is outside tolerance")]
    NumericalDrift { norm: f64 },
    #[error("Period search did not converge within a search radius of {radius}")]
    NonConvergence { radius: u64 },
    #[error("A {num_qubits}-qubit operator needs {bytes} bytes, exceeding the memory budget")]
    ResourceExhaustion { num_qubits: usize, bytes: u128 },
}

impl SimError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        SimError::InvalidArgument(message.into())
    }

    /// Drift and non-convergence come from the randomness of a single run;
    /// the caller can try again with fresh randomness.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SimError::NumericalDrift { .. } | SimError::NonConvergence { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stochastic_failures_are_recoverable() {
        assert!(SimError::NumericalDrift { norm: 0.0 }.is_recoverable());
        assert!(SimError::NonConvergence { radius: 40 }.is_recoverable());
        assert!(!SimError::invalid_argument("gate").is_recoverable());
        assert!(!SimError::QubitIndex { index: 3, num_qubits: 2 }.is_recoverable());
        assert!(
            !SimError::ResourceExhaustion { num_qubits: 40, bytes: 1 << 84 }.is_recoverable()
        );
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = SimError::QubitIndex { index: 5, num_qubits: 3 };
        assert_eq!(err.to_string(), "Invalid qubit index 5 for a 3-qubit register");
    }
}
