pub mod algebra;
pub mod backend;
pub mod error;
pub mod gates;
pub mod measure;
pub mod noise;
pub mod options;
pub mod state;

// Re-export key components for easier access from the algorithm crate.
pub use algebra::{extend_adjacent_binary, extend_binary, extend_unary, is_unitary};
#[cfg(feature = "parallel")]
pub use backend::ParallelBackend;
pub use backend::{DenseBackend, LinearBackend, Operator};
pub use error::{Result, SimError};
pub use measure::{Outcome, measure, sample_counts};
pub use noise::{get_error_matrix, maybe_error};
pub use options::{ExtendOptions, NoiseConfig, ResourceLimits, Targets};
pub use state::StateVector;
