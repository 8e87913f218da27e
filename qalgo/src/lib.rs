pub mod adaptive;
pub mod arith;
pub mod config;
pub mod events;
pub mod grover;
pub mod shor;

// Re-export key components for easier access from the binary or other libraries.
pub use adaptive::{AdaptiveOutcome, AdaptiveSearch, Extremum};
pub use arith::{ContinuedFraction, Phase};
pub use config::RunConfig;
pub use events::{Event, emit_event};
pub use grover::{Grover, GroverOptions, optimal_iterations, success_probability};
pub use shor::{FactorAttempt, PeriodSearch, Shor, ShorOptions, ShorOutcome};
