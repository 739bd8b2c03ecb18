//! Error types for the calculation engine

use thiserror::Error;

/// Engine error types
///
/// Every variant is a deterministic function of the input, retrying the
/// same calculation yields the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Timezone identifier (or default zone) could not be resolved
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed input (business-hour rule, unordered observations)
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
