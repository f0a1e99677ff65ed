//! Error types for the Stepwise domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

use crate::envelope::{ParseError, Step};

/// The top-level error type for all Stepwise operations.
///
/// Every variant ends the current turn; none of them ends the process.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Protocol errors ---
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Protocol(ProtocolError::Malformed(err))
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },
}

/// Violations of the plan/action/observe/output exchange with the model.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{0}")]
    Malformed(#[from] ParseError),

    #[error("Unknown tool requested: {0}")]
    UnknownTool(String),

    #[error("Model emitted a '{0}' step, which only the agent may produce")]
    UnexpectedStep(Step),

    #[error("Turn exceeded {0} model queries without reaching an output step")]
    StepLimit(u32),
}
