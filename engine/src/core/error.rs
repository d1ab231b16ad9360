//! WaveCoach Error Definitions
//!
//! Defines error types used throughout the analysis engine.

use thiserror::Error;

use super::ProviderId;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Bad or missing video metadata, invalid sampling interval, unreadable frame.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// No usable active provider, missing credential, or a run already in flight.
    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Provider Errors
    // =========================================================================
    /// A backend call failed. `status` is `None` for transport failures.
    #[error("{provider} provider error{}: {message}", fmt_status(.status))]
    Provider {
        provider: ProviderId,
        status: Option<u16>,
        message: String,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    /// Provider text did not match the analysis schema.
    #[error("Parse error: {0}")]
    Parse(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// A backend call exceeded the provider's request timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Coarse error category, enough for a caller to decide between retrying,
/// reconfiguring, or falling back to an offline report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    InvalidInput,
    Configuration,
    Provider,
    Parse,
    Other,
}

impl CoreError {
    /// Builds a provider error carrying the backend's status and message.
    pub fn provider(provider: ProviderId, status: Option<u16>, message: impl Into<String>) -> Self {
        CoreError::Provider {
            provider,
            status,
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::InvalidInput(_) => ErrorCategory::InvalidInput,
            CoreError::Configuration(_) => ErrorCategory::Configuration,
            CoreError::Provider { .. } => ErrorCategory::Provider,
            CoreError::Parse(_) => ErrorCategory::Parse,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether the error ends an analysis run. Parse errors are absorbed per frame.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CoreError::Parse(_))
    }
}
