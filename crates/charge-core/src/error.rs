//! Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type alias for charge polling operations
pub type Result<T> = std::result::Result<T, PollError>;

/// Charge polling error types
#[derive(Error, Debug)]
pub enum PollError {
    /// Request could not complete (DNS, connection refused, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Request did not settle within the configured timeout
    #[error("Status request timed out after {0:?}")]
    Timeout(Duration),

    /// Endpoint answered with a non-success HTTP status
    #[error("Status endpoint returned HTTP {0}")]
    HttpStatus(u16),

    /// Body was not JSON or lacked `data.status`
    #[error("Malformed status response: {0}")]
    MalformedResponse(String),

    /// Charge reference was empty
    #[error("Invalid charge reference: {0}")]
    InvalidCharge(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PollError {
    /// Check if the next tick may succeed where this one failed
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::HttpStatus(_) | Self::MalformedResponse(_)
        )
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Network(_) | Self::Timeout(_) => {
                "We could not reach the payment service. Still waiting for your payment."
            }
            Self::HttpStatus(_) | Self::MalformedResponse(_) => {
                "The payment service sent an unexpected answer. Still waiting for your payment."
            }
            Self::InvalidCharge(_) => "This payment could not be identified.",
            Self::Config(_) => "Service configuration error.",
            Self::Json(_) => "An error occurred processing your request.",
        }
    }
}
