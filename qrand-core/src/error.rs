// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Error types for the quantum random bit service
//!
//! A single taxonomy built with `thiserror`. Hardware-path errors are never
//! surfaced to callers: the generator recovers from them by falling back to
//! the simulator. Everything else maps onto an HTTP status in the server.

pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for bit generation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration validation failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested bit count out of range
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid API key
    #[error("Invalid API key")]
    Authentication,

    /// No API key configured on the server side
    #[error("API key not configured")]
    AuthNotConfigured,

    /// Transport failure talking to the remote device
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote device answered but the answer is unusable
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Remote device did not answer within the configured bound
    #[error("Hardware request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Unexpected failure in the simulation or packing path
    #[error("Generation failed: {0}")]
    Generation(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Errors the fallback policy recovers from by switching to the simulator
    pub fn is_hardware_error(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Hardware(_) | Error::Timeout(_)
        )
    }

    /// Check if error is a caller-side validation failure
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if error indicates authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Authentication | Error::AuthNotConfigured)
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Generation(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_hardware_classification() {
        assert!(Error::Hardware("HTTP 503".to_string()).is_hardware_error());
        assert!(Error::Timeout(Duration::from_secs(30)).is_hardware_error());
        assert!(!Error::Generation("boom".to_string()).is_hardware_error());
        assert!(!Error::Validation("bad".to_string()).is_hardware_error());
    }

    #[test]
    fn test_validation_message_is_bare() {
        let err = Error::Validation("n_bits must be positive".to_string());
        assert_eq!(err.to_string(), "n_bits must be positive");
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_auth_classification() {
        assert!(Error::Authentication.is_auth_error());
        assert!(Error::AuthNotConfigured.is_auth_error());
        assert!(!Error::Config("x".to_string()).is_auth_error());
    }
}
