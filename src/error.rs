//! Unified error types for zetopo
//!
//! This module defines all error types used throughout the crate.
//! Uses thiserror for ergonomic error definitions.
//!
//! Note that discovery itself never surfaces these to its caller: every
//! vendor-API failure degrades to "less metadata". The error types exist
//! for the layers below the controller and for the CLI.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from Level Zero operations
    #[error("Level Zero error: {0}")]
    Ze(#[from] ZeError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the Level Zero abstraction layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZeError {
    /// The Level Zero loader library could not be found or loaded
    #[error("Level Zero loader library not found. Is the oneAPI runtime installed?")]
    LibraryNotFound,

    /// A required symbol is missing from the loader library
    #[error("Level Zero loader is missing symbol {0}")]
    MissingSymbol(&'static str),

    /// Runtime initialization failed
    #[error("Failed to initialize Level Zero: {0}")]
    InitializationFailed(String),

    /// The management (sysman) subsystem is unavailable for this query
    #[error("Management subsystem unavailable: {0}")]
    ManagementUnavailable(String),

    /// The device does not support the requested query
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// The vendor API rejected an argument (also returned when a device
    /// has no subdevices)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The device was lost mid-enumeration
    #[error("Device lost or has become inaccessible")]
    DeviceLost,

    /// Any other vendor result code
    #[error("Level Zero error: {0}")]
    Unknown(String),
}

/// Errors from configuration parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Unrecognized memory-source override value
    #[error("Invalid memory source override '{0}' (expected basic, detailed, or basic-ddr)")]
    InvalidMemorySource(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ze_error_display() {
        let err = ZeError::LibraryNotFound;
        assert!(err.to_string().contains("oneAPI"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidMemorySource("bogus".to_string());
        assert!(err.to_string().contains("bogus"));
        assert!(err.to_string().contains("basic-ddr"));
    }

    #[test]
    fn test_error_conversion() {
        let ze_err = ZeError::DeviceLost;
        let app_err: AppError = ze_err.into();
        assert!(matches!(app_err, AppError::Ze(_)));
    }
}
