// Error types for spectral processing
//
// This module defines the error taxonomy for spectrum construction, analysis
// and cutting, with numeric error codes for structured reporting.

mod spectrum;

pub use spectrum::{log_spectrum_error, SpectrumError, SpectrumErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling in the CLI
/// and in logs.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
