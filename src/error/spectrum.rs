// Spectrum error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Spectrum error code constants
///
/// Single source of truth for the numeric codes reported by the CLI.
///
/// Error code range: 3001-3006
pub struct SpectrumErrorCodes {}

impl SpectrumErrorCodes {
    /// Spectrum has no samples
    pub const EMPTY_SPECTRUM: i32 = 3001;

    /// Cut list has no frequencies
    pub const EMPTY_CUT_LIST: i32 = 3002;

    /// Parameter or data rejected before any computation
    pub const INVALID_INPUT: i32 = 3003;

    /// Not enough peaks/valleys to estimate a noise floor
    pub const INSUFFICIENT_PEAKS: i32 = 3004;

    /// Malformed numeric table
    pub const PARSE: i32 = 3005;

    /// File could not be read or written
    pub const IO: i32 = 3006;
}

/// Log a spectrum error with structured context
///
/// This function logs spectrum errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_spectrum_error(err: &SpectrumError, context: &str) {
    error!(
        "Spectrum error in {}: code={}, component=SpectralPipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Spectrum-related errors
///
/// All errors are local and non-recoverable at the point of detection; they
/// propagate to the caller without retry.
///
/// Error code range: 3001-3006
#[derive(Debug, Clone, PartialEq)]
pub enum SpectrumError {
    /// Spectrum has no samples
    EmptySpectrum,

    /// Cut list has no frequencies
    EmptyCutList,

    /// Non-positive resolution/width, too few points, bad ordering, ...
    InvalidInput { reason: String },

    /// No valley between consecutive peaks left any baseline samples
    InsufficientPeaks { peaks: usize, valleys: usize },

    /// Malformed line in a numeric table
    Parse { line: usize, reason: String },

    /// File access failed
    Io { details: String },
}

impl SpectrumError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SpectrumError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Rejected before any computation (empty data, bad parameters)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            SpectrumError::EmptySpectrum
                | SpectrumError::EmptyCutList
                | SpectrumError::InvalidInput { .. }
        )
    }
}

impl ErrorCode for SpectrumError {
    fn code(&self) -> i32 {
        match self {
            SpectrumError::EmptySpectrum => SpectrumErrorCodes::EMPTY_SPECTRUM,
            SpectrumError::EmptyCutList => SpectrumErrorCodes::EMPTY_CUT_LIST,
            SpectrumError::InvalidInput { .. } => SpectrumErrorCodes::INVALID_INPUT,
            SpectrumError::InsufficientPeaks { .. } => SpectrumErrorCodes::INSUFFICIENT_PEAKS,
            SpectrumError::Parse { .. } => SpectrumErrorCodes::PARSE,
            SpectrumError::Io { .. } => SpectrumErrorCodes::IO,
        }
    }

    fn message(&self) -> String {
        match self {
            SpectrumError::EmptySpectrum => "Empty spectrum".to_string(),
            SpectrumError::EmptyCutList => "Empty cut list".to_string(),
            SpectrumError::InvalidInput { reason } => format!("Invalid input: {}", reason),
            SpectrumError::InsufficientPeaks { peaks, valleys } => format!(
                "Insufficient peaks to estimate noise: {} peaks, {} usable valleys",
                peaks, valleys
            ),
            SpectrumError::Parse { line, reason } => {
                format!("Parse error on line {}: {}", line, reason)
            }
            SpectrumError::Io { details } => format!("I/O error: {}", details),
        }
    }
}

impl fmt::Display for SpectrumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpectrumError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for SpectrumError {}

/// Convert from std::io::Error to SpectrumError
impl From<std::io::Error> for SpectrumError {
    fn from(err: std::io::Error) -> Self {
        SpectrumError::Io {
            details: err.to_string(),
        }
    }
}

impl From<hound::Error> for SpectrumError {
    fn from(err: hound::Error) -> Self {
        SpectrumError::Io {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectrum_error_codes() {
        assert_eq!(SpectrumError::EmptySpectrum.code(), 3001);
        assert_eq!(SpectrumError::EmptyCutList.code(), 3002);
        assert_eq!(SpectrumError::invalid("width").code(), 3003);
        assert_eq!(
            SpectrumError::InsufficientPeaks {
                peaks: 1,
                valleys: 0
            }
            .code(),
            3004
        );
        assert_eq!(
            SpectrumError::Parse {
                line: 3,
                reason: "x".to_string()
            }
            .code(),
            3005
        );
        assert_eq!(
            SpectrumError::Io {
                details: "x".to_string()
            }
            .code(),
            3006
        );
    }

    #[test]
    fn test_messages_carry_context() {
        let err = SpectrumError::InsufficientPeaks {
            peaks: 1,
            valleys: 0,
        };
        assert!(err.message().contains("1 peaks"));
        assert!(err.to_string().contains("code 3004"));

        let err = SpectrumError::Parse {
            line: 7,
            reason: "expected two columns".to_string(),
        };
        assert!(err.message().contains("line 7"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing table");
        let err: SpectrumError = io_err.into();

        match err {
            SpectrumError::Io { details } => assert!(details.contains("missing table")),
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn test_error_code_trait_object() {
        let err: &dyn ErrorCode = &SpectrumError::EmptyCutList;
        assert_eq!(err.code(), SpectrumErrorCodes::EMPTY_CUT_LIST);
    }
}
