//! Error types for i8mm operations
//!
//! Only the recoverable failure classes live here: a fixture that cannot be
//! read or parsed, a backend that is not compiled in, a device failure, or a
//! report that cannot be written.
//! A kernel that computes the wrong product is *not* an error; it is a
//! failing [`Outcome`](crate::verify::Outcome).

use thiserror::Error;

use crate::Backend;

/// Result type for i8mm operations
pub type Result<T> = std::result::Result<T, I8mmError>;

/// Errors that can occur while preparing or executing a test
#[derive(Debug, Error)]
pub enum I8mmError {
    /// Fixture names a mode the generator does not know
    #[error("Unknown input mode: {0}")]
    UnknownMode(String),

    /// Fixture has missing, unparsable or trailing fields
    #[error("Malformed fixture: {0}")]
    MalformedFixture(String),

    /// Buffer length does not match the problem shape
    #[error("Size mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Backend not compiled into this build
    #[error("Backend not supported in this build: {0:?}")]
    UnsupportedBackend(Backend),

    /// GPU error
    #[error("GPU error: {0}")]
    GpuError(String),

    /// Fixture file I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report sink could not be created or written
    #[error("Report write failed: {0}")]
    Report(std::io::Error),
}

impl I8mmError {
    /// Process exit status for this error
    ///
    /// Status 1 is left to the argument parser (invalid usage).
    pub fn exit_code(&self) -> u8 {
        match self {
            I8mmError::Io(_) => 2,
            I8mmError::UnknownMode(_) => 3,
            I8mmError::MalformedFixture(_) | I8mmError::ShapeMismatch { .. } => 4,
            I8mmError::UnsupportedBackend(_) => 5,
            I8mmError::GpuError(_) => 6,
            I8mmError::Report(_) => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_mode_error() {
        let err = I8mmError::UnknownMode("diagonal".to_string());
        assert_eq!(err.to_string(), "Unknown input mode: diagonal");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_shape_mismatch_error() {
        let err = I8mmError::ShapeMismatch {
            expected: 16,
            actual: 12,
        };
        assert_eq!(err.to_string(), "Size mismatch: expected 16, got 12");
    }

    #[test]
    fn test_unsupported_backend_error() {
        let err = I8mmError::UnsupportedBackend(Backend::Gpu);
        assert_eq!(err.to_string(), "Backend not supported in this build: Gpu");
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.txt");
        let err: I8mmError = io.into();
        assert!(err.to_string().starts_with("IO error"));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            I8mmError::Io(std::io::Error::other("x")).exit_code(),
            I8mmError::UnknownMode(String::new()).exit_code(),
            I8mmError::MalformedFixture(String::new()).exit_code(),
            I8mmError::UnsupportedBackend(Backend::Gpu).exit_code(),
            I8mmError::GpuError(String::new()).exit_code(),
            I8mmError::Report(std::io::Error::other("x")).exit_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, 1, "exit status 1 is reserved for usage errors");
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
