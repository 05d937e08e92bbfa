// src/error.rs

use std::fmt;
use std::io;

/// Every failure the library can report. All of them are fatal to the call
/// that produced them; an unmatched atom is a result, not an error.
#[derive(Debug)]
pub enum FlpzError {
    /// Singular or degenerate basis. `which` names the offending lattice.
    InvalidLattice { which: String, det: f64 },
    /// An atom list (or data set) that must not be empty was empty.
    EmptyInput(String),
    /// Wrong dimensionality or unparsable numbers from an input source.
    MalformedInput(String),
    InvalidTolerance(f64),
    Fit(String),
    Plot(String),
    Io(io::Error),
}

impl fmt::Display for FlpzError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FlpzError::InvalidLattice { which, det } => write!(
                f,
                "{} lattice is singular (determinant {:.3e})",
                which, det
            ),
            FlpzError::EmptyInput(what) => write!(f, "{} contains no atoms", what),
            FlpzError::MalformedInput(msg) => write!(f, "malformed input: {}", msg),
            FlpzError::InvalidTolerance(t) => {
                write!(f, "Tolerance must be a finite non-negative number, got {}", t)
            }
            FlpzError::Fit(msg) => write!(f, "fit failed: {}", msg),
            FlpzError::Plot(msg) => write!(f, "plot failed: {}", msg),
            FlpzError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for FlpzError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FlpzError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FlpzError {
    fn from(e: io::Error) -> Self {
        FlpzError::Io(e)
    }
}

impl From<serde_json::Error> for FlpzError {
    fn from(e: serde_json::Error) -> Self {
        FlpzError::MalformedInput(format!("JSON: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, FlpzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_single_line() {
        let errors = [
            FlpzError::InvalidLattice { which: "origin".into(), det: 0.0 },
            FlpzError::EmptyInput("target cell".into()),
            FlpzError::MalformedInput("expected 9 numbers, got 8".into()),
            FlpzError::InvalidTolerance(-1.0),
        ];
        for e in errors {
            let msg = e.to_string();
            assert!(!msg.contains('\n'), "{}", msg);
            assert!(!msg.is_empty());
        }
    }

    #[test]
    fn test_io_error_keeps_source() {
        let e: FlpzError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(std::error::Error::source(&e).is_some());
        assert!(e.to_string().contains("gone"));
    }
}
