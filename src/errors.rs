//! Centralized error handling for hs_dycore
//!
//! Argument problems, numerical failures and engine failures are kept apart so
//! callers can tell a bad call from a failed computation.

use std::fmt;

/// Boxed error returned by a simulation engine
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for hs_dycore operations
#[derive(Debug)]
pub enum HsDycoreError {
    /// Caller supplied arguments outside the accepted domain
    InvalidArgument(String),

    /// Numerical computation failed (non-finite input, solver failure)
    Computation(String),

    /// Failure reported by the simulation engine, passed through untouched
    Engine(EngineError),

    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Engine request encoding errors
    JsonError(serde_json::Error),

    /// Variable not found in NetCDF file
    VariableNotFound { var: String },

    /// Dimension not found in variable
    DimensionNotFound { var: String, dim: String },

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),
}

impl fmt::Display for HsDycoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HsDycoreError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            HsDycoreError::Computation(msg) => write!(f, "Computation failed: {}", msg),
            HsDycoreError::Engine(e) => write!(f, "Simulation engine error: {}", e),
            HsDycoreError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            HsDycoreError::IoError(e) => write!(f, "I/O error: {}", e),
            HsDycoreError::JsonError(e) => write!(f, "JSON error: {}", e),
            HsDycoreError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            HsDycoreError::DimensionNotFound { var, dim } => {
                write!(f, "Dimension '{}' not found in variable '{}'", dim, var)
            }
            HsDycoreError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            HsDycoreError::ArrayError(e) => write!(f, "Array error: {}", e),
        }
    }
}

impl std::error::Error for HsDycoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HsDycoreError::Engine(e) => Some(e.as_ref()),
            HsDycoreError::NetCDFError(e) => Some(e),
            HsDycoreError::IoError(e) => Some(e),
            HsDycoreError::JsonError(e) => Some(e),
            HsDycoreError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl HsDycoreError {
    /// Shorthand for an invalid-argument error
    pub fn invalid(msg: impl Into<String>) -> Self {
        HsDycoreError::InvalidArgument(msg.into())
    }

    /// Wrap any engine-side failure without altering it
    pub fn engine<E>(error: E) -> Self
    where
        E: Into<EngineError>,
    {
        HsDycoreError::Engine(error.into())
    }
}

impl From<netcdf::Error> for HsDycoreError {
    fn from(error: netcdf::Error) -> Self {
        HsDycoreError::NetCDFError(error)
    }
}

impl From<std::io::Error> for HsDycoreError {
    fn from(error: std::io::Error) -> Self {
        HsDycoreError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for HsDycoreError {
    fn from(error: ndarray::ShapeError) -> Self {
        HsDycoreError::ArrayError(error)
    }
}

impl From<serde_json::Error> for HsDycoreError {
    fn from(error: serde_json::Error) -> Self {
        HsDycoreError::JsonError(error)
    }
}

/// Result type alias for hs_dycore operations
pub type Result<T> = std::result::Result<T, HsDycoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn engine_errors_keep_their_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "engine crashed");
        let err = HsDycoreError::engine(inner);
        assert!(format!("{}", err).contains("engine crashed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn invalid_argument_message() {
        let err = HsDycoreError::invalid("batch_size must be positive");
        assert_eq!(
            format!("{}", err),
            "Invalid argument: batch_size must be positive"
        );
        assert!(err.source().is_none());
    }
}
