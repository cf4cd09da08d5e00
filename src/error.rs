//! Error types for the densest-subgraph engines
//!
//! Only structural input defects and bad parameters are errors. Degenerate
//! graphs (no vertices, no edges) and zero denominators are handled inside
//! the engines with a defined fallback and a `tracing` diagnostic.

use thiserror::Error;

/// Errors that can occur while loading a graph or running an engine
#[derive(Error, Debug)]
pub enum GraphError {
    /// The input graph text is malformed. Fatal to the current computation.
    #[error("format error on line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        GraphError::Format {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_message_names_line() {
        let err = GraphError::format(3, "expected 3 fields");
        assert_eq!(err.to_string(), "format error on line 3: expected 3 fields");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: GraphError = io.into();
        assert!(matches!(err, GraphError::Io(_)));
    }
}
