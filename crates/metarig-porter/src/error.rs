//! Error types for the porters.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for porter operations.
pub type PorterResult<T> = Result<T, PorterError>;

/// Errors raised while reading or writing pose and weight documents.
#[derive(Debug, Error)]
pub enum PorterError {
    /// Failed to read or write a document.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON of the expected shape.
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    /// A vertex key is not a non-negative integer, or is past the mesh.
    #[error("group '{group}': invalid vertex index '{key}'")]
    InvalidVertex { group: String, key: String },

    /// A weight is outside (0, 1].
    #[error("group '{group}': weight {weight} of vertex {vertex} is outside (0, 1]")]
    WeightOutOfRange {
        group: String,
        vertex: u32,
        weight: f32,
    },
}

impl PorterError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PorterError::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the stable error code (e.g., "P001").
    pub fn code(&self) -> &'static str {
        match self {
            PorterError::Io { .. } => "P001",
            PorterError::Json(_) => "P002",
            PorterError::InvalidVertex { .. } => "P003",
            PorterError::WeightOutOfRange { .. } => "P004",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = PorterError::InvalidVertex {
            group: "DEF-lip.L".to_string(),
            key: "-1".to_string(),
        };
        assert_eq!(err.code(), "P003");
        assert_eq!(err.to_string(), "group 'DEF-lip.L': invalid vertex index '-1'");

        let io = PorterError::io(
            "pose.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(io.code(), "P001");
        assert!(io.to_string().contains("pose.json"));
    }
}
