//! Error types for privx-infra.
//!
//! Declarations themselves perform no validation of their inputs; the only
//! failures raised here come from the declaration registry (naming collisions,
//! malformed construct ids) and from template serialization.

use thiserror::Error;

/// Result type alias for privx-infra operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for privx-infra.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// A construct with the same path was already declared in the stack.
    #[error("There is already a construct with path '{path}' in this stack")]
    DuplicateConstruct {
        /// Full construct path
        path: String,
    },

    /// Two different paths mapped onto the same logical id.
    #[error("Logical id '{logical_id}' for '{path}' collides with an existing resource")]
    LogicalIdCollision {
        /// Allocated logical id
        logical_id: String,
        /// Construct path that produced it
        path: String,
    },

    /// Construct id has no alphanumeric characters, contains a path
    /// separator, or the path is hidden entirely by `Default` components.
    #[error("Invalid construct id '{0}': ids need an alphanumeric character and must not contain '/'")]
    InvalidConstructId(String),

    /// An output with the same name was already registered.
    #[error("Output '{0}' is already defined in this stack")]
    DuplicateOutput(String),

    // ========================================================================
    // Synthesis Errors
    // ========================================================================
    /// Resource properties or the template could not be serialized.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// IO error while writing a template.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl Error {
    /// Returns true if this error is a naming collision in the registry.
    pub fn is_collision(&self) -> bool {
        matches!(
            self,
            Error::DuplicateConstruct { .. } | Error::LogicalIdCollision { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_construct_message() {
        let err = Error::DuplicateConstruct {
            path: "PrivX/Db".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "There is already a construct with path 'PrivX/Db' in this stack"
        );
        assert!(err.is_collision());
    }

    #[test]
    fn test_serde_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(!err.is_collision());
    }
}
