//! Custom error types for the threat-model analysis engine.
//!
//! Structural problems in the model document are fatal and abort the run.
//! Rule failures and soft data issues never surface here; they are logged
//! where they happen and the batch continues.

use std::path::PathBuf;

/// The main error type for threatlens operations.
#[derive(Debug, thiserror::Error)]
pub enum ThreatError {
    /// I/O error while reading a model or writing a report
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    /// Document could not be decoded into the recognized input shape
    #[error("Malformed model document: {0}")]
    Document(#[from] serde_json::Error),

    /// Identifier contains characters outside `[A-Za-z0-9-]`
    #[error("Invalid ID syntax used in {context} (only letters, digits and '-' allowed): '{id}'")]
    InvalidId { context: String, id: String },

    /// Two entities of the same kind resolve to the same ID
    #[error("Duplicate {kind} ID used: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// A reference to an entity that does not exist
    #[error("Missing referenced {kind} in {context}: {id}")]
    MissingReference {
        kind: &'static str,
        context: String,
        id: String,
    },

    /// A technical asset claimed by two trust boundaries
    #[error("Technical asset {asset} is defined inside multiple trust boundaries ('{first}' and '{second}')")]
    AssetInMultipleBoundaries {
        asset: String,
        first: String,
        second: String,
    },

    /// A trust boundary nested inside two parents
    #[error("Trust boundary {boundary} is nested inside multiple trust boundaries ('{first}' and '{second}')")]
    BoundaryNestedTwice {
        boundary: String,
        first: String,
        second: String,
    },

    /// Direct or transitive self-nesting of trust boundaries
    #[error("Cyclic trust boundary nesting detected at {boundary}: {}", path.join(" -> "))]
    NestingCycle { boundary: String, path: Vec<String> },

    /// A present but unrecognized value for an enumerated field
    #[error("Unknown {field} value in {context}: '{value}'")]
    InvalidValue {
        context: String,
        field: &'static str,
        value: String,
    },

    /// An exact risk-tracking entry that matches no generated risk
    #[error("Risk tracking references unknown risk (risk id not found): {synthetic_id}")]
    OrphanedRiskTracking { synthetic_id: String },

    /// A wildcard risk-tracking entry that could not be compiled
    #[error("Invalid risk tracking pattern '{pattern}': {source}")]
    InvalidTrackingPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A risk rule reported a failure while generating risks
    #[error("Risk rule '{category}' failed: {message}")]
    RuleFailed { category: String, message: String },
}

/// Result type alias using ThreatError
pub type ThreatResult<T> = Result<T, ThreatError>;

impl ThreatError {
    /// Create an I/O error with path context
    pub fn io(source: std::io::Error, path: impl Into<Option<PathBuf>>) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a dangling-reference error
    pub fn missing(kind: &'static str, context: impl Into<String>, id: impl Into<String>) -> Self {
        Self::MissingReference {
            kind,
            context: context.into(),
            id: id.into(),
        }
    }

    /// Create an unknown-enumeration-value error
    pub fn invalid_value(
        context: impl Into<String>,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            context: context.into(),
            field,
            value: value.into(),
        }
    }

    /// Create a rule failure with the failing category
    pub fn rule(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RuleFailed {
            category: category.into(),
            message: message.into(),
        }
    }
}

/// Convert from raw I/O errors (without path context)
impl From<std::io::Error> for ThreatError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display() {
        let err = ThreatError::io(
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            Some(PathBuf::from("/models/shop.json")),
        );
        assert!(err.to_string().contains("/models/shop.json"));
    }

    #[test]
    fn test_multiple_boundaries_names_both() {
        let err = ThreatError::AssetInMultipleBoundaries {
            asset: "web".to_string(),
            first: "dmz".to_string(),
            second: "intranet".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'dmz'"));
        assert!(msg.contains("'intranet'"));
    }

    #[test]
    fn test_cycle_shows_path() {
        let err = ThreatError::NestingCycle {
            boundary: "a".to_string(),
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_missing_reference_helper() {
        let err = ThreatError::missing("data asset", "technical asset 'web'", "orders");
        assert!(matches!(err, ThreatError::MissingReference { kind: "data asset", .. }));
        assert!(err.to_string().contains("orders"));
    }
}
