//! Domain-specific errors.

use thiserror::Error;

/// Failures raised by [`crate::domain::model::Project`] mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectError {
    #[error("a file already exists at '{0}'")]
    DuplicatePath(String),
    #[error("no file exists at '{0}'")]
    NotFound(String),
    #[error("invalid file path '{0}'")]
    InvalidPath(String),
}

/// Why a parameter value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationReason {
    #[error("value does not match pattern '{pattern}'")]
    PatternMismatch { pattern: String },
    #[error("value is {actual} characters, maximum is {max_length}")]
    TooLong { max_length: usize, actual: usize },
    #[error("required value is missing")]
    MissingRequired,
    #[error("no such parameter is declared")]
    UnknownParameter,
    #[error("declared pattern '{pattern}' is unusable: {detail}")]
    InvalidPattern { pattern: String, detail: String },
}

/// A parameter failed to bind against its declared schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid parameter '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

/// Faults reported by a query engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid path expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },
    #[error("query engine failure: {0}")]
    Engine(String),
}

/// Everything an editor may fail with while editing.
#[derive(Debug, Error)]
pub enum EditError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures looking up, registering, or binding editors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no editor named '{0}' is registered")]
    UnknownEditor(String),
    #[error("an editor named '{0}' is already registered")]
    DuplicateEditor(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failures reading or validating `.atomist/manifest.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    #[error("manifest.yml could not be found in .atomist")]
    Missing,
    #[error("manifest.yml file in .atomist is malformed: {0}")]
    Malformed(String),
    #[error("'{0}' is not a coordinate of the form group:artifact:version")]
    InvalidCoordinate(String),
    #[error("{0} should not be empty, please correct {0} in manifest.yml")]
    Empty(&'static str),
    #[error("'{value}' is not a valid version or version range for {key}")]
    InvalidVersion { key: &'static str, value: String },
}
