//! Query capability consumed by editors.

use std::fmt;

use crate::domain::errors::QueryError;
use crate::domain::model::{File, Project};

/// Opaque query text understood by a [`QueryEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryExpression(String);

impl QueryExpression {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QueryExpression {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Files selected by evaluating an expression against a project.
#[derive(Debug, Clone)]
pub struct MatchResult<'p> {
    root: &'p Project,
    matches: Vec<File>,
}

impl<'p> MatchResult<'p> {
    pub fn new(root: &'p Project, matches: Vec<File>) -> Self {
        Self { root, matches }
    }

    pub fn root(&self) -> &'p Project {
        self.root
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Matched files; each call yields a fresh sequence.
    pub fn matches(&self) -> std::slice::Iter<'_, File> {
        self.matches.iter()
    }
}

/// Evaluates expressions over a project. Implementations must not mutate the
/// project and must be deterministic for a fixed project and expression.
pub trait QueryEngine: Send + Sync {
    fn evaluate<'p>(
        &self,
        project: &'p Project,
        expression: &QueryExpression,
    ) -> Result<MatchResult<'p>, QueryError>;
}
