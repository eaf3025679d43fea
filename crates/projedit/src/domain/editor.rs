//! The editor contract and its failure boundary.

use crate::domain::errors::EditError;
use crate::domain::model::{EditResult, Project};
use crate::domain::params::{ParameterBundle, ParameterSchema, Parameters};

/// Static description of an editor, registered alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorMetadata {
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl EditorMetadata {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A handler that inspects and mutates a [`Project`].
///
/// Capabilities such as a query engine are passed to the editor's constructor.
/// Errors returned from [`ProjectEditor::edit`] never reach the host directly:
/// [`run_editor`] turns them into a failure result.
pub trait ProjectEditor: Send + Sync {
    type Params: Parameters;

    fn metadata(&self) -> &EditorMetadata;

    fn edit(&self, project: &mut Project, params: Self::Params) -> Result<EditResult, EditError>;
}

/// Invoke `editor` once, converting any error into [`EditResult::failure`].
pub fn run_editor<E>(editor: &E, project: &mut Project, params: E::Params) -> EditResult
where
    E: ProjectEditor + ?Sized,
{
    let name = &editor.metadata().name;
    match editor.edit(project, params) {
        Ok(result) => result,
        Err(err) => {
            tracing::warn!(editor = %name, error = %err, "edit failed");
            EditResult::failure(format!("{name} failed: {err:#}"))
        }
    }
}

/// Object-safe view of a [`ProjectEditor`] operating on untyped bundles.
pub trait DynEditor: Send + Sync {
    fn editor_metadata(&self) -> &EditorMetadata;

    fn parameter_schema(&self) -> ParameterSchema;

    fn edit_bundle(&self, project: &mut Project, bundle: &ParameterBundle) -> EditResult;
}

impl<E: ProjectEditor> DynEditor for E {
    fn editor_metadata(&self) -> &EditorMetadata {
        self.metadata()
    }

    fn parameter_schema(&self) -> ParameterSchema {
        E::Params::schema()
    }

    fn edit_bundle(&self, project: &mut Project, bundle: &ParameterBundle) -> EditResult {
        match E::Params::from_bundle(bundle) {
            Ok(params) => run_editor(self, project, params),
            Err(err) => EditResult::failure(format!("{} failed: {err}", self.metadata().name)),
        }
    }
}
