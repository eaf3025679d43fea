//! Editor registration, lookup, and invocation.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::app::editors::{AddContentEditor, PomReportEditor};
use crate::app::query::PathExpressionEngine;
use crate::domain::editor::{DynEditor, EditorMetadata, ProjectEditor};
use crate::domain::errors::RegistryError;
use crate::domain::model::{EditResult, Project};
use crate::domain::params::{ParameterBundle, ParameterSchema, PatternCatalog};
use crate::domain::query::QueryEngine;
use crate::infra::config::Config;

/// Editors known to a host, keyed by their metadata name.
pub struct EditorRegistry {
    editors: BTreeMap<String, Box<dyn DynEditor>>,
    catalog: PatternCatalog,
}

impl EditorRegistry {
    /// Create an empty registry validating against `catalog`.
    pub fn new(catalog: PatternCatalog) -> Self {
        Self {
            editors: BTreeMap::new(),
            catalog,
        }
    }

    /// Registry holding the built-in editors, wired to the default query engine.
    pub fn with_builtins(config: &Config) -> Self {
        let engine: Arc<dyn QueryEngine> = Arc::new(PathExpressionEngine::new());
        let mut registry = Self::new(config.patterns.catalog());
        for editor in [
            Box::new(PomReportEditor::new(engine)) as Box<dyn DynEditor>,
            Box::new(AddContentEditor::new()),
        ] {
            registry.insert(editor);
        }
        registry
    }

    pub fn register<E>(&mut self, editor: E) -> Result<(), RegistryError>
    where
        E: ProjectEditor + 'static,
    {
        let name = editor.metadata().name.clone();
        if self.editors.contains_key(&name) {
            return Err(RegistryError::DuplicateEditor(name));
        }
        self.insert(Box::new(editor));
        Ok(())
    }

    fn insert(&mut self, editor: Box<dyn DynEditor>) {
        let name = editor.editor_metadata().name.clone();
        tracing::debug!(editor = %name, "registered editor");
        self.editors.insert(name, editor);
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    /// Metadata of every editor, ordered by name.
    pub fn list(&self) -> impl Iterator<Item = &EditorMetadata> {
        self.editors.values().map(|editor| editor.editor_metadata())
    }

    pub fn with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a EditorMetadata> + 'a {
        self.list().filter(move |meta| meta.has_tag(tag))
    }

    pub fn schema(&self, name: &str) -> Result<ParameterSchema, RegistryError> {
        Ok(self.lookup(name)?.parameter_schema())
    }

    /// Validate raw host input for the named editor.
    pub fn bind(
        &self,
        name: &str,
        raw: &BTreeMap<String, String>,
    ) -> Result<ParameterBundle, RegistryError> {
        let schema = self.schema(name)?;
        Ok(schema.bind(raw, &self.catalog)?)
    }

    /// Bind `raw` and run the named editor against `project`.
    ///
    /// Lookup and validation errors are returned before the editor runs. Once it
    /// runs, the outcome is always an [`EditResult`].
    pub fn invoke(
        &self,
        name: &str,
        project: &mut Project,
        raw: &BTreeMap<String, String>,
    ) -> Result<EditResult, RegistryError> {
        let bundle = self.bind(name, raw).inspect_err(|err| {
            tracing::warn!(editor = %name, error = %err, "rejected parameters");
        })?;
        self.run(name, project, &bundle)
    }

    /// Run the named editor with an already validated bundle.
    pub fn run(
        &self,
        name: &str,
        project: &mut Project,
        bundle: &ParameterBundle,
    ) -> Result<EditResult, RegistryError> {
        let editor = self.lookup(name)?;
        tracing::info!(editor = %name, files = project.file_count(), "invoking editor");
        let result = editor.edit_bundle(project, bundle);
        tracing::info!(
            editor = %name,
            status = ?result.status(),
            files = project.file_count(),
            "editor finished"
        );
        Ok(result)
    }

    fn lookup(&self, name: &str) -> Result<&dyn DynEditor, RegistryError> {
        self.editors
            .get(name)
            .map(|editor| editor.as_ref())
            .ok_or_else(|| RegistryError::UnknownEditor(name.to_owned()))
    }
}
