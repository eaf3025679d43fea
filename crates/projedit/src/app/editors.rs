//! Built-in editors.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use crate::domain::editor::{EditorMetadata, ProjectEditor};
use crate::domain::errors::{EditError, ValidationError};
use crate::domain::model::{EditResult, Project};
use crate::domain::params::{
    NoParameters, ParameterBundle, ParameterSchema, ParameterSpec, Parameters,
};
use crate::domain::query::{QueryEngine, QueryExpression};
use crate::infra::git::GitInfo;

/// Path both sample editors generate.
pub const GENERATED_PATH: &str = "src/from/typescript";
/// Content the POM report editor writes to [`GENERATED_PATH`].
pub const GENERATED_CONTENT: &str = "Generated by the POM report editor";
/// Manifest that receives provenance information.
pub const MANIFEST_PATH: &str = ".atomist/manifest.yml";

const POM_QUERY: &str = "/*:file[name='pom.xml']";

/// Parameters of [`PomReportEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaInfo {
    pub package_name: String,
}

impl Parameters for JavaInfo {
    fn schema() -> ParameterSchema {
        ParameterSchema::new().with(
            ParameterSpec::new("packageName")
                .description("The Java package name")
                .display_name("Java Package")
                .pattern(".*")
                .max_length(100),
        )
    }

    fn from_bundle(bundle: &ParameterBundle) -> Result<Self, ValidationError> {
        Ok(Self {
            package_name: bundle.require("packageName")?.to_owned(),
        })
    }
}

/// Reports every `pom.xml` in the project, then adds a generated file.
pub struct PomReportEditor {
    engine: Arc<dyn QueryEngine>,
    metadata: EditorMetadata,
}

impl PomReportEditor {
    pub fn new(engine: Arc<dyn QueryEngine>) -> Self {
        Self {
            engine,
            metadata: EditorMetadata::new(
                "PomReportEditor",
                "Lists Maven POM files and adds a generated source file",
            )
            .tag("java")
            .tag("maven"),
        }
    }
}

impl ProjectEditor for PomReportEditor {
    type Params = JavaInfo;

    fn metadata(&self) -> &EditorMetadata {
        &self.metadata
    }

    fn edit(&self, project: &mut Project, params: JavaInfo) -> Result<EditResult, EditError> {
        let mut report = {
            let found = self
                .engine
                .evaluate(project, &QueryExpression::new(POM_QUERY))?;
            let mut report = format!(
                "param={},filecount={},matchcount={}",
                params.package_name,
                found.root().file_count(),
                found.match_count()
            );
            for file in found.matches() {
                let _ = write!(report, ",Matched file={}", file.path());
            }
            report
        };

        project.add_file(GENERATED_PATH, GENERATED_CONTENT)?;

        let _ = write!(
            report,
            "\n\nEdited Project containing {} files:\n",
            project.file_count()
        );
        for file in project.files() {
            let _ = writeln!(report, "File [{}] containing [{}]", file.path(), file.content());
        }
        Ok(EditResult::success(report))
    }
}

/// Parameters of [`AddContentEditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    pub content: String,
}

impl Parameters for ContentInfo {
    fn schema() -> ParameterSchema {
        ParameterSchema::new().with(
            ParameterSpec::new("content")
                .description("Content")
                .display_name("content")
                .pattern("$ContentPattern")
                .max_length(100),
        )
    }

    fn from_bundle(bundle: &ParameterBundle) -> Result<Self, ValidationError> {
        Ok(Self {
            content: bundle.require("content")?.to_owned(),
        })
    }
}

/// Writes the supplied content to [`GENERATED_PATH`].
pub struct AddContentEditor {
    metadata: EditorMetadata,
}

impl AddContentEditor {
    pub fn new() -> Self {
        Self {
            metadata: EditorMetadata::new("AddContentEditor", "Adds a file with the given content")
                .tag("java")
                .tag("maven"),
        }
    }
}

impl Default for AddContentEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectEditor for AddContentEditor {
    type Params = ContentInfo;

    fn metadata(&self) -> &EditorMetadata {
        &self.metadata
    }

    fn edit(&self, project: &mut Project, params: ContentInfo) -> Result<EditResult, EditError> {
        project.add_file(GENERATED_PATH, params.content)?;
        Ok(EditResult::success(format!(
            "Edited Project now containing {} files",
            project.file_count()
        )))
    }
}

#[derive(Serialize)]
struct ProvenanceRecord<'a> {
    repo: &'a str,
    branch: &'a str,
    sha: &'a str,
}

/// Appends git provenance to the project's manifest, if it has one.
pub struct ProvenanceEditor {
    info: GitInfo,
    metadata: EditorMetadata,
}

impl ProvenanceEditor {
    pub fn new(info: GitInfo) -> Self {
        Self {
            info,
            metadata: EditorMetadata::new(
                "ProvenanceEditor",
                "Records repository, branch, and commit in the manifest",
            )
            .tag("provenance"),
        }
    }
}

impl ProjectEditor for ProvenanceEditor {
    type Params = NoParameters;

    fn metadata(&self) -> &EditorMetadata {
        &self.metadata
    }

    fn edit(&self, project: &mut Project, _params: NoParameters) -> Result<EditResult, EditError> {
        let Some(manifest) = project.find_file(MANIFEST_PATH) else {
            return Ok(EditResult::success(format!(
                "No {MANIFEST_PATH} found; project unchanged"
            )));
        };

        let record = serde_yaml::to_string(&ProvenanceRecord {
            repo: &self.info.repo,
            branch: &self.info.branch,
            sha: &self.info.sha,
        })
        .context("failed to render provenance")?;
        let updated = format!("{}\n---\n{record}", manifest.content());

        project.update_file(MANIFEST_PATH, updated)?;
        Ok(EditResult::success(format!(
            "Recorded {}@{} ({}) in {MANIFEST_PATH}",
            self.info.repo, self.info.branch, self.info.sha
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::query::PathExpressionEngine;
    use crate::domain::editor::run_editor;
    use crate::domain::errors::QueryError;
    use crate::domain::model::Status;
    use crate::domain::query::MatchResult;
    use serde::Deserialize;

    struct BrokenEngine;

    impl QueryEngine for BrokenEngine {
        fn evaluate<'p>(
            &self,
            _project: &'p Project,
            _expression: &QueryExpression,
        ) -> Result<MatchResult<'p>, QueryError> {
            Err(QueryError::Engine("index unavailable".into()))
        }
    }

    fn java_info() -> JavaInfo {
        JavaInfo {
            package_name: "com.example".into(),
        }
    }

    #[test]
    fn pom_report_lists_nested_poms() {
        let editor = PomReportEditor::new(Arc::new(PathExpressionEngine::new()));
        let mut project = Project::from_files([
            ("pom.xml", "<project/>"),
            ("core/pom.xml", "<project/>"),
            ("core/src/Lib.java", "class Lib {}"),
        ])
        .unwrap();

        let result = run_editor(&editor, &mut project, java_info());

        assert!(result.is_success());
        assert!(result.message().starts_with("param=com.example,filecount=3,matchcount=2"));
        assert!(result.message().contains("Matched file=core/pom.xml"));
        assert!(result.message().contains("Edited Project containing 4 files"));
        assert_eq!(project.file_count(), 4);
    }

    #[test]
    fn pom_report_fails_when_generated_path_taken() {
        let editor = PomReportEditor::new(Arc::new(PathExpressionEngine::new()));
        let mut project = Project::from_files([(GENERATED_PATH, "existing")]).unwrap();

        let result = run_editor(&editor, &mut project, java_info());

        assert_eq!(result.status(), Status::Failure);
        assert!(result.message().contains(GENERATED_PATH));
        assert_eq!(project.file_count(), 1);
    }

    #[test]
    fn query_faults_become_failures_without_mutation() {
        let editor = PomReportEditor::new(Arc::new(BrokenEngine));
        let mut project = Project::from_files([("pom.xml", "<project/>")]).unwrap();

        let result = run_editor(&editor, &mut project, java_info());

        assert_eq!(result.status(), Status::Failure);
        assert!(result.message().contains("index unavailable"));
        assert_eq!(project.file_count(), 1);
    }

    #[test]
    fn add_content_reports_new_total() {
        let mut project = Project::from_files([("a", "1"), ("b", "2")]).unwrap();
        let result = run_editor(
            &AddContentEditor::new(),
            &mut project,
            ContentInfo {
                content: "hello".into(),
            },
        );

        assert!(result.is_success());
        assert_eq!(result.message(), "Edited Project now containing 3 files");
        assert_eq!(project.find_file(GENERATED_PATH).unwrap().content(), "hello");
    }

    #[test]
    fn provenance_appends_yaml_document() -> anyhow::Result<()> {
        let info = GitInfo::new("https://github.com/acme/widgets.git", "main", "deadbee");
        let mut project = Project::from_files([(MANIFEST_PATH, "group: acme\nartifact: widgets\n")])?;

        let result = run_editor(&ProvenanceEditor::new(info.clone()), &mut project, NoParameters);
        assert!(result.is_success());

        let manifest = project.find_file(MANIFEST_PATH).unwrap().content().to_owned();
        assert!(manifest.starts_with("group: acme\nartifact: widgets\n\n---\n"));

        let documents: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_str(&manifest)
            .map(serde_yaml::Value::deserialize)
            .collect::<Result<_, _>>()?;
        assert_eq!(documents.len(), 2);
        let recorded: GitInfo = serde_yaml::from_value(documents[1].clone())?;
        assert_eq!(recorded, info);
        Ok(())
    }

    #[test]
    fn provenance_without_manifest_leaves_project_alone() {
        let info = GitInfo::new("git@github.com:acme/widgets.git", "main", "deadbee");
        let mut project = Project::from_files([("README.md", "hi")]).unwrap();
        let before = project.clone();

        let result = run_editor(&ProvenanceEditor::new(info), &mut project, NoParameters);

        assert!(result.is_success());
        assert!(result.message().contains("unchanged"));
        assert_eq!(project, before);
    }
}
