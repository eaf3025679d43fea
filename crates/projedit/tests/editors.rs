use std::collections::BTreeMap;
use std::fs;

use insta::assert_snapshot;
use projedit::app::editors::{GENERATED_PATH, MANIFEST_PATH, ProvenanceEditor};
use projedit::app::load::{LoaderConfig, ProjectLoader};
use projedit::app::manifest::read_manifest;
use projedit::app::registry::EditorRegistry;
use projedit::domain::editor::run_editor;
use projedit::domain::errors::{RegistryError, ValidationReason};
use projedit::domain::model::{Project, Status};
use projedit::domain::params::NoParameters;
use projedit::infra::config::Config;
use projedit::infra::git::GitInfo;

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

fn registry() -> EditorRegistry {
    EditorRegistry::with_builtins(&Config::default())
}

#[test]
fn add_content_editor_adds_file_and_reports_count() {
    let mut project =
        Project::from_files([("README.md", "# demo"), ("src/lib.rs", "")]).expect("project");

    let result = registry()
        .invoke("AddContentEditor", &mut project, &params(&[("content", "hello")]))
        .expect("valid parameters");

    assert_eq!(result.status(), Status::Success);
    assert!(result.message().contains('3'));
    assert_eq!(project.file_count(), 3);
    assert_eq!(
        project.find_file(GENERATED_PATH).map(|f| f.content()),
        Some("hello")
    );
}

#[test]
fn pom_report_editor_describes_matches_and_files() {
    let mut project = Project::from_files([("pom.xml", "<project/>")]).expect("project");

    let result = registry()
        .invoke(
            "PomReportEditor",
            &mut project,
            &params(&[("packageName", "com.example")]),
        )
        .expect("valid parameters");

    assert!(result.is_success());
    assert!(result.message().contains("param=com.example"));
    assert!(result.message().contains("filecount=1"));
    assert!(result.message().contains("Matched file=pom.xml"));
    assert_eq!(project.file_count(), 2);
    assert_snapshot!(result.message().trim_end(), @r"
    param=com.example,filecount=1,matchcount=1,Matched file=pom.xml

    Edited Project containing 2 files:
    File [pom.xml] containing [<project/>]
    File [src/from/typescript] containing [Generated by the POM report editor]
    ");
}

#[test]
fn invalid_parameters_never_reach_the_editor() {
    let mut project = Project::from_files([("pom.xml", "<project/>")]).expect("project");
    let long = "a".repeat(101);

    let err = registry()
        .invoke(
            "PomReportEditor",
            &mut project,
            &params(&[("packageName", long.as_str())]),
        )
        .expect_err("value exceeds max length");

    match err {
        RegistryError::Validation(err) => {
            assert_eq!(err.field, "packageName");
            assert!(matches!(err.reason, ValidationReason::TooLong { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(project.file_count(), 1);

    let err = registry()
        .invoke("PomReportEditor", &mut project, &params(&[]))
        .expect_err("missing parameter");
    assert!(matches!(
        err,
        RegistryError::Validation(ref e) if e.reason == ValidationReason::MissingRequired
    ));
}

#[test]
fn pattern_catalog_from_config_drives_validation() {
    let mut config = Config::default();
    config
        .patterns
        .0
        .insert("ContentPattern".into(), "[a-z]+".into());
    let registry = EditorRegistry::with_builtins(&config);
    let mut project = Project::new();

    let err = registry
        .invoke("AddContentEditor", &mut project, &params(&[("content", "Hello!")]))
        .expect_err("pattern mismatch");
    assert!(matches!(
        err,
        RegistryError::Validation(ref e)
            if matches!(e.reason, ValidationReason::PatternMismatch { .. })
    ));
    assert!(project.is_empty());
}

#[test]
fn edits_a_project_loaded_from_disk() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path();
    fs::create_dir_all(root.join("module"))?;
    fs::write(root.join("pom.xml"), "<project/>")?;
    fs::write(root.join("module/pom.xml"), "<project><parent/></project>")?;

    let mut report =
        ProjectLoader::new().load(&LoaderConfig::from_root(root.to_path_buf(), Config::default()))?;

    let result = registry().invoke(
        "PomReportEditor",
        &mut report.project,
        &params(&[("packageName", "org.acme")]),
    )?;

    assert!(result.is_success());
    assert!(result.message().contains("matchcount=2"));
    assert!(result.message().contains("Matched file=module/pom.xml"));
    assert_eq!(report.project.file_count(), 3);
    Ok(())
}

#[test]
fn provenance_reaches_a_manifest_loaded_from_disk() -> anyhow::Result<()> {
    let temp = tempfile::tempdir()?;
    let root = temp.path();
    fs::create_dir_all(root.join(".atomist"))?;
    fs::write(
        root.join(MANIFEST_PATH),
        "group: acme\nartifact: widgets\nversion: 1.0.0\nrequires: \"[1.0,2.0)\"\n",
    )?;
    fs::write(root.join("pom.xml"), "<project/>")?;

    let mut report =
        ProjectLoader::new().load(&LoaderConfig::from_root(root.to_path_buf(), Config::default()))?;
    assert!(report.project.contains(MANIFEST_PATH));

    let info = GitInfo::new("https://github.com/acme/widgets.git", "main", "deadbee");
    let result = run_editor(&ProvenanceEditor::new(info.clone()), &mut report.project, NoParameters);

    assert!(result.is_success());
    assert!(result.message().starts_with("Recorded"));
    let manifest = read_manifest(&report.project)?;
    assert_eq!(manifest.group, "acme");
    assert_eq!(manifest.provenance, Some(info));
    Ok(())
}

#[test]
fn duplicate_generated_path_is_a_failure_result() {
    let mut project = Project::from_files([(GENERATED_PATH, "already here")]).expect("project");

    let result = registry()
        .invoke("AddContentEditor", &mut project, &params(&[("content", "new")]))
        .expect("valid parameters");

    assert_eq!(result.status(), Status::Failure);
    assert_eq!(project.file_count(), 1);
    assert_eq!(
        project.find_file(GENERATED_PATH).map(|f| f.content()),
        Some("already here")
    );
}

#[test]
fn logging_init_is_idempotent() {
    projedit::init();
    projedit::init();
}
