//! Reading and validating `.atomist/manifest.yml`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::app::editors::MANIFEST_PATH;
use crate::domain::errors::ManifestError;
use crate::domain::model::Project;
use crate::infra::git::GitInfo;

static VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s,\[\]()]+$").expect("version regex is valid"));

static RANGES: Lazy<Regex> = Lazy::new(|| {
    let bound = r"[^\s,\[\]()]*";
    let range = format!(r"(?:\[\s*{bound}\s*\]|[\[(]\s*{bound}\s*,\s*{bound}\s*[\])])");
    Regex::new(&format!(r"^{range}(?:\s*,\s*{range})*$")).expect("range regex is valid")
});

/// A `group:artifact:version` coordinate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Gav {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl FromStr for Gav {
    type Err = ManifestError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = raw.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [group, artifact, version]
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                Ok(Self {
                    group: (*group).to_owned(),
                    artifact: (*artifact).to_owned(),
                    version: (*version).to_owned(),
                })
            }
            _ => Err(ManifestError::InvalidCoordinate(raw.to_owned())),
        }
    }
}

impl fmt::Display for Gav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// An artifact repository declared under `repositories`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: String,
    pub url: Option<String>,
}

/// Operation names excluded from the archive, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Excludes {
    pub editors: Vec<String>,
    pub generators: Vec<String>,
    pub reviewers: Vec<String>,
    pub command_handlers: Vec<String>,
    pub event_handlers: Vec<String>,
    pub response_handlers: Vec<String>,
}

impl Excludes {
    fn extend(&mut self, other: Excludes) {
        self.editors.extend(other.editors);
        self.generators.extend(other.generators);
        self.reviewers.extend(other.reviewers);
        self.command_handlers.extend(other.command_handlers);
        self.event_handlers.extend(other.event_handlers);
        self.response_handlers.extend(other.response_handlers);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Archive description assembled from every document of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub group: String,
    pub artifact: String,
    pub version: Option<String>,
    /// Version constraint on the runtime, with spaces removed.
    pub requires: Option<String>,
    pub dependencies: Vec<Gav>,
    pub extensions: Vec<Gav>,
    pub repositories: Vec<Repository>,
    pub excludes: Excludes,
    pub provenance: Option<GitInfo>,
}

impl Manifest {
    /// The archive's own coordinate, once a version is known.
    pub fn coordinate(&self) -> Option<Gav> {
        self.version.as_ref().map(|version| Gav {
            group: self.group.clone(),
            artifact: self.artifact.clone(),
            version: version.clone(),
        })
    }

    fn apply(&mut self, doc: RawDocument) -> Result<(), ManifestError> {
        if let Some(group) = doc.group {
            self.group = group.into_string();
        }
        if let Some(artifact) = doc.artifact {
            self.artifact = artifact.into_string();
        }
        if let Some(version) = doc.version {
            self.version = Some(version.into_string());
        }
        if let Some(requires) = doc.requires {
            self.requires = Some(requires.into_string().replace(' ', ""));
        }
        for entry in doc.dependencies.unwrap_or_default() {
            self.dependencies.extend(entry.into_gavs()?);
        }
        for entry in doc.extensions.unwrap_or_default() {
            self.extensions.extend(entry.into_gavs()?);
        }
        for (id, repo) in doc.repositories.unwrap_or_default() {
            self.repositories.push(Repository {
                id,
                url: repo.and_then(|repo| repo.url),
            });
        }
        if let Some(excludes) = doc.excludes {
            self.excludes.extend(excludes);
        }
        if let (Some(repo), Some(branch), Some(sha)) = (doc.repo, doc.branch, doc.sha) {
            self.provenance = Some(GitInfo::new(
                repo.into_string(),
                branch.into_string(),
                sha.into_string(),
            ));
        }
        Ok(())
    }
}

// YAML reads `version: 1.0` as a number; keep the text either way.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_yaml::Number),
    Flag(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
            Self::Flag(flag) => flag.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CoordinateEntry {
    Plain(String),
    Pinned(BTreeMap<String, Scalar>),
}

impl CoordinateEntry {
    fn into_gavs(self) -> Result<Vec<Gav>, ManifestError> {
        match self {
            Self::Plain(raw) => Ok(vec![raw.parse()?]),
            Self::Pinned(entries) => entries
                .into_iter()
                .map(|(key, version)| format!("{key}:{}", version.into_string()).parse())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDocument {
    group: Option<Scalar>,
    artifact: Option<Scalar>,
    version: Option<Scalar>,
    requires: Option<Scalar>,
    dependencies: Option<Vec<CoordinateEntry>>,
    extensions: Option<Vec<CoordinateEntry>>,
    repositories: Option<BTreeMap<String, Option<RawRepository>>>,
    excludes: Option<Excludes>,
    repo: Option<Scalar>,
    branch: Option<Scalar>,
    sha: Option<Scalar>,
}

/// Parse every YAML document of `content` into one [`Manifest`].
///
/// Later documents override scalar keys and append to lists, so provenance
/// records appended after the main document are picked up. The result is not
/// validated; see [`validate_manifest`].
pub fn parse_manifest(content: &str) -> Result<Manifest, ManifestError> {
    let mut manifest = Manifest::default();
    for document in serde_yaml::Deserializer::from_str(content) {
        let doc = Option::<RawDocument>::deserialize(document)
            .map_err(|err| ManifestError::Malformed(err.to_string()))?;
        if let Some(doc) = doc {
            manifest.apply(doc)?;
        }
    }
    Ok(manifest)
}

/// Read and validate the manifest of `project`.
pub fn read_manifest(project: &Project) -> Result<Manifest, ManifestError> {
    let file = project
        .find_file(MANIFEST_PATH)
        .ok_or(ManifestError::Missing)?;
    let manifest = parse_manifest(file.content())?;
    validate_manifest(&manifest)?;
    tracing::debug!(
        group = %manifest.group,
        artifact = %manifest.artifact,
        dependencies = manifest.dependencies.len(),
        "read manifest"
    );
    Ok(manifest)
}

/// Check the identifying fields of a manifest.
pub fn validate_manifest(manifest: &Manifest) -> Result<(), ManifestError> {
    if manifest.group.trim().is_empty() {
        return Err(ManifestError::Empty("group"));
    }
    if manifest.artifact.trim().is_empty() {
        return Err(ManifestError::Empty("artifact"));
    }
    validate_version(manifest.version.as_deref(), "version")?;
    validate_version(manifest.requires.as_deref(), "requires")
}

fn validate_version(value: Option<&str>, key: &'static str) -> Result<(), ManifestError> {
    let value = value.ok_or(ManifestError::Empty(key))?;
    let trimmed = value.trim();
    if VERSION.is_match(trimmed) || RANGES.is_match(trimmed) {
        Ok(())
    } else {
        Err(ManifestError::InvalidVersion {
            key,
            value: value.to_owned(),
        })
    }
}
