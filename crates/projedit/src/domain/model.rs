//! Domain models for projects, files, and edit outcomes.

use serde::{Deserialize, Serialize};

use crate::domain::errors::ProjectError;

/// Snapshot of a single file: a project-relative path and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    path: String,
    content: String,
}

impl File {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Final path segment, e.g. `pom.xml` for `services/api/pom.xml`.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Extension of [`File::name`] without the dot, if any.
    pub fn extension(&self) -> Option<&str> {
        let name = self.name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Directory portion of the path, empty for files at the root.
    pub fn directory(&self) -> &str {
        self.path.rfind('/').map_or("", |idx| &self.path[..idx])
    }
}

/// In-memory file tree handed to an editor.
///
/// Files keep insertion order and paths are unique. Iteration hands out owned
/// snapshots, so a sequence obtained from [`Project::files`] never observes later
/// mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    files: Vec<File>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a project from `(path, content)` pairs, rejecting duplicate paths.
    pub fn from_files<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Result<Self, ProjectError>
    where
        P: Into<String>,
        C: Into<String>,
    {
        let mut project = Self::new();
        for (path, content) in files {
            project.add_file(path, content)?;
        }
        Ok(project)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Fresh snapshot sequence of every file in insertion order.
    pub fn files(&self) -> std::vec::IntoIter<File> {
        self.files.clone().into_iter()
    }

    /// Borrowing view of the files, for read-only consumers like query engines.
    pub fn iter(&self) -> std::slice::Iter<'_, File> {
        self.files.iter()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.position(path).is_some()
    }

    pub fn find_file(&self, path: &str) -> Option<&File> {
        self.files.iter().find(|file| file.path == path)
    }

    /// Append a new file. Fails without touching the project if `path` is taken.
    pub fn add_file(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), ProjectError> {
        let path = validate_path(path.into())?;
        if self.contains(&path) {
            return Err(ProjectError::DuplicatePath(path));
        }
        self.files.push(File::new(path, content));
        Ok(())
    }

    /// Replace the content of an existing file, keeping its position.
    pub fn update_file(&mut self, path: &str, content: impl Into<String>) -> Result<(), ProjectError> {
        let idx = self
            .position(path)
            .ok_or_else(|| ProjectError::NotFound(path.to_owned()))?;
        self.files[idx].content = content.into();
        Ok(())
    }

    /// Remove a file and return its last snapshot.
    pub fn remove_file(&mut self, path: &str) -> Result<File, ProjectError> {
        let idx = self
            .position(path)
            .ok_or_else(|| ProjectError::NotFound(path.to_owned()))?;
        Ok(self.files.remove(idx))
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.files.iter().position(|file| file.path == path)
    }
}

fn validate_path(path: String) -> Result<String, ProjectError> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.ends_with('/')
        || path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        return Err(ProjectError::InvalidPath(path));
    }
    Ok(path)
}

/// Terminal status of an editor invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
}

/// Outcome of an editor invocation: a status and a message for the host to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    status: Status,
    message: String,
}

impl EditResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failure,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
