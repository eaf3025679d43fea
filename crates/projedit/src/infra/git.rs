//! Git integration utilities.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

const SHORT_SHA_LEN: usize = 7;

/// Lightweight wrapper around [`gix::Repository`] discovery for provenance extraction.
#[derive(Default)]
pub struct GitClient {
    repo: Option<gix::Repository>,
}

impl GitClient {
    /// Attempt to locate a git repository starting from `path`.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let repo = gix::discover(path).ok();
        Ok(Self { repo })
    }

    /// Origin url, current branch, and abbreviated head commit, when all are known.
    pub fn info(&self) -> Option<GitInfo> {
        let repo = self.repo.as_ref()?;

        let branch = repo.head_name().ok().flatten()?.shorten().to_string();

        let sha = repo.head_id().ok()?.detach().to_string();
        let sha = sha.get(..SHORT_SHA_LEN).unwrap_or(&sha).to_owned();

        let remote = repo.find_remote("origin").ok()?;
        let repo_url = remote
            .url(gix::remote::Direction::Fetch)?
            .to_bstring()
            .to_string();

        Some(GitInfo {
            repo: repo_url,
            branch,
            sha,
        })
    }
}

/// Where a project came from, recorded into its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitInfo {
    pub repo: String,
    pub branch: String,
    pub sha: String,
}

impl GitInfo {
    pub fn new(repo: impl Into<String>, branch: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            branch: branch.into(),
            sha: sha.into(),
        }
    }

    /// Convenience helper to retrieve provenance directly from a path.
    pub fn discover(path: &Path) -> Option<Self> {
        GitClient::discover(path)
            .ok()
            .and_then(|client| client.info())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_a_repository_yields_none() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let client = GitClient {
            repo: gix::open(temp.path()).ok(),
        };
        assert!(client.info().is_none());
        Ok(())
    }
}
