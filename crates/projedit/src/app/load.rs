//! Loading projects from directories on disk.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder, WalkState};

use crate::domain::model::Project;
use crate::infra::config::Config;

const PROJEDIT_IGNORE: &str = ".projeditignore";

/// Hidden directories loaded even when hidden files are excluded.
const ALWAYS_LOADED: &[&str] = &[".atomist"];

/// Reason a file was left out of the loaded project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    LargeFile,
    BinaryFile,
    /// Metadata or contents could not be read.
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: String,
    pub reason: SkipReason,
}

/// A loaded project plus the files that could not be represented as text.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub project: Project,
    pub skipped: Vec<SkippedFile>,
    pub root: PathBuf,
}

/// Configuration inputs for the loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub root: PathBuf,
    pub max_file_size: u64,
    pub config: Config,
}

impl LoaderConfig {
    pub fn from_root(root: PathBuf, config: Config) -> Self {
        Self {
            root,
            max_file_size: config.defaults.max_file_size(),
            config,
        }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }
}

enum Loaded {
    Text { path: String, content: String },
    Skipped(SkippedFile),
}

/// Walks a directory respecting ignore rules and reads text files into a [`Project`].
#[derive(Debug, Default)]
pub struct ProjectLoader;

impl ProjectLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(&self, cfg: &LoaderConfig) -> Result<LoadReport> {
        let matcher = Arc::new(build_ignore_matcher(&cfg.root, cfg)?);
        let mut builder = WalkBuilder::new(&cfg.root);
        builder.git_ignore(true).hidden(false);

        let root = cfg.root.clone();
        let show_hidden = cfg.config.defaults.show_hidden();
        builder.filter_entry({
            let matcher = matcher.clone();
            move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                if !show_hidden && is_hidden(rel) {
                    return false;
                }
                !matcher.should_skip(rel)
            }
        });

        let loaded = Mutex::new(Vec::new());
        let cfg_ref = Arc::new(cfg.clone());

        builder.build_parallel().run(|| {
            let loaded = &loaded;
            let cfg = cfg_ref.clone();
            Box::new(move |result| match result {
                Ok(entry) => {
                    let Some(item) = process_entry(&entry, &cfg) else {
                        return WalkState::Continue;
                    };
                    match loaded.lock() {
                        Ok(mut guard) => {
                            guard.push(item);
                            WalkState::Continue
                        }
                        Err(_) => {
                            tracing::error!("loader state poisoned; stopping walk");
                            WalkState::Quit
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "loader error");
                    WalkState::Continue
                }
            })
        });

        let mut texts = Vec::new();
        let mut skipped = Vec::new();
        let loaded = loaded
            .into_inner()
            .map_err(|_| anyhow!("loader state poisoned while walking {}", cfg.root.display()))?;
        for item in loaded {
            match item {
                Loaded::Text { path, content } => texts.push((path, content)),
                Loaded::Skipped(skip) => {
                    tracing::debug!(path = %skip.path, reason = ?skip.reason, "skipped file");
                    skipped.push(skip);
                }
            }
        }
        texts.sort_by(|a, b| a.0.cmp(&b.0));
        skipped.sort_by(|a, b| a.path.cmp(&b.path));

        let project = Project::from_files(texts)
            .with_context(|| format!("failed to load project from {}", cfg.root.display()))?;
        tracing::info!(
            root = %cfg.root.display(),
            files = project.file_count(),
            skipped = skipped.len(),
            "loaded project"
        );

        Ok(LoadReport {
            project,
            skipped,
            root: cfg.root.clone(),
        })
    }
}

fn process_entry(entry: &DirEntry, cfg: &LoaderConfig) -> Option<Loaded> {
    if entry.file_type().is_some_and(|kind| kind.is_dir()) {
        return None;
    }
    let metadata = match entry.metadata() {
        Ok(metadata) => metadata,
        Err(err) => return Some(unreadable(&cfg.root, entry.path(), &err)),
    };
    if !metadata.is_file() {
        return None;
    }
    Some(
        read_file(&cfg.root, entry.path(), metadata.len(), cfg.max_file_size)
            .unwrap_or_else(|err| unreadable(&cfg.root, entry.path(), &err)),
    )
}

fn read_file(root: &Path, path: &Path, len: u64, max_file_size: u64) -> std::io::Result<Loaded> {
    let rel = to_project_path(root, path);
    if len > max_file_size {
        return Ok(Loaded::Skipped(SkippedFile {
            path: rel,
            reason: SkipReason::LargeFile,
        }));
    }

    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(content) if !content.contains('\0') => Loaded::Text { path: rel, content },
        _ => Loaded::Skipped(SkippedFile {
            path: rel,
            reason: SkipReason::BinaryFile,
        }),
    })
}

fn unreadable(root: &Path, path: &Path, err: &dyn std::fmt::Display) -> Loaded {
    tracing::warn!(path = %path.display(), error = %err, "unreadable file");
    Loaded::Skipped(SkippedFile {
        path: to_project_path(root, path),
        reason: SkipReason::Unreadable,
    })
}

fn is_hidden(rel: &Path) -> bool {
    let mut components = rel.components().map(|c| c.as_os_str().to_string_lossy());
    let Some(first) = components.next() else {
        return false;
    };
    if ALWAYS_LOADED.contains(&first.as_ref()) {
        return false;
    }
    std::iter::once(first)
        .chain(components)
        .any(|name| name.starts_with('.'))
}

fn to_project_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone)]
struct IgnoreMatcher {
    globs: Option<GlobSet>,
}

impl IgnoreMatcher {
    fn should_skip(&self, rel: &Path) -> bool {
        self.globs.as_ref().is_some_and(|set| set.is_match(rel))
    }
}

fn build_ignore_matcher(root: &Path, cfg: &LoaderConfig) -> Result<IgnoreMatcher> {
    let mut builder = GlobSetBuilder::new();

    for pattern in &cfg.config.ignore.paths {
        for expanded in expand_dir_pattern(pattern) {
            let glob = Glob::new(&expanded).context("invalid ignore path pattern")?;
            builder.add(glob);
        }
    }

    for glob in &cfg.config.ignore.globs {
        let glob = Glob::new(glob).context("invalid ignore glob")?;
        builder.add(glob);
    }

    for pattern in load_projeditignore(root)? {
        for expanded in expand_dir_pattern(&pattern) {
            let glob = Glob::new(&expanded).context("invalid .projeditignore pattern")?;
            builder.add(glob);
        }
    }

    builder.add(Glob::new(PROJEDIT_IGNORE)?);

    let globs = builder.build().context("failed to build ignore matcher")?;

    Ok(IgnoreMatcher { globs: Some(globs) })
}

fn expand_dir_pattern(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    vec![
        trimmed.to_owned(),
        format!("{trimmed}/**"),
        format!("**/{trimmed}"),
        format!("**/{trimmed}/**"),
    ]
}

fn load_projeditignore(root: &Path) -> Result<Vec<String>> {
    let path = root.join(PROJEDIT_IGNORE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut patterns = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        patterns.push(trimmed.to_owned());
    }
    Ok(patterns)
}
