//! Configuration management utilities.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::params::PatternCatalog;

static DEFAULT_CONFIG: &str = include_str!("../../assets/default-config.toml");
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".projedit/config.toml";

static BUILTIN_PATTERNS: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    #[derive(Deserialize)]
    struct PatternsOnly {
        #[serde(default)]
        patterns: BTreeMap<String, String>,
    }
    toml::from_str::<PatternsOnly>(DEFAULT_CONFIG)
        .map(|parsed| parsed.patterns)
        .unwrap_or_default()
});

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub ignore: Ignore,
    #[serde(default)]
    pub patterns: Patterns,
}

/// Scalar settings. A layer only overrides the keys it sets explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_hidden: Option<bool>,
}

impl Defaults {
    pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(Self::MAX_FILE_SIZE)
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ignore {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub globs: Vec<String>,
}

impl Default for Ignore {
    fn default() -> Self {
        Self {
            paths: vec!["target/".into(), "node_modules/".into(), ".git/".into()],
            globs: vec!["*.lock".into()],
        }
    }
}

/// Named validation patterns set by a layer, keyed by the name used after `$`.
///
/// Only explicit entries are stored; [`Patterns::catalog`] lays them over the
/// built-in set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patterns(pub BTreeMap<String, String>);

impl Patterns {
    pub fn catalog(&self) -> PatternCatalog {
        let mut patterns = BUILTIN_PATTERNS.clone();
        patterns.extend(self.0.clone());
        PatternCatalog::new(patterns)
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    max_file_size: Option<u64>,
    show_hidden: Option<bool>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            max_file_size: env::var("PROJEDIT_MAX_FILE_SIZE")
                .ok()
                .and_then(|raw| parse_env("PROJEDIT_MAX_FILE_SIZE", &raw)),
            show_hidden: env::var("PROJEDIT_SHOW_HIDDEN")
                .ok()
                .and_then(|raw| parse_env("PROJEDIT_SHOW_HIDDEN", &raw)),
        }
    }

    #[cfg(test)]
    fn for_tests(max_file_size: u64, show_hidden: bool) -> Self {
        Self {
            max_file_size: Some(max_file_size),
            show_hidden: Some(show_hidden),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = raw, "ignoring unparsable override");
            None
        }
    }
}

impl Config {
    /// Load configuration for the current directory's workspace.
    pub fn load() -> Result<Self> {
        let cwd = env::current_dir()?;
        Self::load_for(&cwd)
    }

    /// Load configuration from defaults, user/global config, the workspace containing
    /// `start`, and env overrides.
    pub fn load_for(start: &Path) -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = Some(workspace_config_path(start));
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            ignore: merge_ignore(self.ignore, other.ignore),
            patterns: merge_patterns(self.patterns, other.patterns),
        }
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        max_file_size: overlay.max_file_size.or(base.max_file_size),
        show_hidden: overlay.show_hidden.or(base.show_hidden),
    }
}

fn merge_ignore(base: Ignore, overlay: Ignore) -> Ignore {
    let mut paths: BTreeSet<String> = base.paths.into_iter().collect();
    paths.extend(overlay.paths);

    let mut globs: BTreeSet<String> = base.globs.into_iter().collect();
    globs.extend(overlay.globs);

    Ignore {
        paths: paths.into_iter().collect(),
        globs: globs.into_iter().collect(),
    }
}

fn merge_patterns(mut base: Patterns, overlay: Patterns) -> Patterns {
    base.0.extend(overlay.0);
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("projedit/config.toml"))
}

fn workspace_config_path(start: &Path) -> PathBuf {
    let root = find_repo_root(start).unwrap_or_else(|| start.to_path_buf());
    root.join(DEFAULT_WORKSPACE_CONFIG_PATH)
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(max_file_size) = env.max_file_size {
        config.defaults.max_file_size = Some(max_file_size);
    }
    if let Some(show_hidden) = env.show_hidden {
        config.defaults.show_hidden = Some(show_hidden);
    }
    config
}
