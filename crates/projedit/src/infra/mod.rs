//! Infrastructure adapters for configuration and git.

pub mod config;
pub mod git;
