//! Global context for snapsmith operations.
//!
//! Provides centralized access to configuration, paths, and environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::project::{find_project_file, ProjectFileError};
use crate::util::config::{global_config_dir, load_config, project_config_path, Config};

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global snapsmith data (~/.snapsmith/)
    home: PathBuf,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let home = global_config_dir().unwrap_or_else(|| PathBuf::from(".snapsmith"));

        Ok(GlobalContext {
            cwd,
            home,
        })
    }

    /// Create a GlobalContext rooted at a specific directory.
    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd.into();
        Ok(ctx)
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Path of the user-wide config file.
    pub fn global_config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Path of the project config file.
    pub fn project_config_path(&self) -> PathBuf {
        project_config_path(&self.cwd)
    }

    /// Load the merged tool configuration.
    pub fn config(&self) -> Config {
        load_config(&self.global_config_path(), &self.project_config_path())
    }

    /// Locate the project description from the current directory.
    pub fn find_project_file(&self) -> Result<PathBuf, ProjectFileError> {
        find_project_file(&self.cwd)
    }

    /// Resolve a possibly relative path against the current directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}
