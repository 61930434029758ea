//! Configuration file support for snapsmith.
//!
//! snapsmith reads two configuration file locations:
//! - Global: `~/.snapsmith/config.toml` - User-wide defaults
//! - Project: `.snapsmith/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// snapsmith configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Packaging settings
    pub meta: MetaConfig,

    /// Build tree locations
    pub paths: PathsConfig,
}

/// When to route app commands through the shared runner script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerPolicy {
    /// Use the runner when the build host matches the target base
    #[default]
    Auto,
    /// Always generate the runner
    Always,
    /// Never generate the runner
    Never,
}

impl RunnerPolicy {
    /// Decide for a concrete host check.
    pub fn enabled(self, host_compatible: impl FnOnce() -> bool) -> bool {
        match self {
            RunnerPolicy::Auto => host_compatible(),
            RunnerPolicy::Always => true,
            RunnerPolicy::Never => false,
        }
    }
}

impl FromStr for RunnerPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(RunnerPolicy::Auto),
            "always" => Ok(RunnerPolicy::Always),
            "never" => Ok(RunnerPolicy::Never),
            other => bail!("unknown runner policy `{}` (expected auto, always or never)", other),
        }
    }
}

impl fmt::Display for RunnerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerPolicy::Auto => write!(f, "auto"),
            RunnerPolicy::Always => write!(f, "always"),
            RunnerPolicy::Never => write!(f, "never"),
        }
    }
}

/// Packaging-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaConfig {
    /// Runner policy (auto, always, never)
    pub runner: Option<RunnerPolicy>,

    /// Architecture written when the project declares none
    pub arch: Option<String>,
}

/// Build tree locations, relative to the project directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub prime: Option<PathBuf>,
    pub stage: Option<PathBuf>,
    pub parts: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.meta.runner.is_some() {
            self.meta.runner = other.meta.runner;
        }
        if other.meta.arch.is_some() {
            self.meta.arch = other.meta.arch;
        }

        if other.paths.prime.is_some() {
            self.paths.prime = other.paths.prime;
        }
        if other.paths.stage.is_some() {
            self.paths.stage = other.paths.stage;
        }
        if other.paths.parts.is_some() {
            self.paths.parts = other.paths.parts;
        }
    }

    /// Effective runner policy.
    pub fn runner(&self) -> RunnerPolicy {
        self.meta.runner.unwrap_or_default()
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.snapsmith/config.toml)
/// 2. Global config (~/.snapsmith/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global snapsmith config directory (~/.snapsmith).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".snapsmith"))
}

/// Get the project config path (.snapsmith/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".snapsmith").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.runner(), RunnerPolicy::Auto);
        assert!(config.meta.arch.is_none());
        assert!(config.paths.prime.is_none());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[meta]
runner = "never"
arch = "arm64"

[paths]
prime = "build/prime"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.runner(), RunnerPolicy::Never);
        assert_eq!(config.meta.arch.as_deref(), Some("arm64"));
        assert_eq!(config.paths.prime, Some(PathBuf::from("build/prime")));
        assert!(config.paths.stage.is_none());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.meta.runner = Some(RunnerPolicy::Always);
        base.meta.arch = Some("amd64".to_string());

        let mut override_cfg = Config::default();
        override_cfg.meta.arch = Some("armhf".to_string());

        base.merge(override_cfg);

        assert_eq!(base.runner(), RunnerPolicy::Always);
        assert_eq!(base.meta.arch.as_deref(), Some("armhf"));
    }

    #[test]
    fn test_load_config_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");
        std::fs::write(&global, "[meta]\nrunner = \"always\"\narch = \"i386\"\n").unwrap();
        std::fs::write(&project, "[meta]\nrunner = \"never\"\n").unwrap();

        let config = load_config(&global, &project);

        assert_eq!(config.runner(), RunnerPolicy::Never);
        assert_eq!(config.meta.arch.as_deref(), Some("i386"));
    }

    #[test]
    fn test_runner_policy_parse() {
        assert_eq!("always".parse::<RunnerPolicy>().unwrap(), RunnerPolicy::Always);
        assert!("sometimes".parse::<RunnerPolicy>().is_err());
        assert!(RunnerPolicy::Auto.enabled(|| true));
        assert!(!RunnerPolicy::Never.enabled(|| true));
    }
}
