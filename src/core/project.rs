//! snapcraft.yaml parsing and schema.
//!
//! The project description is the user-authored input of the packaging step.
//! Every key is typed; anything not listed here has to go through
//! `passthrough` to reach snap.yaml.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::util::fs::read_to_string;
use crate::util::OrderedMap;

/// Canonical project file name.
pub const PROJECT_FILE_NAME: &str = "snapcraft.yaml";

/// Hidden alias for the project file at the project root.
pub const PROJECT_FILE_ALIAS: &str = ".snapcraft.yaml";

/// Project file locations, relative to the project directory, in lookup order.
pub const PROJECT_FILE_CANDIDATES: [&str; 4] = [
    "snap/snapcraft.yaml",
    "build-aux/snap/snapcraft.yaml",
    PROJECT_FILE_NAME,
    PROJECT_FILE_ALIAS,
];

/// Errors locating the project file.
#[derive(Debug, Error)]
pub enum ProjectFileError {
    #[error("could not find snapcraft.yaml in {0} (looked in snap/, build-aux/snap/ and the project root)")]
    NotFound(PathBuf),

    #[error("found more than one project file: {}", .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    Ambiguous(Vec<PathBuf>),
}

/// Find the single project file under `project_dir`.
pub fn find_project_file(project_dir: &Path) -> Result<PathBuf, ProjectFileError> {
    let mut found: Vec<PathBuf> = PROJECT_FILE_CANDIDATES
        .iter()
        .map(|rel| project_dir.join(rel))
        .filter(|p| p.is_file())
        .collect();

    match found.len() {
        0 => Err(ProjectFileError::NotFound(project_dir.to_path_buf())),
        1 => Ok(found.remove(0)),
        _ => Err(ProjectFileError::Ambiguous(found)),
    }
}

/// How an app's command is turned into something snapd can run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adapter {
    /// Generate a wrapper script per command
    #[default]
    Legacy,
    /// Keep the command and set up the environment through command-chain
    Full,
}

/// Snap type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapType {
    App,
    Base,
    Gadget,
    Kernel,
    Os,
    Snapd,
}

impl fmt::Display for SnapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SnapType::App => "app",
            SnapType::Base => "base",
            SnapType::Gadget => "gadget",
            SnapType::Kernel => "kernel",
            SnapType::Os => "os",
            SnapType::Snapd => "snapd",
        };
        f.write_str(s)
    }
}

/// A single name or a list of names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

/// An `architectures` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ArchitectureSpec {
    /// `- amd64`
    Name(String),
    /// `- build-on: amd64` with optional `run-on`
    Entry {
        #[serde(rename = "build-on")]
        build_on: OneOrMany,
        #[serde(rename = "run-on", default)]
        run_on: Option<OneOrMany>,
    },
}

impl ArchitectureSpec {
    /// Architectures the built snap runs on.
    pub fn run_on(&self) -> Vec<String> {
        match self {
            ArchitectureSpec::Name(name) => vec![name.clone()],
            ArchitectureSpec::Entry { build_on, run_on } => {
                run_on.as_ref().unwrap_or(build_on).to_vec()
            }
        }
    }
}

/// An entry of `apps`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AppSpec {
    /// Command line, executable first, relative to the prime directory
    #[serde(default)]
    pub command: String,
    pub command_chain: Option<Vec<String>>,
    pub adapter: Option<Adapter>,
    /// Desktop entry, relative to the prime directory
    pub desktop: Option<String>,
    /// Bash completion script, relative to the prime directory
    pub completer: Option<String>,
    pub daemon: Option<String>,
    pub stop_command: Option<String>,
    pub stop_timeout: Option<String>,
    pub stop_mode: Option<String>,
    pub refresh_mode: Option<String>,
    pub restart_condition: Option<String>,
    pub post_stop_command: Option<String>,
    pub reload_command: Option<String>,
    pub before: Option<Vec<String>>,
    pub after: Option<Vec<String>>,
    pub plugs: Option<Vec<String>>,
    pub slots: Option<Vec<String>>,
    pub sockets: Option<Mapping>,
    pub environment: Option<Mapping>,
    pub common_id: Option<String>,
    pub autostart: Option<String>,
    pub timer: Option<String>,
    pub watchdog_timeout: Option<String>,
    pub passthrough: Option<Mapping>,
}

impl AppSpec {
    pub fn adapter(&self) -> Adapter {
        self.adapter.unwrap_or_default()
    }

    pub fn command_chain(&self) -> &[String] {
        self.command_chain.as_deref().unwrap_or_default()
    }

    /// YAML keys set on this app, `passthrough` excluded.
    pub fn declared_keys(&self) -> BTreeSet<&'static str> {
        let mut keys = BTreeSet::new();
        if !self.command.is_empty() {
            keys.insert("command");
        }
        let optional = [
            ("command-chain", self.command_chain.is_some()),
            ("adapter", self.adapter.is_some()),
            ("desktop", self.desktop.is_some()),
            ("completer", self.completer.is_some()),
            ("daemon", self.daemon.is_some()),
            ("stop-command", self.stop_command.is_some()),
            ("stop-timeout", self.stop_timeout.is_some()),
            ("stop-mode", self.stop_mode.is_some()),
            ("refresh-mode", self.refresh_mode.is_some()),
            ("restart-condition", self.restart_condition.is_some()),
            ("post-stop-command", self.post_stop_command.is_some()),
            ("reload-command", self.reload_command.is_some()),
            ("before", self.before.is_some()),
            ("after", self.after.is_some()),
            ("plugs", self.plugs.is_some()),
            ("slots", self.slots.is_some()),
            ("sockets", self.sockets.is_some()),
            ("environment", self.environment.is_some()),
            ("common-id", self.common_id.is_some()),
            ("autostart", self.autostart.is_some()),
            ("timer", self.timer.is_some()),
            ("watchdog-timeout", self.watchdog_timeout.is_some()),
        ];
        keys.extend(optional.into_iter().filter(|(_, set)| *set).map(|(k, _)| k));
        keys
    }
}

/// An entry of `hooks`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct HookSpec {
    pub plugs: Option<Vec<String>>,
    pub passthrough: Option<Mapping>,
}

impl HookSpec {
    pub fn declared_keys(&self) -> BTreeSet<&'static str> {
        let mut keys = BTreeSet::new();
        if self.plugs.is_some() {
            keys.insert("plugs");
        }
        keys
    }
}

/// An entry of `parts`.
///
/// Only the keys packaging looks at are typed; the rest belongs to the build
/// lifecycle and is kept as-is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartSpec {
    pub plugin: Option<String>,
    pub source: Option<String>,
    /// Metadata files, relative to the prime directory
    #[serde(default)]
    pub parse_info: Vec<String>,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

/// The parsed snapcraft.yaml.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ProjectConfig {
    pub name: String,
    pub version: Option<String>,
    /// Shell snippet printing the version on stdout
    pub version_script: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub license: Option<String>,
    /// Icon file, relative to the project directory
    pub icon: Option<String>,
    #[serde(rename = "type")]
    pub snap_type: Option<SnapType>,
    pub base: Option<String>,
    pub build_base: Option<String>,
    pub epoch: Option<Value>,
    pub architectures: Option<Vec<ArchitectureSpec>>,
    pub grade: Option<String>,
    pub confinement: Option<String>,
    pub environment: Option<Mapping>,
    pub layout: Option<Mapping>,
    #[serde(default)]
    pub apps: OrderedMap<AppSpec>,
    #[serde(default)]
    pub hooks: OrderedMap<HookSpec>,
    pub plugs: Option<Mapping>,
    pub slots: Option<Mapping>,
    pub assumes: Option<Vec<String>>,
    pub adopt_info: Option<String>,
    pub passthrough: Option<Mapping>,
    #[serde(default)]
    pub parts: OrderedMap<PartSpec>,
}

impl ProjectConfig {
    /// Load the project description from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_to_string(path)?;

        Self::parse(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse project description content.
    pub fn parse(content: &str) -> Result<Self> {
        let config: ProjectConfig = serde_yaml::from_str(content)?;
        if config.name.trim().is_empty() {
            anyhow::bail!("`name` must not be empty");
        }
        Ok(config)
    }

    pub fn assumes(&self) -> &[String] {
        self.assumes.as_deref().unwrap_or_default()
    }

    /// Architectures the snap runs on, in declaration order without duplicates.
    pub fn run_on_architectures(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for spec in self.architectures.iter().flatten() {
            for arch in spec.run_on() {
                if !out.contains(&arch) {
                    out.push(arch);
                }
            }
        }
        out
    }

    /// The part metadata is adopted from, if it exists.
    pub fn adopted_part(&self) -> Option<(&str, &PartSpec)> {
        let name = self.adopt_info.as_deref()?;
        self.parts.get(name).map(|part| (name, part))
    }

    /// Top-level YAML keys set in the file, `passthrough` excluded.
    pub fn declared_keys(&self) -> BTreeSet<&'static str> {
        let mut keys = BTreeSet::new();
        keys.insert("name");
        let optional = [
            ("version", self.version.is_some() || self.version_script.is_some()),
            ("summary", self.summary.is_some()),
            ("description", self.description.is_some()),
            ("title", self.title.is_some()),
            ("license", self.license.is_some()),
            ("icon", self.icon.is_some()),
            ("type", self.snap_type.is_some()),
            ("base", self.base.is_some()),
            ("build-base", self.build_base.is_some()),
            ("epoch", self.epoch.is_some()),
            ("architectures", self.architectures.is_some()),
            ("grade", self.grade.is_some()),
            ("confinement", self.confinement.is_some()),
            ("environment", self.environment.is_some()),
            ("layout", self.layout.is_some()),
            ("apps", !self.apps.is_empty()),
            ("hooks", !self.hooks.is_empty()),
            ("plugs", self.plugs.is_some()),
            ("slots", self.slots.is_some()),
            ("assumes", self.assumes.is_some()),
            ("adopt-info", self.adopt_info.is_some()),
            ("parts", !self.parts.is_empty()),
        ];
        keys.extend(optional.into_iter().filter(|(_, set)| *set).map(|(k, _)| k));
        keys
    }
}
