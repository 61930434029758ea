//! App command resolution.
//!
//! A command is looked up relative to the prime directory first and then on
//! the runtime `PATH`.

use std::path::{Path, PathBuf};

use crate::meta::errors::MetaError;
use crate::util::fs::{is_executable, relative_path};

/// Where a command's executable was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLocation {
    /// Inside the package, relative to the prime directory
    Package(PathBuf),
    /// Elsewhere on the search path
    SearchPath(PathBuf),
}

/// A validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    /// Executable as written by the user
    pub executable: String,
    /// Everything after the executable, verbatim
    pub arguments: String,
    pub location: CommandLocation,
}

impl ResolvedCommand {
    /// How a launcher script refers to the executable.
    pub fn launcher_path(&self) -> String {
        match &self.location {
            CommandLocation::Package(rel) => format!("$SNAP/{}", rel.display()),
            CommandLocation::SearchPath(_) => self.executable.clone(),
        }
    }

    /// Path inside the package, if the executable is part of it.
    pub fn package_path(&self) -> Option<&Path> {
        match &self.location {
            CommandLocation::Package(rel) => Some(rel),
            CommandLocation::SearchPath(_) => None,
        }
    }
}

/// Split a command line into the executable and the verbatim remainder.
pub fn split_command(raw: &str) -> (&str, &str) {
    let raw = raw.trim();
    match raw.find(char::is_whitespace) {
        Some(at) => (&raw[..at], raw[at..].trim_start()),
        None => (raw, ""),
    }
}

/// Build the search path from runtime environment lines.
///
/// The last `PATH=` assignment wins. `$SNAP` expands to the prime directory
/// and `$PATH` to `host_path`.
pub fn search_path_from_environment(
    environment: &[String],
    prime_dir: &Path,
    host_path: &str,
) -> Vec<PathBuf> {
    let Some(value) = environment.iter().rev().find_map(|line| {
        let line = line.trim();
        let line = line.strip_prefix("export ").unwrap_or(line);
        line.strip_prefix("PATH=")
    }) else {
        return Vec::new();
    };

    let prime = prime_dir.to_string_lossy();
    let expanded = value
        .trim_matches(|c| c == '"' || c == '\'')
        .replace("${SNAP}", &prime)
        .replace("$SNAP", &prime)
        .replace("${PATH}", host_path)
        .replace("$PATH", host_path);

    expanded
        .split(':')
        .filter(|entry| !entry.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Resolves commands against a prime directory and a search path.
#[derive(Debug, Clone)]
pub struct CommandResolver {
    package_root: PathBuf,
    search_path: Vec<PathBuf>,
}

impl CommandResolver {
    pub fn new(package_root: impl Into<PathBuf>, search_path: Vec<PathBuf>) -> Self {
        CommandResolver {
            package_root: package_root.into(),
            search_path,
        }
    }

    /// Resolve the command of `app`.
    pub fn resolve(&self, app: &str, raw: &str) -> Result<ResolvedCommand, MetaError> {
        let (executable, arguments) = split_command(raw);
        let invalid = || MetaError::InvalidCommandFormat {
            app: app.to_string(),
            command: raw.to_string(),
        };
        if executable.is_empty() || executable.starts_with('/') || executable.contains('\'') {
            return Err(invalid());
        }

        let Some(found) = self.find(executable) else {
            if self.candidates(executable).any(|candidate| candidate.exists()) {
                return Err(MetaError::CommandNotExecutable {
                    app: app.to_string(),
                    command: executable.to_string(),
                });
            }
            return Err(MetaError::CommandNotFound {
                app: app.to_string(),
                command: executable.to_string(),
            });
        };

        Ok(ResolvedCommand {
            executable: executable.to_string(),
            arguments: arguments.to_string(),
            location: self.locate(found),
        })
    }

    /// Check one `command-chain` entry of `app`.
    pub fn resolve_chain_entry(&self, app: &str, item: &str) -> Result<PathBuf, MetaError> {
        let invalid = || MetaError::InvalidCommandChainEntry {
            app: app.to_string(),
            item: item.to_string(),
        };
        if item.is_empty()
            || item.starts_with('/')
            || item.contains('\'')
            || item.contains(char::is_whitespace)
        {
            return Err(invalid());
        }

        self.find(item).ok_or_else(invalid)
    }

    /// First candidate that exists and is executable.
    fn find(&self, executable: &str) -> Option<PathBuf> {
        self.candidates(executable)
            .find(|candidate| is_executable(candidate))
    }

    fn candidates<'s>(&'s self, executable: &'s str) -> impl Iterator<Item = PathBuf> + 's {
        std::iter::once(&self.package_root)
            .chain(self.search_path.iter())
            .map(move |dir| dir.join(executable))
    }

    fn locate(&self, found: PathBuf) -> CommandLocation {
        if found.starts_with(&self.package_root) {
            CommandLocation::Package(relative_path(&self.package_root, &found))
        } else {
            CommandLocation::SearchPath(found)
        }
    }
}
