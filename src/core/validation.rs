//! Format checks for metadata fields.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9:.+~-]{0,30}[a-zA-Z0-9+~])?$")
        .expect("version pattern is a valid regex")
});

/// Whether `version` is a valid snap version string.
pub fn is_valid_version(version: &str) -> bool {
    VERSION_RE.is_match(version)
}

/// Release quality of a snap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Stable,
    Candidate,
    Beta,
    Devel,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Stable => "stable",
            Grade::Candidate => "candidate",
            Grade::Beta => "beta",
            Grade::Devel => "devel",
        }
    }
}

impl FromStr for Grade {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "stable" => Ok(Grade::Stable),
            "candidate" => Ok(Grade::Candidate),
            "beta" => Ok(Grade::Beta),
            "devel" => Ok(Grade::Devel),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confinement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confinement {
    Strict,
    Devmode,
    Classic,
}

impl Confinement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confinement::Strict => "strict",
            Confinement::Devmode => "devmode",
            Confinement::Classic => "classic",
        }
    }
}

impl FromStr for Confinement {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "strict" => Ok(Confinement::Strict),
            "devmode" => Ok(Confinement::Devmode),
            "classic" => Ok(Confinement::Classic),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Confinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
