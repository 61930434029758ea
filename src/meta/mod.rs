//! Packaging metadata synthesis.
//!
//! Everything that turns a primed tree plus the project description into
//! `prime/meta/`. The entry point is [`create_packaging`].

pub mod assets;
pub mod assumes;
pub mod command;
pub mod desktop;
pub mod errors;
pub mod notices;
pub mod passthrough;
pub mod reconcile;
pub mod wrapper;
pub mod writer;

use std::path::PathBuf;

use serde_yaml::Mapping;

use crate::core::layout::ProjectLayout;
use crate::core::metadata::ExtractedMetadata;
use crate::core::project::ProjectConfig;
use crate::util::host;

pub use errors::MetaError;
pub use notices::{Notice, NoticeLevel, Notices};
pub use writer::ManifestWriter;

/// A file written outside snap.yaml.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAsset {
    pub path: PathBuf,
    pub executable: bool,
}

impl GeneratedAsset {
    pub fn file(path: PathBuf) -> Self {
        GeneratedAsset {
            path,
            executable: false,
        }
    }

    pub fn executable(path: PathBuf) -> Self {
        GeneratedAsset {
            path,
            executable: true,
        }
    }
}

/// Knobs of one packaging run that do not come from snapcraft.yaml.
#[derive(Debug, Clone)]
pub struct PackagingOptions {
    /// Route apps through the shared runner
    pub use_runner: bool,
    /// Architecture used when none is declared
    pub arch: String,
    /// Runtime environment lines from the build
    pub environment: Vec<String>,
    /// Host `PATH`, substituted for `$PATH` when resolving commands
    pub host_path: String,
}

impl Default for PackagingOptions {
    fn default() -> Self {
        PackagingOptions {
            use_runner: false,
            arch: host::native_arch().to_string(),
            environment: Vec::new(),
            host_path: String::new(),
        }
    }
}

/// Inputs shared by every stage of a run.
#[derive(Debug, Clone, Copy)]
pub struct PackagingContext<'a> {
    pub project: &'a ProjectConfig,
    pub layout: &'a ProjectLayout,
    pub options: &'a PackagingOptions,
}

/// Result of a successful run.
#[derive(Debug)]
pub struct PackagingOutcome {
    /// The document written to snap.yaml
    pub manifest: Mapping,
    pub manifest_path: PathBuf,
    pub assets: Vec<GeneratedAsset>,
    pub notices: Notices,
}

/// Generate `prime/meta/` for `project`.
pub fn create_packaging(
    project: &ProjectConfig,
    layout: &ProjectLayout,
    extracted: &ExtractedMetadata,
    options: &PackagingOptions,
) -> Result<PackagingOutcome, MetaError> {
    let ctx = PackagingContext {
        project,
        layout,
        options,
    };
    ManifestWriter::new(ctx).write(extracted)
}
