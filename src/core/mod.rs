//! Core data structures for snapsmith.
//!
//! This module contains the foundational types used throughout snapsmith:
//! - The parsed project description (snapcraft.yaml)
//! - Extracted metadata bags
//! - The generated manifest (snap.yaml)
//! - Project layout and field validation

pub mod layout;
pub mod metadata;
pub mod project;
pub mod snap_manifest;
pub mod validation;

pub use layout::{ProjectLayout, RUNNER_PATH};
pub use metadata::ExtractedMetadata;
pub use project::{
    find_project_file, Adapter, AppSpec, ArchitectureSpec, HookSpec, PartSpec, ProjectConfig,
    ProjectFileError, SnapType, PROJECT_FILE_ALIAS, PROJECT_FILE_NAME,
};
pub use snap_manifest::{AppEntry, HookEntry, SnapManifest};
