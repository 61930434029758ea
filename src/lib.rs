//! snapsmith - snap metadata and packaging synthesis
//!
//! This crate turns a primed build tree and its snapcraft.yaml into
//! `prime/meta/`: the snap.yaml manifest, launcher scripts, hooks and GUI
//! assets.

pub mod core;
pub mod extractors;
pub mod meta;
pub mod ops;
pub mod util;

pub use crate::core::{
    layout::ProjectLayout, metadata::ExtractedMetadata, project::ProjectConfig,
    snap_manifest::SnapManifest,
};

pub use extractors::{ExtractorRegistry, MetadataExtractor};
pub use meta::{create_packaging, MetaError, PackagingOptions, PackagingOutcome};
pub use util::context::GlobalContext;
