//! High-level operations.
//!
//! This module contains the implementation of snapsmith commands.

pub mod snap_meta;

pub use snap_meta::{
    collect_adopted_metadata, default_runtime_environment, extract_metadata, generate_meta,
    project_layout, MetaOptions,
};
