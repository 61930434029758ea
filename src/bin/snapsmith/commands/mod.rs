//! Command implementations

pub mod completions;
pub mod extract;
pub mod meta;
