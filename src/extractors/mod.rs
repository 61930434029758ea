//! Metadata extraction from built files.
//!
//! Parts list files under `parse-info`; each one is handed to the first
//! extractor that understands it.

pub mod desktop;
pub mod yaml;

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::core::metadata::ExtractedMetadata;

pub use desktop::DesktopExtractor;
pub use yaml::YamlExtractor;

/// Errors from metadata extraction.
#[derive(Debug, Error, Diagnostic)]
pub enum ExtractError {
    #[error("no extractor handles {path:?}")]
    #[diagnostic(code(snapsmith::extract::unhandled))]
    Unhandled { path: PathBuf },

    #[error("failed to extract metadata from {path:?}: {message}")]
    #[diagnostic(code(snapsmith::extract::failed))]
    Failed { path: PathBuf, message: String },
}

impl ExtractError {
    pub fn failed(path: &Path, message: impl ToString) -> Self {
        ExtractError::Failed {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

/// Turns one file into metadata.
pub trait MetadataExtractor {
    /// Name for display.
    fn name(&self) -> &str;

    /// Extract metadata from `path`.
    ///
    /// Returns [`ExtractError::Unhandled`] for files of a kind this extractor
    /// does not know. Paths in the result are relative to `workdir`.
    fn extract(&self, path: &Path, workdir: &Path) -> Result<ExtractedMetadata, ExtractError>;
}

/// Ordered set of extractors.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn MetadataExtractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractorRegistry {
    /// Registry with the built-in extractors.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(DesktopExtractor));
        registry.register(Box::new(YamlExtractor));
        registry
    }

    pub fn empty() -> Self {
        ExtractorRegistry {
            extractors: Vec::new(),
        }
    }

    /// Add an extractor after the ones already registered.
    pub fn register(&mut self, extractor: Box<dyn MetadataExtractor>) {
        self.extractors.push(extractor);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.extractors.iter().map(|e| e.name())
    }

    /// Run the first extractor that handles `path`.
    pub fn extract(&self, path: &Path, workdir: &Path) -> Result<ExtractedMetadata, ExtractError> {
        for extractor in &self.extractors {
            match extractor.extract(path, workdir) {
                Err(ExtractError::Unhandled { .. }) => continue,
                Ok(metadata) => {
                    tracing::debug!("{} extracted metadata from {}", extractor.name(), path.display());
                    return Ok(metadata);
                }
                Err(e) => return Err(e),
            }
        }
        Err(ExtractError::Unhandled {
            path: path.to_path_buf(),
        })
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}
