//! Metadata sidecar files (`*.yaml`, `*.yml`).
//!
//! A sidecar is a YAML mapping using the same keys as snap.yaml metadata:
//!
//! ```yaml
//! version: 1.2.3
//! summary: A fine app
//! desktop-file-paths: [usr/share/applications/app.desktop]
//! website: https://example.com
//! ```
//!
//! Keys without a dedicated field are kept as custom metadata.

use std::path::Path;

use crate::core::metadata::ExtractedMetadata;
use crate::extractors::{has_extension, ExtractError, MetadataExtractor};

#[derive(Debug, Default, Clone, Copy)]
pub struct YamlExtractor;

impl MetadataExtractor for YamlExtractor {
    fn name(&self) -> &str {
        "yaml"
    }

    fn extract(&self, path: &Path, _workdir: &Path) -> Result<ExtractedMetadata, ExtractError> {
        if !has_extension(path, &["yaml", "yml"]) {
            return Err(ExtractError::Unhandled {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ExtractError::failed(path, e))?;
        if content.trim().is_empty() {
            return Ok(ExtractedMetadata::default());
        }
        serde_yaml::from_str(&content).map_err(|e| ExtractError::failed(path, e))
    }
}
