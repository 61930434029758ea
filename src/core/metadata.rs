//! Metadata extracted from built artifacts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// A sparse bag of metadata found by an extractor or set by a part scriptlet.
///
/// Any of the fields may be unset. Values here lose against anything the
/// project declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractedMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub desktop_file_paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_id: Option<String>,
    /// Keys no built-in field covers
    #[serde(flatten)]
    pub custom: BTreeMap<String, Value>,
}

impl ExtractedMetadata {
    pub fn is_empty(&self) -> bool {
        *self == ExtractedMetadata::default()
    }

    /// Layer `other` over `self`: every value `other` sets wins.
    ///
    /// Desktop file paths accumulate, `other`'s first.
    pub fn overlay(&mut self, other: &ExtractedMetadata) {
        fn take(slot: &mut Option<String>, value: &Option<String>) {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        take(&mut self.summary, &other.summary);
        take(&mut self.description, &other.description);
        take(&mut self.version, &other.version);
        take(&mut self.grade, &other.grade);
        take(&mut self.icon, &other.icon);
        take(&mut self.license, &other.license);
        take(&mut self.common_id, &other.common_id);

        if !other.desktop_file_paths.is_empty() {
            let mut paths = other.desktop_file_paths.clone();
            for path in self.desktop_file_paths.drain(..) {
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
            self.desktop_file_paths = paths;
        }

        for (key, value) in &other.custom {
            self.custom.insert(key.clone(), value.clone());
        }
    }

    /// Values set by `set-version` and `set-grade` in a part scriptlet.
    pub fn from_scriptlet(version: Option<String>, grade: Option<String>) -> Self {
        ExtractedMetadata {
            version,
            grade,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_later_wins() {
        let mut parsed = ExtractedMetadata {
            summary: Some("parsed summary".into()),
            version: Some("1.0".into()),
            desktop_file_paths: vec!["a.desktop".into()],
            ..Default::default()
        };
        let scriptlet = ExtractedMetadata::from_scriptlet(Some("2.0".into()), Some("devel".into()));

        parsed.overlay(&scriptlet);

        assert_eq!(parsed.summary.as_deref(), Some("parsed summary"));
        assert_eq!(parsed.version.as_deref(), Some("2.0"));
        assert_eq!(parsed.grade.as_deref(), Some("devel"));
        assert_eq!(parsed.desktop_file_paths, vec!["a.desktop"]);
    }

    #[test]
    fn test_overlay_merges_desktop_paths() {
        let mut base = ExtractedMetadata {
            desktop_file_paths: vec!["a.desktop".into(), "b.desktop".into()],
            ..Default::default()
        };
        let top = ExtractedMetadata {
            desktop_file_paths: vec!["b.desktop".into(), "c.desktop".into()],
            ..Default::default()
        };

        base.overlay(&top);

        assert_eq!(
            base.desktop_file_paths,
            vec!["b.desktop", "c.desktop", "a.desktop"]
        );
    }

    #[test]
    fn test_custom_keys_deserialize() {
        let meta: ExtractedMetadata =
            serde_yaml::from_str("summary: s\nwebsite: https://example.org\n").unwrap();

        assert_eq!(meta.summary.as_deref(), Some("s"));
        assert_eq!(
            meta.custom.get("website"),
            Some(&Value::String("https://example.org".into()))
        );
        assert!(!meta.is_empty());
        assert!(ExtractedMetadata::default().is_empty());
    }
}
