//! `*.desktop` files.

use std::path::Path;

use crate::core::metadata::ExtractedMetadata;
use crate::extractors::{has_extension, ExtractError, MetadataExtractor};
use crate::meta::desktop::DesktopEntry;
use crate::util::fs::relative_path;

/// `Comment` becomes the summary, `Icon` the icon, and the file itself a
/// desktop file candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopExtractor;

impl MetadataExtractor for DesktopExtractor {
    fn name(&self) -> &str {
        "desktop"
    }

    fn extract(&self, path: &Path, workdir: &Path) -> Result<ExtractedMetadata, ExtractError> {
        if !has_extension(path, &["desktop"]) {
            return Err(ExtractError::Unhandled {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| ExtractError::failed(path, e))?;
        let entry = DesktopEntry::parse(path, &content);

        let desktop_path = if path.is_absolute() {
            relative_path(workdir, path)
        } else {
            path.to_path_buf()
        };

        Ok(ExtractedMetadata {
            summary: entry.get("Comment").map(str::to_string),
            icon: entry.get("Icon").map(str::to_string),
            desktop_file_paths: vec![desktop_path.to_string_lossy().into_owned()],
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_desktop() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("usr/share/applications");
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("app.desktop");
        fs::write(
            &file,
            "[Desktop Entry]\nName=App\nComment=A fine app\nIcon=/usr/share/icons/app.png\nExec=app\n",
        )
        .unwrap();

        let metadata = DesktopExtractor.extract(&file, tmp.path()).unwrap();

        assert_eq!(metadata.summary.as_deref(), Some("A fine app"));
        assert_eq!(metadata.icon.as_deref(), Some("/usr/share/icons/app.png"));
        assert_eq!(
            metadata.desktop_file_paths,
            vec!["usr/share/applications/app.desktop"]
        );
        assert!(metadata.version.is_none());
    }

    #[test]
    fn test_other_files_unhandled() {
        let err = DesktopExtractor
            .extract(Path::new("meta.yaml"), Path::new("."))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Unhandled { .. }));
    }

    #[test]
    fn test_unreadable_file_fails() {
        let err = DesktopExtractor
            .extract(Path::new("/nonexistent/app.desktop"), Path::new("/"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Failed { .. }));
    }
}
