//! Desktop entry handling.
//!
//! Only the `Exec` and `Icon` keys of the `[Desktop Entry]` group are ever
//! touched; every other line is written back as read.

use std::path::{Path, PathBuf};

use crate::meta::errors::MetaError;
use crate::meta::notices::Notices;

const MAIN_GROUP: &str = "[Desktop Entry]";

/// A desktop entry file held as lines.
#[derive(Debug, Clone)]
pub struct DesktopEntry {
    path: PathBuf,
    lines: Vec<String>,
}

impl DesktopEntry {
    /// Read a desktop entry from disk.
    pub fn load(path: &Path) -> Result<Self, MetaError> {
        let content = std::fs::read_to_string(path).map_err(|e| MetaError::InvalidDesktopFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::parse(path, &content))
    }

    pub fn parse(path: &Path, content: &str) -> Self {
        DesktopEntry {
            path: path.to_path_buf(),
            lines: content.lines().map(str::to_string).collect(),
        }
    }

    /// Line range of the `[Desktop Entry]` group body.
    fn main_group(&self) -> Option<std::ops::Range<usize>> {
        let header = self.lines.iter().position(|l| l.trim() == MAIN_GROUP)?;
        let end = self.lines[header + 1..]
            .iter()
            .position(|l| l.trim_start().starts_with('['))
            .map(|offset| header + 1 + offset)
            .unwrap_or(self.lines.len());
        Some(header + 1..end)
    }

    fn find_key(&self, key: &str) -> Option<usize> {
        let range = self.main_group()?;
        range.into_iter().find(|&i| split_key(&self.lines[i]).is_some_and(|(k, _)| k == key))
    }

    /// Value of `key` in the `[Desktop Entry]` group.
    pub fn get(&self, key: &str) -> Option<&str> {
        let line = &self.lines[self.find_key(key)?];
        split_key(line).map(|(_, v)| v)
    }

    fn set(&mut self, index: usize, key: &str, value: &str) {
        self.lines[index] = format!("{}={}", key, value);
    }

    /// Point `Exec` at the installed app and `Icon` into the snap.
    pub fn reformat(
        &mut self,
        package: &str,
        app: &str,
        prime_dir: &Path,
        notices: &mut Notices,
    ) -> Result<(), MetaError> {
        if self.main_group().is_none() {
            return Err(self.invalid(format!("missing {} section", MAIN_GROUP)));
        }
        let exec = self
            .find_key("Exec")
            .ok_or_else(|| self.invalid("missing Exec key".to_string()))?;

        let launcher = if app == package {
            format!("{} %U", package)
        } else {
            format!("{}.{} %U", package, app)
        };
        self.set(exec, "Exec", &launcher);

        if let Some(index) = self.find_key("Icon") {
            let icon = self.get("Icon").unwrap_or_default().to_string();
            if let Some(relative) = icon.strip_prefix('/') {
                if prime_dir.join(relative).exists() {
                    self.set(index, "Icon", &format!("${{SNAP}}/{}", relative));
                } else {
                    notices.warn(format!(
                        "Icon {} specified in desktop file {} not found in prime directory",
                        icon,
                        self.path.display()
                    ));
                }
            }
        }

        Ok(())
    }

    fn invalid(&self, message: String) -> MetaError {
        MetaError::InvalidDesktopFile {
            path: self.path.clone(),
            message,
        }
    }

    /// File contents.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

fn split_key(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    Some((key.trim(), value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ENTRY: &str = "[Desktop Entry]\nName=My App\n# comment\nExec=app %U\nIcon=/usr/share/icons/app.png\n\n[Desktop Action New]\nExec=app --new\n";

    #[test]
    fn test_reformat_exec_and_icon() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("usr/share/icons")).unwrap();
        std::fs::write(tmp.path().join("usr/share/icons/app.png"), "").unwrap();

        let mut entry = DesktopEntry::parse(Path::new("app.desktop"), ENTRY);
        let mut notices = Notices::new();
        entry
            .reformat("my-package", "app1", tmp.path(), &mut notices)
            .unwrap();

        let out = entry.render();
        assert!(out.contains("Exec=my-package.app1 %U\n"));
        assert!(out.contains("Icon=${SNAP}/usr/share/icons/app.png\n"));
        assert!(out.contains("# comment\n"));
        // Only the main group is rewritten
        assert!(out.contains("[Desktop Action New]\nExec=app --new\n"));
        assert!(notices.is_empty());
    }

    #[test]
    fn test_app_named_like_package() {
        let tmp = TempDir::new().unwrap();
        let mut entry = DesktopEntry::parse(Path::new("a.desktop"), "[Desktop Entry]\nExec=x\n");
        entry
            .reformat("my-package", "my-package", tmp.path(), &mut Notices::new())
            .unwrap();

        assert_eq!(entry.get("Exec"), Some("my-package %U"));
    }

    #[test]
    fn test_icon_outside_prime_is_left_alone() {
        let tmp = TempDir::new().unwrap();
        let mut entry = DesktopEntry::parse(Path::new("app.desktop"), ENTRY);
        let mut notices = Notices::new();
        entry.reformat("pkg", "app", tmp.path(), &mut notices).unwrap();

        assert_eq!(entry.get("Icon"), Some("/usr/share/icons/app.png"));
        assert_eq!(notices.warnings().count(), 1);
    }

    #[test]
    fn test_relative_icon_is_kept() {
        let tmp = TempDir::new().unwrap();
        let mut entry =
            DesktopEntry::parse(Path::new("a.desktop"), "[Desktop Entry]\nExec=x\nIcon=app\n");
        entry.reformat("pkg", "app", tmp.path(), &mut Notices::new()).unwrap();

        assert_eq!(entry.get("Icon"), Some("app"));
    }

    #[test]
    fn test_missing_section() {
        let mut entry = DesktopEntry::parse(Path::new("bad.desktop"), "Exec=foo\n");
        let err = entry
            .reformat("pkg", "app", Path::new("/prime"), &mut Notices::new())
            .unwrap_err();
        assert!(matches!(err, MetaError::InvalidDesktopFile { .. }));
    }

    #[test]
    fn test_missing_exec() {
        let mut entry = DesktopEntry::parse(Path::new("bad.desktop"), "[Desktop Entry]\nName=x\n");
        let err = entry
            .reformat("pkg", "app", Path::new("/prime"), &mut Notices::new())
            .unwrap_err();
        assert!(err.to_string().contains("missing Exec key"));
    }
}
