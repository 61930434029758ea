//! Filesystem utilities.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Write a file through a temporary sibling and rename it into place.
///
/// Readers never observe a half-written file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    ensure_dir(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("failed to write file: {}", path.display()))?;
    Ok(())
}

/// Write a shell script and mark it executable (0755).
pub fn write_script(path: &Path, contents: &str) -> Result<()> {
    write_string(path, contents)?;
    set_mode(path, 0o755)
        .with_context(|| format!("failed to make {} executable", path.display()))
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Hard link `src` to `dst`, falling back to a byte copy.
///
/// Any existing `dst` is replaced. With `follow_symlinks` a symlinked `src`
/// is resolved first; without it the link itself is recreated at `dst`.
pub fn link_or_copy(src: &Path, dst: &Path, follow_symlinks: bool) -> Result<()> {
    link_or_copy_with(src, dst, follow_symlinks, |src, dst| fs::hard_link(src, dst))
}

fn link_or_copy_with(
    src: &Path,
    dst: &Path,
    follow_symlinks: bool,
    hard_link: impl FnOnce(&Path, &Path) -> io::Result<()>,
) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    remove_file_if_exists(dst)?;

    let is_link = fs::symlink_metadata(src)
        .with_context(|| format!("failed to stat {}", src.display()))?
        .file_type()
        .is_symlink();

    if is_link && !follow_symlinks {
        let target = fs::read_link(src)
            .with_context(|| format!("failed to read link {}", src.display()))?;
        return symlink(&target, dst)
            .with_context(|| format!("failed to link {} -> {}", dst.display(), target.display()));
    }

    let src = if is_link {
        fs::canonicalize(src).with_context(|| format!("failed to resolve {}", src.display()))?
    } else {
        src.to_path_buf()
    };

    match hard_link(&src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!(
                "hard link {} -> {} failed ({}), copying instead",
                src.display(),
                dst.display(),
                e
            );
            fs::copy(&src, dst).with_context(|| {
                format!("failed to copy {} to {}", src.display(), dst.display())
            })?;
            Ok(())
        }
    }
}

/// Remove a file (or symlink) if present.
pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}

/// Check whether `path` is a regular file with any execute bit set.
///
/// Symlinks are followed.
pub fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && mode_is_executable(&meta),
        Err(_) => false,
    }
}

#[cfg(unix)]
fn mode_is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn mode_is_executable(_meta: &fs::Metadata) -> bool {
    true
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

/// Add the execute bits to `path`, keeping the rest of its mode.
#[cfg(unix)]
pub fn add_exec_bits(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path)?.permissions().mode();
    set_mode(path, mode | 0o111)
}

#[cfg(not(unix))]
pub fn add_exec_bits(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Make sure `path` ends up executable.
///
/// When the mode of a hard-linked file cannot be changed (the inode may live
/// on a filesystem that refuses chmod), the link is replaced with a private
/// byte copy which is then made executable.
pub fn ensure_executable(path: &Path) -> Result<()> {
    ensure_executable_with(path, add_exec_bits)
}

fn ensure_executable_with(
    path: &Path,
    chmod: impl FnOnce(&Path) -> io::Result<()>,
) -> Result<()> {
    if is_executable(path) {
        return Ok(());
    }

    if let Err(e) = chmod(path) {
        tracing::debug!(
            "cannot chmod {} ({}), replacing it with a private copy",
            path.display(),
            e
        );
    }
    if is_executable(path) {
        return Ok(());
    }

    let contents = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    remove_file_if_exists(path)?;
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    set_mode(path, 0o755).with_context(|| format!("failed to make {} executable", path.display()))
}

/// Create a symlink (platform-aware).
#[cfg(unix)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
pub fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_link_or_copy_replaces_existing() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src.txt");
        let dst = tmp.path().join("out/dst.txt");
        fs::write(&src, "new").unwrap();
        fs::create_dir_all(dst.parent().unwrap()).unwrap();
        fs::write(&dst, "old").unwrap();

        link_or_copy(&src, &dst, true).unwrap();

        assert_eq!(fs::read_to_string(&dst).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_link_or_copy_preserves_symlink_when_not_following() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("target"), "data").unwrap();
        symlink(Path::new("target"), &tmp.path().join("link")).unwrap();

        let out = tmp.path().join("copy");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("target"), "data").unwrap();
        link_or_copy(&tmp.path().join("link"), &out.join("link"), false).unwrap();

        let meta = fs::symlink_metadata(out.join("link")).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(fs::read_link(out.join("link")).unwrap(), PathBuf::from("target"));
    }

    #[cfg(unix)]
    #[test]
    fn test_link_or_copy_follows_symlink() {
        use std::os::unix::fs::MetadataExt;

        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("target"), "data").unwrap();
        symlink(Path::new("target"), &tmp.path().join("link")).unwrap();

        let dst = tmp.path().join("resolved");
        link_or_copy(&tmp.path().join("link"), &dst, true).unwrap();

        let meta = fs::symlink_metadata(&dst).unwrap();
        assert!(meta.file_type().is_file());
        assert_eq!(meta.ino(), fs::metadata(tmp.path().join("target")).unwrap().ino());
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_executable_sets_bits() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hook");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        assert!(!is_executable(&path));

        ensure_executable(&path).unwrap();

        assert!(is_executable(&path));
    }

    #[cfg(unix)]
    #[test]
    fn test_ensure_executable_copies_when_chmod_fails() {
        use std::os::unix::fs::MetadataExt;

        let tmp = TempDir::new().unwrap();
        let part_hook = tmp.path().join("parts/hook");
        let primed = tmp.path().join("prime/hook");
        fs::create_dir_all(part_hook.parent().unwrap()).unwrap();
        fs::create_dir_all(primed.parent().unwrap()).unwrap();
        fs::write(&part_hook, "#!/bin/sh\necho configure\n").unwrap();
        fs::hard_link(&part_hook, &primed).unwrap();

        ensure_executable_with(&primed, |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only inode"))
        })
        .unwrap();

        assert!(is_executable(&primed));
        assert!(!is_executable(&part_hook));
        assert_eq!(fs::read(&primed).unwrap(), b"#!/bin/sh\necho configure\n");
        assert_ne!(
            fs::metadata(&primed).unwrap().ino(),
            fs::metadata(&part_hook).unwrap().ino()
        );
    }

    #[test]
    fn test_link_or_copy_copies_when_link_fails() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("icon.png");
        let dst = tmp.path().join("meta/gui/icon.png");
        let bytes: Vec<u8> = (0..=255u8).collect();
        fs::write(&src, &bytes).unwrap();

        link_or_copy_with(&src, &dst, true, |_, _| {
            Err(io::Error::new(io::ErrorKind::Unsupported, "cross-device link"))
        })
        .unwrap();

        assert_eq!(fs::read(&dst).unwrap(), bytes);
        fs::write(&src, "changed").unwrap();
        assert_eq!(fs::read(&dst).unwrap(), bytes);
    }

    #[test]
    fn test_write_atomic() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("meta/snap.yaml");

        write_atomic(&path, "name: a\n").unwrap();
        write_atomic(&path, "name: b\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "name: b\n");
    }

    #[test]
    fn test_relative_path() {
        let rel = relative_path(Path::new("/a/prime"), Path::new("/a/prime/bin/app"));
        assert_eq!(rel, PathBuf::from("bin/app"));
    }
}
