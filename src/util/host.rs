//! Build host inspection.

use std::path::Path;

const OS_RELEASE: &str = "/etc/os-release";

/// Debian architecture name of the running host.
pub fn native_arch() -> &'static str {
    deb_arch(std::env::consts::ARCH)
}

/// Map a Rust target architecture onto its Debian name.
pub fn deb_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "arm" => "armhf",
        "x86" => "i386",
        "powerpc64" => "ppc64el",
        "s390x" => "s390x",
        "riscv64" => "riscv64",
        other => other,
    }
}

/// Release codename a base snap is built from.
pub fn base_codename(base: &str) -> Option<&'static str> {
    match base {
        "core" => Some("xenial"),
        "core18" => Some("bionic"),
        "core20" => Some("focal"),
        "core22" => Some("jammy"),
        "core24" => Some("noble"),
        _ => None,
    }
}

/// Read `VERSION_CODENAME` from an os-release file.
pub fn os_release_codename(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    contents.lines().find_map(|line| {
        let value = line.trim().strip_prefix("VERSION_CODENAME=")?;
        let value = value.trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Whether this host can produce binaries that run on `base`.
///
/// Without a base (or with one we do not know) the answer is no.
pub fn is_host_compatible_with_base(base: Option<&str>) -> bool {
    let Some(base) = base else {
        tracing::debug!("no base declared, the host is not treated as compatible");
        return false;
    };
    let Some(expected) = base_codename(base) else {
        tracing::debug!("unknown base '{}', the host is not treated as compatible", base);
        return false;
    };

    match os_release_codename(Path::new(OS_RELEASE)) {
        Some(codename) => codename == expected,
        None => {
            tracing::debug!("cannot read {}, assuming an incompatible host", OS_RELEASE);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    #[test]
    fn test_deb_arch() {
        assert_eq!(deb_arch("x86_64"), "amd64");
        assert_eq!(deb_arch("aarch64"), "arm64");
        assert_eq!(deb_arch("powerpc64"), "ppc64el");
        assert_eq!(deb_arch("mips"), "mips");
    }

    #[test]
    fn test_base_codename() {
        assert_eq!(base_codename("core18"), Some("bionic"));
        assert_eq!(base_codename("core22"), Some("jammy"));
        assert_eq!(base_codename("bare"), None);
    }

    #[test]
    fn test_os_release_codename() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("os-release");
        std::fs::write(
            &path,
            "NAME=\"Ubuntu\"\nVERSION_ID=\"22.04\"\nVERSION_CODENAME=jammy\n",
        )
        .unwrap();

        assert_eq!(os_release_codename(&path).as_deref(), Some("jammy"));
        assert_eq!(os_release_codename(&tmp.path().join("missing")), None);
    }

    #[traced_test]
    #[test]
    fn test_unknown_base_is_incompatible() {
        assert!(!is_host_compatible_with_base(None));
        assert!(logs_contain("no base declared"));
        assert!(!is_host_compatible_with_base(Some("not-a-base")));
        assert!(logs_contain("unknown base 'not-a-base'"));
    }
}
