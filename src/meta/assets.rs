//! Icons, desktop entries, gadget descriptors and hooks.
//!
//! Assets are looked up in a fixed order of directories and copied under
//! `prime/meta/`. Within one run the first source placed at a destination
//! wins; files left there by an earlier run are replaced.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::layout::ProjectLayout;
use crate::core::project::{AppSpec, ProjectConfig, PROJECT_FILE_NAME};
use crate::meta::desktop::DesktopEntry;
use crate::meta::errors::MetaError;
use crate::meta::notices::Notices;
use crate::meta::reconcile::ReconciledMetadata;
use crate::meta::wrapper::WrapperGenerator;
use crate::meta::GeneratedAsset;
use crate::util::fs::{ensure_dir, ensure_executable, link_or_copy, write_string};

const LEGACY_GUI_NOTICE: &str = "Assets in 'setup/gui' should now be placed in 'snap/gui'.";

/// Directories under the asset directory that never reach the package.
const PRIVATE_DIRS: [&str; 2] = ["local", ".snapcraft"];

/// What to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind<'a> {
    Icon,
    Desktop(&'a str),
    Gadget,
    Hook(&'a str),
}

fn is_icon(path: &Path) -> bool {
    path.file_stem() == Some(OsStr::new("icon"))
}

fn icon_file_name(source: &Path) -> String {
    match source.extension() {
        Some(ext) => format!("icon.{}", ext.to_string_lossy()),
        None => "icon".to_string(),
    }
}

fn sorted_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files
}

/// Finds assets and places them under `meta/`.
#[derive(Debug)]
pub struct AssetLocator<'a> {
    layout: &'a ProjectLayout,
    placed: BTreeSet<PathBuf>,
    assets: Vec<GeneratedAsset>,
}

impl<'a> AssetLocator<'a> {
    pub fn new(layout: &'a ProjectLayout) -> Self {
        AssetLocator {
            layout,
            placed: BTreeSet::new(),
            assets: Vec::new(),
        }
    }

    /// First existing source for `kind`.
    pub fn locate(&self, kind: AssetKind<'_>) -> Option<PathBuf> {
        match kind {
            AssetKind::Icon => self
                .layout
                .gui_search_dirs()
                .iter()
                .find_map(|dir| sorted_files(dir).into_iter().find(|f| is_icon(f))),
            AssetKind::Desktop(app) => self
                .layout
                .gui_search_dirs()
                .into_iter()
                .map(|dir| dir.join(format!("{}.desktop", app)))
                .find(|path| path.is_file()),
            AssetKind::Gadget => self
                .layout
                .gadget_search_paths()
                .into_iter()
                .find(|path| path.is_file()),
            AssetKind::Hook(name) => [
                self.layout.assets_dir().join("hooks").join(name),
                self.layout.prime_hooks_dir().join(name),
            ]
            .into_iter()
            .find(|path| path.is_file()),
        }
    }

    pub fn is_placed(&self, dest: &Path) -> bool {
        self.placed.contains(dest)
    }

    /// Copy `source` to `dest` unless something was placed there already.
    pub fn place(
        &mut self,
        source: &Path,
        dest: PathBuf,
        executable: bool,
    ) -> Result<bool, MetaError> {
        if self.placed.contains(&dest) {
            tracing::debug!(
                "skipping {}: {} already placed",
                source.display(),
                dest.display()
            );
            return Ok(false);
        }
        link_or_copy(source, &dest, true)?;
        if executable {
            ensure_executable(&dest)?;
        }
        tracing::debug!("placed {} at {}", source.display(), dest.display());
        self.record(dest, executable);
        Ok(true)
    }

    /// Write generated `contents` to `dest`, claiming it for this run.
    pub fn place_contents(&mut self, contents: &str, dest: PathBuf) -> Result<(), MetaError> {
        write_string(&dest, contents)?;
        tracing::debug!("wrote {}", dest.display());
        self.record(dest, false);
        Ok(())
    }

    fn record(&mut self, dest: PathBuf, executable: bool) {
        self.placed.insert(dest.clone());
        self.assets.push(if executable {
            GeneratedAsset::executable(dest)
        } else {
            GeneratedAsset::file(dest)
        });
    }

    /// Icon, desktop entries, completers and the rest of the GUI directories.
    pub fn place_gui(
        &mut self,
        project: &ProjectConfig,
        reconciled: &ReconciledMetadata,
        notices: &mut Notices,
    ) -> Result<(), MetaError> {
        let gui_dir = self.layout.meta_gui_dir();
        let prime = self.layout.prime_dir().to_path_buf();

        if let Some(icon) = &project.icon {
            let source = self.layout.project_dir().join(icon);
            if !source.is_file() {
                return Err(MetaError::MissingAsset {
                    owner: "icon".to_string(),
                    path: PathBuf::from(icon),
                });
            }
            self.place(&source, gui_dir.join(icon_file_name(&source)), false)?;
        }

        for (name, app) in project.apps.iter() {
            if let Some(completer) = &app.completer {
                if !prime.join(completer).exists() {
                    return Err(missing_app_asset(name, completer));
                }
            }
            if let Some(desktop) = &app.desktop {
                let source = prime.join(desktop);
                if !source.is_file() {
                    return Err(missing_app_asset(name, desktop));
                }
                self.place_desktop(&project.name, name, &source, notices)?;
            }
        }

        let mut icon_placed = self.placed.iter().any(|p| is_icon(p));
        if !icon_placed {
            if let Some(source) = self.locate(AssetKind::Icon) {
                icon_placed = self.place(&source, gui_dir.join(icon_file_name(&source)), false)?;
            }
        }

        for (name, _) in project.apps.iter() {
            if let Some(source) = self.locate(AssetKind::Desktop(name)) {
                self.place(&source, gui_dir.join(format!("{}.desktop", name)), false)?;
            }
        }

        let legacy = self.layout.legacy_gui_dir();
        for dir in self.layout.gui_search_dirs() {
            let files = sorted_files(&dir);
            if dir == legacy && !files.is_empty() {
                notices.warn_once("legacy-gui", LEGACY_GUI_NOTICE);
            }
            for file in files.into_iter().filter(|f| !is_icon(f)) {
                if let Some(file_name) = file.file_name() {
                    self.place(&file, gui_dir.join(file_name), false)?;
                }
            }
        }

        if !icon_placed {
            if let Some(icon) = &reconciled.icon {
                let source = prime.join(icon.trim_start_matches('/'));
                if source.is_file() {
                    self.place(&source, gui_dir.join(icon_file_name(&source)), false)?;
                } else {
                    tracing::debug!("ignoring extracted icon {}: not in prime", icon);
                }
            }
        }

        for (name, app) in project.apps.iter() {
            let dest = gui_dir.join(format!("{}.desktop", name));
            if self.is_placed(&dest) || !adopts_extracted_desktop(app, reconciled, project.apps.len()) {
                continue;
            }
            let found = reconciled
                .desktop_file_paths
                .iter()
                .map(|p| prime.join(p.trim_start_matches('/')))
                .find(|p| p.is_file());
            if let Some(source) = found {
                self.place_desktop(&project.name, name, &source, notices)?;
            }
        }

        Ok(())
    }

    fn place_desktop(
        &mut self,
        package: &str,
        app: &str,
        source: &Path,
        notices: &mut Notices,
    ) -> Result<(), MetaError> {
        let dest = self.layout.meta_gui_dir().join(format!("{}.desktop", app));
        if self.is_placed(&dest) {
            return Ok(());
        }
        let mut entry = DesktopEntry::load(source)?;
        entry.reformat(package, app, self.layout.prime_dir(), notices)?;
        self.place_contents(&entry.render(), dest)
    }

    /// Copy the asset directory into `prime/snap/`.
    ///
    /// The project file, `local/` and `.snapcraft/` are left out. Nothing is
    /// created when there is nothing to copy.
    pub fn migrate_snap_dir(&mut self) -> Result<(), MetaError> {
        let assets_dir = self.layout.assets_dir();
        if !assets_dir.is_dir() {
            return Ok(());
        }
        let target = self.layout.prime_snap_dir();

        let walker = WalkDir::new(assets_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                !(entry.depth() == 1
                    && entry.file_type().is_dir()
                    && PRIVATE_DIRS.iter().any(|d| entry.file_name() == *d))
            });

        for entry in walker {
            let entry = entry.map_err(|e| MetaError::Io {
                message: format!("failed to walk {}: {}", assets_dir.display(), e),
            })?;
            if entry.file_type().is_dir() {
                continue;
            }
            let rel = entry.path().strip_prefix(assets_dir).unwrap_or(entry.path());
            if rel == Path::new(PROJECT_FILE_NAME) {
                continue;
            }

            let dest = target.join(rel);
            link_or_copy(entry.path(), &dest, false)?;
            if rel.starts_with("hooks") && !entry.path_is_symlink() {
                ensure_executable(&dest)?;
            }
            tracing::debug!("copied {} to {}", rel.display(), dest.display());
        }
        Ok(())
    }

    /// Fill `meta/hooks/`: project hooks are copied, part hooks get a launcher.
    pub fn place_hooks(&mut self, wrappers: &WrapperGenerator<'_>) -> Result<(), MetaError> {
        let project_hooks = self.layout.assets_dir().join("hooks");
        let mut names: BTreeSet<String> = BTreeSet::new();
        for dir in [&project_hooks, &self.layout.prime_hooks_dir()] {
            names.extend(
                sorted_files(dir)
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned()),
            );
        }
        if names.is_empty() {
            return Ok(());
        }
        ensure_dir(&self.layout.meta_hooks_dir())?;

        for name in names {
            let Some(source) = self.locate(AssetKind::Hook(&name)) else {
                continue;
            };
            if source.starts_with(&project_hooks) {
                self.place(&source, self.layout.meta_hooks_dir().join(&name), true)?;
            } else {
                let asset = wrappers.write_hook_wrapper(&name)?;
                self.assets.push(asset);
            }
        }
        Ok(())
    }

    /// Copy the gadget descriptor, if one exists.
    pub fn place_gadget(&mut self) -> Result<Option<PathBuf>, MetaError> {
        let Some(source) = self.locate(AssetKind::Gadget) else {
            return Ok(None);
        };
        let dest = self.layout.meta_dir().join("gadget.yaml");
        self.place(&source, dest.clone(), false)?;
        Ok(Some(dest))
    }

    pub fn into_assets(self) -> Vec<GeneratedAsset> {
        self.assets
    }
}

fn missing_app_asset(app: &str, path: &str) -> MetaError {
    MetaError::MissingAsset {
        owner: format!("app {:?}", app),
        path: PathBuf::from(path),
    }
}

/// Extracted desktop files go to the app sharing their common id, or to the
/// only app when no common id was extracted.
fn adopts_extracted_desktop(app: &AppSpec, reconciled: &ReconciledMetadata, app_count: usize) -> bool {
    match &reconciled.common_id {
        Some(id) => app.common_id.as_deref() == Some(id.as_str()),
        None => app_count == 1,
    }
}
