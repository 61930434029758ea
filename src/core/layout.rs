//! Project layout - where every input and output of packaging lives.
//!
//! The layout is built once from the project file location and threaded
//! through every packaging step.

use std::path::{Path, PathBuf};

/// Generated launcher that exports the runtime environment.
pub const RUNNER_PATH: &str = "snap/command-chain/snapsmith-runner";

/// Paths of one packaging run.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Directory holding the project
    project_dir: PathBuf,

    /// Project file (snapcraft.yaml)
    project_file: PathBuf,

    /// `snap/` or `build-aux/snap/`
    assets_dir: PathBuf,

    prime_dir: PathBuf,
    stage_dir: PathBuf,
    parts_dir: PathBuf,
}

impl ProjectLayout {
    /// Derive the layout from the project file location.
    ///
    /// A project file inside `snap/` or `build-aux/snap/` makes that directory
    /// the asset directory; otherwise `snap/` next to the file is used.
    pub fn new(project_file: &Path) -> Self {
        let file_dir = project_file
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let (project_dir, assets_dir) = if file_dir.ends_with("build-aux/snap") {
            let project = file_dir
                .parent()
                .and_then(Path::parent)
                .unwrap_or(Path::new("."))
                .to_path_buf();
            (project, file_dir)
        } else if file_dir.ends_with("snap") {
            let project = file_dir.parent().unwrap_or(Path::new(".")).to_path_buf();
            (project, file_dir)
        } else {
            let assets = file_dir.join("snap");
            (file_dir, assets)
        };

        ProjectLayout {
            prime_dir: project_dir.join("prime"),
            stage_dir: project_dir.join("stage"),
            parts_dir: project_dir.join("parts"),
            project_file: project_file.to_path_buf(),
            project_dir,
            assets_dir,
        }
    }

    /// Use a custom prime directory.
    pub fn with_prime_dir(mut self, prime_dir: PathBuf) -> Self {
        self.prime_dir = prime_dir;
        self
    }

    /// Use a custom stage directory.
    pub fn with_stage_dir(mut self, stage_dir: PathBuf) -> Self {
        self.stage_dir = stage_dir;
        self
    }

    /// Use a custom parts directory.
    pub fn with_parts_dir(mut self, parts_dir: PathBuf) -> Self {
        self.parts_dir = parts_dir;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn project_file(&self) -> &Path {
        &self.project_file
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn prime_dir(&self) -> &Path {
        &self.prime_dir
    }

    pub fn stage_dir(&self) -> &Path {
        &self.stage_dir
    }

    pub fn parts_dir(&self) -> &Path {
        &self.parts_dir
    }

    /// `prime/meta`
    pub fn meta_dir(&self) -> PathBuf {
        self.prime_dir.join("meta")
    }

    /// `prime/meta/gui`
    pub fn meta_gui_dir(&self) -> PathBuf {
        self.meta_dir().join("gui")
    }

    /// `prime/meta/hooks`
    pub fn meta_hooks_dir(&self) -> PathBuf {
        self.meta_dir().join("hooks")
    }

    /// `prime/meta/snap.yaml`
    pub fn manifest_path(&self) -> PathBuf {
        self.meta_dir().join("snap.yaml")
    }

    /// `prime/snap`
    pub fn prime_snap_dir(&self) -> PathBuf {
        self.prime_dir.join("snap")
    }

    /// `prime/snap/hooks`, where parts install their hooks
    pub fn prime_hooks_dir(&self) -> PathBuf {
        self.prime_snap_dir().join("hooks")
    }

    /// Runner script inside the prime directory
    pub fn runner_path(&self) -> PathBuf {
        self.prime_dir.join(RUNNER_PATH)
    }

    /// GUI asset directories in priority order.
    ///
    /// `setup/gui` is the legacy location.
    pub fn gui_search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![
            self.legacy_gui_dir(),
            self.assets_dir.join("gui"),
            self.project_dir.join("build-aux/snap/gui"),
        ];
        dirs.dedup();
        dirs
    }

    /// `setup/gui`
    pub fn legacy_gui_dir(&self) -> PathBuf {
        self.project_dir.join("setup").join("gui")
    }

    /// Gadget descriptor candidates in priority order.
    pub fn gadget_search_paths(&self) -> Vec<PathBuf> {
        vec![
            self.project_dir.join("gadget.yaml"),
            self.assets_dir.join("gadget.yaml"),
        ]
    }
}
