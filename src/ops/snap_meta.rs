//! Implementation of `snapsmith meta` and `snapsmith extract`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::layout::ProjectLayout;
use crate::core::metadata::ExtractedMetadata;
use crate::core::project::ProjectConfig;
use crate::extractors::ExtractorRegistry;
use crate::meta::{create_packaging, PackagingOptions, PackagingOutcome};
use crate::util::config::{Config, RunnerPolicy};
use crate::util::host;

/// Runtime environment used when the build provides none.
pub fn default_runtime_environment() -> Vec<String> {
    vec!["PATH=\"$SNAP/usr/sbin:$SNAP/usr/bin:$SNAP/sbin:$SNAP/bin:$PATH\"".to_string()]
}

/// Options for generating snap metadata.
#[derive(Debug, Clone, Default)]
pub struct MetaOptions {
    /// Override the prime directory
    pub prime_dir: Option<PathBuf>,

    /// Override the stage directory
    pub stage_dir: Option<PathBuf>,

    /// Override the parts directory
    pub parts_dir: Option<PathBuf>,

    /// Runner policy (beats the config file)
    pub runner: Option<RunnerPolicy>,

    /// Architecture used when the project declares none
    pub arch: Option<String>,

    /// Version set by the adopted part's scriptlet
    pub set_version: Option<String>,

    /// Grade set by the adopted part's scriptlet
    pub set_grade: Option<String>,

    /// Runtime environment lines (defaults to the standard PATH)
    pub environment: Option<Vec<String>>,
}

/// Work out the directories of a project.
///
/// Command line overrides beat the config file; relative config paths are
/// taken from the project directory.
pub fn project_layout(project_file: &Path, config: &Config, opts: &MetaOptions) -> ProjectLayout {
    let mut layout = ProjectLayout::new(project_file);
    let project_dir = layout.project_dir().to_path_buf();
    let pick = |cli: &Option<PathBuf>, configured: &Option<PathBuf>| {
        cli.clone()
            .or_else(|| configured.as_ref().map(|p| project_dir.join(p)))
    };

    if let Some(prime) = pick(&opts.prime_dir, &config.paths.prime) {
        layout = layout.with_prime_dir(prime);
    }
    if let Some(stage) = pick(&opts.stage_dir, &config.paths.stage) {
        layout = layout.with_stage_dir(stage);
    }
    if let Some(parts) = pick(&opts.parts_dir, &config.paths.parts) {
        layout = layout.with_parts_dir(parts);
    }
    layout
}

/// Metadata of the part named by `adopt-info`.
///
/// Every `parse-info` file is run through the registry, later files winning.
/// Scriptlet values are applied last, whatever order things ran in.
pub fn collect_adopted_metadata(
    project: &ProjectConfig,
    layout: &ProjectLayout,
    registry: &ExtractorRegistry,
    opts: &MetaOptions,
) -> Result<ExtractedMetadata> {
    let mut metadata = ExtractedMetadata::default();
    let scriptlet = ExtractedMetadata::from_scriptlet(opts.set_version.clone(), opts.set_grade.clone());

    let Some((part_name, part)) = project.adopted_part() else {
        if !scriptlet.is_empty() {
            bail!("`--set-version` and `--set-grade` need a part named by 'adopt-info'");
        }
        return Ok(metadata);
    };

    for rel in &part.parse_info {
        let path = layout.prime_dir().join(rel);
        if !path.exists() {
            bail!(
                "part `{}` lists {} under 'parse-info', but it is not in the prime directory",
                part_name,
                rel
            );
        }
        let found = registry
            .extract(&path, layout.prime_dir())
            .with_context(|| format!("failed to parse info for part `{}`", part_name))?;
        metadata.overlay(&found);
    }

    metadata.overlay(&scriptlet);
    Ok(metadata)
}

/// Extract metadata from a single file.
pub fn extract_metadata(
    path: &Path,
    workdir: &Path,
    registry: &ExtractorRegistry,
) -> Result<ExtractedMetadata> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }
    Ok(registry.extract(path, workdir)?)
}

/// Generate `prime/meta/` for the project at `project_file`.
pub fn generate_meta(
    project_file: &Path,
    config: &Config,
    opts: &MetaOptions,
    registry: &ExtractorRegistry,
) -> Result<PackagingOutcome> {
    let project = ProjectConfig::load(project_file)?;
    let layout = project_layout(project_file, config, opts);
    if !layout.prime_dir().is_dir() {
        bail!(
            "prime directory {} does not exist\n\
             hint: run the build lifecycle up to `prime` first",
            layout.prime_dir().display()
        );
    }
    tracing::debug!("prime directory: {}", layout.prime_dir().display());

    let extracted = collect_adopted_metadata(&project, &layout, registry, opts)?;

    let policy = opts.runner.unwrap_or_else(|| config.runner());
    let use_runner = policy.enabled(|| host::is_host_compatible_with_base(project.base.as_deref()));
    tracing::debug!("runner policy {}: runner {}", policy, if use_runner { "on" } else { "off" });
    if !use_runner && policy == RunnerPolicy::Auto {
        tracing::debug!(
            "runner off because the host does not match base {:?}; use --runner always to force it",
            project.base.as_deref().unwrap_or("<none>")
        );
    }

    let options = PackagingOptions {
        use_runner,
        arch: opts
            .arch
            .clone()
            .or_else(|| config.meta.arch.clone())
            .unwrap_or_else(|| host::native_arch().to_string()),
        environment: opts
            .environment
            .clone()
            .unwrap_or_else(default_runtime_environment),
        host_path: std::env::var("PATH").unwrap_or_default(),
    };

    Ok(create_packaging(&project, &layout, &extracted, &options)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaError;
    use crate::util::fs::write_script;
    use serde_yaml::Value;
    use std::fs;
    use tempfile::TempDir;

    const PROJECT: &str = r#"
name: my-package
adopt-info: main
confinement: strict
grade: stable
apps:
  my-package:
    command: bin/hello
parts:
  main:
    plugin: nil
    parse-info: [meta/info.yaml, usr/share/applications/hello.desktop]
"#;

    fn setup(project: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("snap")).unwrap();
        fs::write(tmp.path().join("snap/snapcraft.yaml"), project).unwrap();
        write_script(&tmp.path().join("prime/bin/hello"), "#!/bin/sh\necho hi\n").unwrap();
        fs::create_dir_all(tmp.path().join("prime/usr/share/applications")).unwrap();
        fs::write(
            tmp.path().join("prime/usr/share/applications/hello.desktop"),
            "[Desktop Entry]\nName=Hello\nComment=Says hello\nExec=hello\n",
        )
        .unwrap();
        fs::create_dir_all(tmp.path().join("prime/meta")).unwrap();
        fs::write(
            tmp.path().join("prime/meta/info.yaml"),
            "version: '0.9'\nsummary: from sidecar\ndescription: Greets people.\n",
        )
        .unwrap();
        tmp
    }

    fn never() -> MetaOptions {
        MetaOptions {
            runner: Some(RunnerPolicy::Never),
            arch: Some("arm64".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_generate_with_adopted_metadata() {
        let tmp = setup(PROJECT);
        let project_file = tmp.path().join("snap/snapcraft.yaml");

        let outcome = generate_meta(
            &project_file,
            &Config::default(),
            &never(),
            &ExtractorRegistry::new(),
        )
        .unwrap();

        let manifest = &outcome.manifest;
        assert_eq!(manifest["version"], Value::from("0.9"));
        assert_eq!(manifest["summary"], Value::from("Says hello"));
        assert_eq!(manifest["description"], Value::from("Greets people."));
        assert_eq!(manifest["architectures"], Value::Sequence(vec![Value::from("arm64")]));
        assert_eq!(
            manifest["apps"]["my-package"]["command"],
            Value::from("command-my-package.wrapper")
        );

        let desktop =
            fs::read_to_string(tmp.path().join("prime/meta/gui/my-package.desktop")).unwrap();
        assert!(desktop.contains("Exec=my-package %U"));
        assert!(tmp.path().join("prime/meta/snap.yaml").exists());
    }

    #[test]
    fn test_scriptlet_wins_over_parse_info() {
        let tmp = setup(PROJECT);
        let project = ProjectConfig::load(&tmp.path().join("snap/snapcraft.yaml")).unwrap();
        let layout = ProjectLayout::new(&tmp.path().join("snap/snapcraft.yaml"));
        let opts = MetaOptions {
            set_version: Some("2.0".into()),
            ..Default::default()
        };

        let metadata =
            collect_adopted_metadata(&project, &layout, &ExtractorRegistry::new(), &opts).unwrap();

        assert_eq!(metadata.version.as_deref(), Some("2.0"));
        assert_eq!(metadata.summary.as_deref(), Some("Says hello"));
        assert_eq!(
            metadata.desktop_file_paths,
            vec!["usr/share/applications/hello.desktop"]
        );
    }

    #[test]
    fn test_missing_parse_info_file() {
        let tmp = setup(PROJECT);
        fs::remove_file(tmp.path().join("prime/meta/info.yaml")).unwrap();

        let err = generate_meta(
            &tmp.path().join("snap/snapcraft.yaml"),
            &Config::default(),
            &never(),
            &ExtractorRegistry::new(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("meta/info.yaml"));
    }

    #[test]
    fn test_scriptlet_without_adopt_info() {
        let tmp = setup("name: x\nversion: '1'\nsummary: s\ndescription: d\n");
        let project = ProjectConfig::load(&tmp.path().join("snap/snapcraft.yaml")).unwrap();
        let layout = ProjectLayout::new(&tmp.path().join("snap/snapcraft.yaml"));
        let opts = MetaOptions {
            set_grade: Some("devel".into()),
            ..Default::default()
        };

        assert!(collect_adopted_metadata(&project, &layout, &ExtractorRegistry::new(), &opts).is_err());
    }

    #[test]
    fn test_meta_error_survives_anyhow() {
        let tmp = setup("name: x\nsummary: s\ndescription: d\n");

        let err = generate_meta(
            &tmp.path().join("snap/snapcraft.yaml"),
            &Config::default(),
            &never(),
            &ExtractorRegistry::new(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MetaError>(),
            Some(MetaError::MissingRequiredField { .. })
        ));
    }

    #[test]
    fn test_config_paths_relative_to_project() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.prime = Some(PathBuf::from("out/prime"));
        let opts = MetaOptions {
            stage_dir: Some(PathBuf::from("/abs/stage")),
            ..Default::default()
        };

        let layout = project_layout(&tmp.path().join("snap/snapcraft.yaml"), &config, &opts);

        assert_eq!(layout.prime_dir(), tmp.path().join("out/prime"));
        assert_eq!(layout.stage_dir(), Path::new("/abs/stage"));
    }

    #[test]
    fn test_missing_prime_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("snap")).unwrap();
        fs::write(tmp.path().join("snap/snapcraft.yaml"), "name: x\n").unwrap();

        let err = generate_meta(
            &tmp.path().join("snap/snapcraft.yaml"),
            &Config::default(),
            &MetaOptions::default(),
            &ExtractorRegistry::new(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("prime directory"));
    }
}
