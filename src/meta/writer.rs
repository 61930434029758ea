//! Assembly and persistence of snap.yaml.
//!
//! The stages run in a fixed order and never revisit an earlier one:
//! reconcile, place assets, wrap commands, merge passthrough, collect
//! assumes, apply defaults, check, write. snap.yaml is written last, so a
//! fatal error leaves any previous snap.yaml untouched.

use serde_yaml::{Mapping, Value};

use crate::core::metadata::ExtractedMetadata;
use crate::core::project::{AppSpec, HookSpec, SnapType};
use crate::core::snap_manifest::{render, to_mapping, AppEntry, HookEntry, SnapManifest};
use crate::meta::assets::AssetLocator;
use crate::meta::command::{search_path_from_environment, CommandResolver};
use crate::meta::passthrough::{self, Scope};
use crate::meta::reconcile::{reconcile, ReconciledMetadata};
use crate::meta::wrapper::{WrappedApp, WrapperGenerator};
use crate::meta::{assumes, GeneratedAsset, MetaError, Notices, PackagingContext, PackagingOutcome};
use crate::util::fs::write_atomic;

const DEFAULT_CONFINEMENT: &str = "strict";
const DEFAULT_GRADE: &str = "stable";

/// Drives one packaging run.
#[derive(Debug)]
pub struct ManifestWriter<'a> {
    ctx: PackagingContext<'a>,
    notices: Notices,
    assets: Vec<GeneratedAsset>,
}

impl<'a> ManifestWriter<'a> {
    pub fn new(ctx: PackagingContext<'a>) -> Self {
        ManifestWriter {
            ctx,
            notices: Notices::new(),
            assets: Vec::new(),
        }
    }

    /// Run every stage and write `prime/meta/snap.yaml`.
    pub fn write(mut self, extracted: &ExtractedMetadata) -> Result<PackagingOutcome, MetaError> {
        let PackagingContext {
            project,
            layout,
            options,
        } = self.ctx;
        tracing::info!("generating snap metadata for {}", project.name);

        let reconciled = reconcile(project, extracted, layout.project_dir(), &mut self.notices)?;

        let wrappers = WrapperGenerator::new(layout, &options.environment, options.use_runner);
        let mut locator = AssetLocator::new(layout);
        locator.migrate_snap_dir()?;
        locator.place_gui(project, &reconciled, &mut self.notices)?;
        locator.place_hooks(&wrappers)?;
        let gadget = locator.place_gadget()?;
        self.assets.extend(locator.into_assets());

        let apps = self.apps(&wrappers)?;
        let hooks = self.hooks()?;

        let structural = assumes::structural_requirements(&apps, &hooks);
        let assumes = assumes::collect(project.assumes(), &structural);

        let manifest = self.manifest(&reconciled, apps, hooks, assumes);
        let mut document = to_mapping(&manifest)?;
        for (key, value) in &reconciled.custom {
            if !document.contains_key(key) {
                document.insert(key.clone(), value.clone());
            }
        }
        passthrough::merge(
            &mut document,
            project.passthrough.as_ref(),
            &project.declared_keys(),
            Scope::TopLevel,
            &mut self.notices,
        )?;

        if project.snap_type == Some(SnapType::Gadget) && gadget.is_none() {
            return Err(MetaError::MissingGadgetDescriptor {
                package: project.name.clone(),
            });
        }

        let manifest_path = layout.manifest_path();
        write_atomic(&manifest_path, &render(&document)?)?;
        tracing::info!("wrote {}", manifest_path.display());

        Ok(PackagingOutcome {
            manifest: document,
            manifest_path,
            assets: self.assets,
            notices: self.notices,
        })
    }

    fn apps(&mut self, wrappers: &WrapperGenerator<'_>) -> Result<Mapping, MetaError> {
        let layout = self.ctx.layout;
        let search_path = search_path_from_environment(
            wrappers.environment(),
            layout.prime_dir(),
            &self.ctx.options.host_path,
        );
        let resolver = CommandResolver::new(layout.prime_dir(), search_path);

        let project = self.ctx.project;
        let mut apps = Mapping::new();
        let mut runner_used = false;
        for (name, spec) in project.apps.iter() {
            let wrapped = wrappers.wrap_app(name, spec, &resolver, &mut self.assets)?;
            runner_used |= wrapped.uses_runner;

            let mut entry = to_mapping(&app_entry(spec, wrapped))?;
            passthrough::merge(
                &mut entry,
                spec.passthrough.as_ref(),
                &spec.declared_keys(),
                Scope::App(name),
                &mut self.notices,
            )?;
            apps.insert(Value::String(name.to_string()), Value::Mapping(entry));
        }

        if runner_used {
            self.assets.push(wrappers.write_runner()?);
        }
        Ok(apps)
    }

    fn hooks(&mut self) -> Result<Mapping, MetaError> {
        let project = self.ctx.project;
        let mut hooks = Mapping::new();
        for (name, spec) in project.hooks.iter() {
            let mut entry = to_mapping(&hook_entry(spec))?;
            passthrough::merge(
                &mut entry,
                spec.passthrough.as_ref(),
                &spec.declared_keys(),
                Scope::Hook(name),
                &mut self.notices,
            )?;
            hooks.insert(Value::String(name.to_string()), Value::Mapping(entry));
        }
        Ok(hooks)
    }

    fn manifest(
        &mut self,
        reconciled: &ReconciledMetadata,
        apps: Mapping,
        hooks: Mapping,
        assumes: Vec<String>,
    ) -> SnapManifest {
        let project = self.ctx.project;
        let passthrough = project.passthrough.as_ref();

        let custom = &reconciled.custom;

        let confinement = self.with_default(
            "confinement",
            project.confinement.clone(),
            DEFAULT_CONFINEMENT,
            custom,
        );
        let grade = self.with_default("grade", reconciled.grade.clone(), DEFAULT_GRADE, custom);

        let mut architectures = project.run_on_architectures();
        if architectures.is_empty() {
            if let Some(adopted) = custom.get("architectures").and_then(string_list) {
                architectures = adopted;
            } else if !passthrough::provides(passthrough, "architectures")
                && !custom.contains_key("architectures")
            {
                architectures.push(self.ctx.options.arch.clone());
            }
        }

        SnapManifest {
            name: project.name.clone(),
            version: reconciled.version.clone(),
            summary: reconciled.summary.clone(),
            description: reconciled.description.clone(),
            title: project.title.clone(),
            license: reconciled.license.clone(),
            snap_type: project.snap_type,
            base: project.base.clone().filter(|base| base != "core"),
            epoch: project.epoch.clone(),
            architectures,
            confinement,
            grade,
            environment: project.environment.clone(),
            layout: project.layout.clone(),
            apps,
            hooks,
            plugs: project.plugs.clone(),
            slots: project.slots.clone(),
            assumes,
        }
    }

    /// `value`, else the adopted value of `key`, else `default` with a notice
    /// when passthrough does not set `key` either.
    fn with_default(
        &mut self,
        key: &str,
        value: Option<String>,
        default: &str,
        custom: &Mapping,
    ) -> Option<String> {
        if value.is_some() {
            return value;
        }
        if let Some(adopted) = custom.get(key) {
            return adopted.as_str().map(str::to_string);
        }
        if passthrough::provides(self.ctx.project.passthrough.as_ref(), key) {
            return None;
        }
        self.notices.info(format!(
            "'{}' property not specified: defaulting to '{}'",
            key, default
        ));
        Some(default.to_string())
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_sequence()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn app_entry(spec: &AppSpec, wrapped: WrappedApp) -> AppEntry {
    AppEntry {
        command: wrapped.command,
        command_chain: wrapped.command_chain,
        completer: spec.completer.clone(),
        daemon: spec.daemon.clone(),
        stop_command: wrapped.stop_command,
        stop_timeout: spec.stop_timeout.clone(),
        stop_mode: spec.stop_mode.clone(),
        refresh_mode: spec.refresh_mode.clone(),
        restart_condition: spec.restart_condition.clone(),
        post_stop_command: spec.post_stop_command.clone(),
        reload_command: spec.reload_command.clone(),
        before: spec.before.clone(),
        after: spec.after.clone(),
        plugs: spec.plugs.clone(),
        slots: spec.slots.clone(),
        sockets: spec.sockets.clone(),
        environment: spec.environment.clone(),
        common_id: spec.common_id.clone(),
        autostart: spec.autostart.clone(),
        timer: spec.timer.clone(),
        watchdog_timeout: spec.watchdog_timeout.clone(),
    }
}

fn hook_entry(spec: &HookSpec) -> HookEntry {
    HookEntry {
        plugs: spec.plugs.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;
    use tracing_test::traced_test;

    use crate::core::layout::ProjectLayout;
    use crate::core::project::ProjectConfig;
    use crate::meta::{create_packaging, PackagingOptions};
    use crate::util::fs::write_script;

    const PROJECT: &str = r#"
name: my-package
version: "1.0"
summary: my summary
description: my description
apps:
  app1:
    command: bin/app1 --verbose
"#;

    struct Fixture {
        tmp: TempDir,
        layout: ProjectLayout,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let layout = ProjectLayout::new(&tmp.path().join("snap/snapcraft.yaml"));
            fs::create_dir_all(layout.assets_dir()).unwrap();
            fs::write(layout.project_file(), PROJECT).unwrap();
            write_script(&layout.prime_dir().join("bin/app1"), "#!/bin/sh\n").unwrap();
            Fixture { tmp, layout }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.tmp.path().join(rel)
        }

        fn run(&self, yaml: &str, options: &PackagingOptions) -> Result<PackagingOutcome, MetaError> {
            let project = ProjectConfig::parse(yaml).unwrap();
            create_packaging(&project, &self.layout, &ExtractedMetadata::default(), options)
        }
    }

    fn options(use_runner: bool) -> PackagingOptions {
        PackagingOptions {
            use_runner,
            arch: "amd64".to_string(),
            environment: vec!["PATH=\"$SNAP/usr/bin:$SNAP/bin:$PATH\"".to_string()],
            host_path: String::new(),
        }
    }

    fn keys(mapping: &Mapping) -> Vec<&str> {
        mapping.keys().filter_map(Value::as_str).collect()
    }

    fn read_manifest(path: &Path) -> Mapping {
        serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[traced_test]
    #[test]
    fn test_defaults_and_key_order() {
        let fx = Fixture::new();
        let yaml = format!("{}base: core\ntitle: My Package\n", PROJECT);

        let outcome = fx.run(&yaml, &options(false)).unwrap();

        assert_eq!(
            keys(&outcome.manifest),
            vec![
                "name",
                "version",
                "summary",
                "description",
                "title",
                "architectures",
                "confinement",
                "grade",
                "apps"
            ]
        );
        assert_eq!(outcome.manifest["confinement"], Value::from("strict"));
        assert_eq!(outcome.manifest["grade"], Value::from("stable"));
        assert_eq!(
            outcome.manifest["architectures"],
            Value::Sequence(vec![Value::from("amd64")])
        );
        assert!(logs_contain("'confinement' property not specified: defaulting to 'strict'"));
        assert!(logs_contain("'grade' property not specified: defaulting to 'stable'"));

        assert_eq!(read_manifest(&outcome.manifest_path), outcome.manifest);
        assert_eq!(outcome.manifest_path, fx.path("prime/meta/snap.yaml"));
    }

    #[test]
    fn test_legacy_app_without_runner() {
        let fx = Fixture::new();

        let outcome = fx.run(PROJECT, &options(false)).unwrap();

        let app = outcome.manifest["apps"]["app1"].as_mapping().unwrap();
        assert_eq!(app["command"], Value::from("command-app1.wrapper"));
        assert!(!app.contains_key("command-chain"));
        assert!(!outcome.manifest.contains_key("assumes"));
        assert!(!fx.layout.runner_path().exists());

        let wrapper = fs::read_to_string(fx.path("prime/command-app1.wrapper")).unwrap();
        assert_eq!(
            wrapper,
            "#!/bin/sh\nexport PATH=\"$SNAP/usr/bin:$SNAP/bin:$PATH\"\nexec \"$SNAP/bin/app1\" --verbose \"$@\"\n"
        );
    }

    #[test]
    fn test_full_app_with_runner_assumes_command_chain() {
        let fx = Fixture::new();
        let yaml = format!(
            "{}    adapter: full\nassumes: [snapd2.45, command-chain]\n",
            PROJECT
        );

        let outcome = fx.run(&yaml, &options(true)).unwrap();

        let app = outcome.manifest["apps"]["app1"].as_mapping().unwrap();
        assert_eq!(app["command"], Value::from("bin/app1 --verbose"));
        assert_eq!(
            app["command-chain"],
            Value::Sequence(vec![Value::from("snap/command-chain/snapsmith-runner")])
        );
        assert_eq!(
            outcome.manifest["assumes"],
            Value::Sequence(vec![Value::from("command-chain"), Value::from("snapd2.45")])
        );
        assert!(fx.layout.runner_path().exists());
        assert!(outcome
            .assets
            .iter()
            .any(|a| a.path == fx.layout.runner_path() && a.executable));
    }

    #[test]
    fn test_legacy_app_with_runner() {
        let fx = Fixture::new();

        let outcome = fx.run(PROJECT, &options(true)).unwrap();

        let app = outcome.manifest["apps"]["app1"].as_mapping().unwrap();
        assert_eq!(
            app["command"],
            Value::from("snap/command-chain/snapsmith-runner $SNAP/command-app1.wrapper")
        );
        let runner = fs::read_to_string(fx.layout.runner_path()).unwrap();
        assert!(runner.contains("export PATH=\"$SNAP/usr/bin:$SNAP/bin:$PATH\"\n"));
        assert!(runner.ends_with("exec \"$@\"\n"));
    }

    #[test]
    fn test_base_and_architectures_from_project() {
        let fx = Fixture::new();
        let yaml = format!(
            "{}base: core22\narchitectures:\n  - build-on: amd64\n    run-on: [arm64]\n",
            PROJECT
        );

        let outcome = fx.run(&yaml, &options(false)).unwrap();

        assert_eq!(outcome.manifest["base"], Value::from("core22"));
        assert_eq!(
            outcome.manifest["architectures"],
            Value::Sequence(vec![Value::from("arm64")])
        );
    }

    #[test]
    fn test_passthrough_overrides_and_suppresses_defaults() {
        let fx = Fixture::new();
        let yaml = format!(
            "{}    passthrough:\n      daemon-scope: user\nhooks:\n  install:\n    passthrough:\n      environment: {{A: b}}\npassthrough:\n  grade: devel\n  architectures: all\n  extra: [1, 2]\n",
            PROJECT
        );

        let outcome = fx.run(&yaml, &options(false)).unwrap();

        assert_eq!(outcome.manifest["grade"], Value::from("devel"));
        assert_eq!(outcome.manifest["architectures"], Value::from("all"));
        let keys = keys(&outcome.manifest);
        assert_eq!(keys.last(), Some(&"extra"));
        assert_eq!(
            outcome.manifest["apps"]["app1"]["daemon-scope"],
            Value::from("user")
        );
        assert!(outcome.manifest["hooks"]["install"]["environment"].is_mapping());
        assert_eq!(outcome.notices.count_containing("'grade' property not specified"), 0);
        assert_eq!(outcome.notices.count_containing("'passthrough' property"), 1);
    }

    #[test]
    fn test_ambiguous_passthrough_leaves_no_manifest() {
        let fx = Fixture::new();
        let yaml = format!("{}confinement: devmode\npassthrough:\n  confinement: classic\n", PROJECT);

        let err = fx.run(&yaml, &options(false)).unwrap_err();

        assert!(matches!(
            err,
            MetaError::AmbiguousPassthroughKey { ref keys, .. } if keys == "'confinement'"
        ));
        assert!(!fx.layout.manifest_path().exists());
    }

    #[test]
    fn test_adopted_custom_keys_before_passthrough() {
        let fx = Fixture::new();
        let project = ProjectConfig::parse(&format!(
            "{}passthrough:\n  zz-extra: 1\n",
            PROJECT
        ))
        .unwrap();
        let mut extracted = ExtractedMetadata::default();
        extracted
            .custom
            .insert("website".to_string(), Value::from("https://example.com"));

        let outcome =
            create_packaging(&project, &fx.layout, &extracted, &options(false)).unwrap();

        let keys = keys(&outcome.manifest);
        let n = keys.len();
        assert_eq!(&keys[n - 2..], &["website", "zz-extra"]);
    }

    #[test]
    fn test_adopted_values_replace_defaults() {
        let fx = Fixture::new();
        let project = ProjectConfig::parse(PROJECT).unwrap();
        let mut extracted = ExtractedMetadata::default();
        extracted
            .custom
            .insert("confinement".to_string(), Value::from("devmode"));
        extracted.custom.insert(
            "architectures".to_string(),
            Value::Sequence(vec![Value::from("arm64"), Value::from("armhf")]),
        );

        let outcome =
            create_packaging(&project, &fx.layout, &extracted, &options(false)).unwrap();

        assert_eq!(outcome.manifest["confinement"], Value::from("devmode"));
        assert_eq!(
            outcome.manifest["architectures"],
            Value::Sequence(vec![Value::from("arm64"), Value::from("armhf")])
        );
        assert_eq!(
            keys(&outcome.manifest),
            vec![
                "name",
                "version",
                "summary",
                "description",
                "architectures",
                "confinement",
                "grade",
                "apps"
            ]
        );
        assert_eq!(
            outcome.notices.count_containing("'confinement' property not specified"),
            0
        );
        assert_eq!(outcome.notices.count_containing("'grade' property not specified"), 1);
    }

    #[test]
    fn test_gadget_requires_descriptor() {
        let fx = Fixture::new();
        let yaml = format!("{}type: gadget\n", PROJECT);

        let err = fx.run(&yaml, &options(false)).unwrap_err();
        assert_eq!(err.to_string(), "the gadget snap \"my-package\" needs a gadget.yaml");

        fs::write(fx.path("gadget.yaml"), "volumes: {}\n").unwrap();
        let outcome = fx.run(&yaml, &options(false)).unwrap();
        assert_eq!(outcome.manifest["type"], Value::from("gadget"));
        assert!(fx.path("prime/meta/gadget.yaml").exists());
    }

    #[test]
    fn test_command_not_found_is_fatal() {
        let fx = Fixture::new();
        let yaml = PROJECT.replace("bin/app1", "bin/missing");

        let err = fx.run(&yaml, &options(false)).unwrap_err();

        assert!(matches!(err, MetaError::CommandNotFound { ref app, .. } if app == "app1"));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let fx = Fixture::new();
        fs::create_dir_all(fx.path("snap/gui")).unwrap();
        fs::write(fx.path("snap/gui/icon.png"), "png").unwrap();

        let first = fx.run(PROJECT, &options(true)).unwrap();
        let first_yaml = fs::read_to_string(&first.manifest_path).unwrap();
        let second = fx.run(PROJECT, &options(true)).unwrap();

        assert_eq!(fs::read_to_string(&second.manifest_path).unwrap(), first_yaml);
        assert_eq!(fs::read_to_string(fx.path("prime/meta/gui/icon.png")).unwrap(), "png");
    }
}
