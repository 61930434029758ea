//! Launcher script generation.
//!
//! Legacy apps get one POSIX wrapper per command. Full apps keep their command
//! and get the shared runner prepended to their command-chain. The runner is
//! only written when some app ends up using it.

use std::io::Read;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::core::layout::{ProjectLayout, RUNNER_PATH};
use crate::core::project::{Adapter, AppSpec};
use crate::meta::command::{CommandResolver, ResolvedCommand};
use crate::meta::errors::MetaError;
use crate::meta::GeneratedAsset;
use crate::util::fs::{ensure_executable, write_script};

/// Command and chain an app ends up with in snap.yaml.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrappedApp {
    pub command: String,
    pub command_chain: Vec<String>,
    pub stop_command: Option<String>,
    /// Whether the runner is referenced
    pub uses_runner: bool,
}

/// Writes wrappers, the runner and hook launchers into the prime directory.
#[derive(Debug)]
pub struct WrapperGenerator<'a> {
    layout: &'a ProjectLayout,
    environment: Vec<String>,
    use_runner: bool,
    install_dir_re: Regex,
}

impl<'a> WrapperGenerator<'a> {
    /// `environment` holds runtime environment lines as produced by the build.
    pub fn new(layout: &'a ProjectLayout, environment: &[String], use_runner: bool) -> Self {
        let parts = regex::escape(&layout.parts_dir().to_string_lossy());
        let install_dir_re = Regex::new(&format!(r"{}/[^/\s:]+/install", parts))
            .expect("escaped parts path is a valid regex");

        let mut generator = WrapperGenerator {
            layout,
            environment: Vec::new(),
            use_runner,
            install_dir_re,
        };
        let rewritten: Vec<String> = environment
            .iter()
            .map(|line| generator.rewrite_build_paths(line))
            .collect();
        generator.environment = rewritten;
        generator
    }

    /// Runtime environment with build paths replaced by `$SNAP`.
    pub fn environment(&self) -> &[String] {
        &self.environment
    }

    pub fn uses_runner(&self) -> bool {
        self.use_runner
    }

    /// Replace part install, stage and prime directories with `$SNAP`.
    pub fn rewrite_build_paths(&self, line: &str) -> String {
        let line = self.install_dir_re.replace_all(line, "$$SNAP");
        let stage = self.layout.stage_dir().to_string_lossy();
        let prime = self.layout.prime_dir().to_string_lossy();
        line.replace(stage.as_ref(), "$SNAP")
            .replace(prime.as_ref(), "$SNAP")
    }

    fn export_lines(&self) -> String {
        self.environment
            .iter()
            .map(|line| {
                let line = line.trim();
                if line.starts_with("export ") {
                    format!("{}\n", line)
                } else {
                    format!("export {}\n", line)
                }
            })
            .collect()
    }

    /// Write `snap/command-chain/snapsmith-runner`.
    pub fn write_runner(&self) -> Result<GeneratedAsset, MetaError> {
        let path = self.layout.runner_path();
        let contents = format!(
            "#!/bin/sh\n{}export LD_LIBRARY_PATH=$SNAP_LIBRARY_PATH:$LD_LIBRARY_PATH\nexec \"$@\"\n",
            self.export_lines()
        );
        write_script(&path, &contents)?;
        tracing::debug!("wrote runner {}", path.display());
        Ok(GeneratedAsset::executable(path))
    }

    /// Produce the snap.yaml command of `app` and write whatever it needs.
    pub fn wrap_app(
        &self,
        app: &str,
        spec: &AppSpec,
        resolver: &CommandResolver,
        assets: &mut Vec<GeneratedAsset>,
    ) -> Result<WrappedApp, MetaError> {
        for item in spec.command_chain() {
            resolver.resolve_chain_entry(app, item)?;
        }

        match spec.adapter() {
            Adapter::Full => {
                resolver.resolve(app, &spec.command)?;
                let mut command_chain = Vec::new();
                if self.use_runner {
                    command_chain.push(RUNNER_PATH.to_string());
                }
                command_chain.extend(spec.command_chain().iter().cloned());
                Ok(WrappedApp {
                    command: spec.command.clone(),
                    command_chain,
                    stop_command: spec.stop_command.clone(),
                    uses_runner: self.use_runner,
                })
            }
            Adapter::Legacy => {
                let command = resolver.resolve(app, &spec.command)?;
                let wrapper = format!("command-{}.wrapper", app);
                assets.push(self.write_wrapper(&wrapper, &command)?);

                let stop_command = match &spec.stop_command {
                    Some(raw) => {
                        let stop = resolver.resolve(app, raw)?;
                        let stop_wrapper = format!("stop-command-{}.wrapper", app);
                        assets.push(self.write_wrapper(&stop_wrapper, &stop)?);
                        Some(self.legacy_command(&stop_wrapper))
                    }
                    None => None,
                };

                Ok(WrappedApp {
                    command: self.legacy_command(&wrapper),
                    command_chain: spec.command_chain().to_vec(),
                    stop_command,
                    uses_runner: self.use_runner,
                })
            }
        }
    }

    fn legacy_command(&self, wrapper: &str) -> String {
        if self.use_runner {
            format!("{} $SNAP/{}", RUNNER_PATH, wrapper)
        } else {
            wrapper.to_string()
        }
    }

    /// Write a wrapper script named `name` at the prime root.
    pub fn write_wrapper(
        &self,
        name: &str,
        command: &ResolvedCommand,
    ) -> Result<GeneratedAsset, MetaError> {
        let path = self.layout.prime_dir().join(name);
        let mut contents = String::from("#!/bin/sh\n");
        if !self.use_runner {
            contents.push_str(&self.export_lines());
        }
        contents.push_str(&self.exec_line(command));

        write_script(&path, &contents)?;
        tracing::debug!("wrote wrapper {}", path.display());
        Ok(GeneratedAsset::executable(path))
    }

    fn exec_line(&self, command: &ResolvedCommand) -> String {
        let mut line = String::from("exec ");
        if let Some(interpreter) = command
            .package_path()
            .and_then(|rel| self.install_interpreter(&self.layout.prime_dir().join(rel)))
        {
            line.push_str(&format!("\"$SNAP/{}\" ", interpreter.display()));
        }
        line.push_str(&format!("\"{}\"", command.launcher_path()));
        if !command.arguments.is_empty() {
            line.push(' ');
            line.push_str(&command.arguments);
        }
        line.push_str(" \"$@\"\n");
        line
    }

    /// Interpreter of `path` relative to its part's install directory, when
    /// its shebang points into one.
    fn install_interpreter(&self, path: &Path) -> Option<PathBuf> {
        let first_line = read_first_line(path)?;
        let shebang = std::str::from_utf8(first_line.strip_prefix(b"#!")?).ok()?;
        let interpreter = shebang.split_whitespace().next()?;
        let found = self.install_dir_re.find(interpreter)?;
        if found.start() != 0 {
            return None;
        }
        let rest = interpreter[found.end()..].trim_start_matches('/');
        (!rest.is_empty()).then(|| PathBuf::from(rest))
    }

    /// Write the `meta/hooks/<name>` launcher for a hook a part installed
    /// under `snap/hooks/`.
    pub fn write_hook_wrapper(&self, name: &str) -> Result<GeneratedAsset, MetaError> {
        ensure_executable(&self.layout.prime_hooks_dir().join(name))?;

        let path = self.layout.meta_hooks_dir().join(name);
        let contents = format!("#!/bin/sh\nexec \"$SNAP/snap/hooks/{}\"\n", name);
        write_script(&path, &contents)?;
        tracing::debug!("wrote hook launcher {}", path.display());
        Ok(GeneratedAsset::executable(path))
    }
}

fn read_first_line(path: &Path) -> Option<Vec<u8>> {
    let mut file = std::fs::File::open(path).ok()?;
    let mut buf = [0u8; 256];
    let n = file.read(&mut buf).ok()?;
    let head = &buf[..n];
    let end = head.iter().position(|&b| b == b'\n').unwrap_or(head.len());
    Some(head[..end].to_vec())
}
