//! `snapsmith meta` command

use anyhow::Result;

use crate::cli::MetaArgs;
use snapsmith::extractors::ExtractorRegistry;
use snapsmith::ops::snap_meta::{generate_meta, MetaOptions};
use snapsmith::util::config::RunnerPolicy;
use snapsmith::util::GlobalContext;

pub fn execute(args: MetaArgs) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    if let Some(dir) = &args.project {
        ctx = GlobalContext::with_cwd(ctx.resolve(dir))?;
    }

    let project_file = ctx.find_project_file()?;
    let config = ctx.config();

    // CLI overrides config
    let runner = args
        .runner
        .as_deref()
        .map(str::parse::<RunnerPolicy>)
        .transpose()?;

    let opts = MetaOptions {
        prime_dir: args.prime.map(|p| ctx.resolve(&p)),
        stage_dir: args.stage.map(|p| ctx.resolve(&p)),
        parts_dir: args.parts.map(|p| ctx.resolve(&p)),
        runner,
        arch: args.arch,
        set_version: args.set_version,
        set_grade: args.set_grade,
        environment: (!args.environment.is_empty()).then_some(args.environment),
    };

    let outcome = generate_meta(&project_file, &config, &opts, &ExtractorRegistry::new())?;

    for asset in &outcome.assets {
        tracing::debug!("generated {}", asset.path.display());
    }
    let warnings = outcome.notices.warnings().count();
    eprintln!(
        "    Finished {} ({} assets, {} warning{})",
        outcome.manifest_path.display(),
        outcome.assets.len(),
        warnings,
        if warnings == 1 { "" } else { "s" }
    );

    Ok(())
}
