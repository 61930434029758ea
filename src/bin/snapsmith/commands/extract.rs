//! `snapsmith extract` command

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::ExtractArgs;
use snapsmith::extractors::ExtractorRegistry;
use snapsmith::ops::snap_meta::extract_metadata;
use snapsmith::util::GlobalContext;

pub fn execute(args: ExtractArgs) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let file = ctx.resolve(&args.file);
    let workdir = match &args.workdir {
        Some(dir) => ctx.resolve(dir),
        None => file.parent().unwrap_or(Path::new("/")).to_path_buf(),
    };

    let metadata = extract_metadata(&file, &workdir, &ExtractorRegistry::new())?;

    let rendered = if args.json {
        serde_json::to_string_pretty(&metadata).context("failed to render metadata as JSON")?
    } else {
        serde_yaml::to_string(&metadata).context("failed to render metadata as YAML")?
    };
    println!("{}", rendered.trim_end());

    Ok(())
}
