//! Generate-all command - Generate every template into a directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::generate::load_config;

#[derive(Args)]
pub struct GenerateAllArgs {
    /// Path to the deployment configuration (YAML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Directory the templates are written into
    #[arg(short, long, default_value = "templates")]
    pub output: PathBuf,
}

pub fn execute(args: GenerateAllArgs) -> Result<()> {
    let cfg = load_config(&args.config)?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    for (kind, document) in forge_stacks::emit_all(&cfg)? {
        let path = args.output.join(format!("{}.cfn", kind.name()));
        info!("Writing template: {}", path.display());
        std::fs::write(&path, document)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("✅ Wrote {}", path.display());
    }

    Ok(())
}
