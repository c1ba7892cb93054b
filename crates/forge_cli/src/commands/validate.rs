//! Validate command - Load a configuration and resolve every template.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::generate::load_config;

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the deployment configuration (YAML)
    #[arg(short, long)]
    pub config: PathBuf,
}

pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating configuration: {}", args.config.display());

    println!("📋 Validating configuration...");
    let cfg = load_config(&args.config)?;
    println!("   ✅ Configuration valid ({} roles)", cfg.roles().count());

    println!("🔗 Resolving templates...");
    forge_stacks::resolve_all(&cfg)?;
    println!("   ✅ All templates resolve");

    println!();
    println!("✅ All validations passed!");
    Ok(())
}
