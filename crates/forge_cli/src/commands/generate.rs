//! Generate command - Generate one template.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use forge_config::ValidatedConfig;
use forge_stacks::StackKind;

#[derive(Args)]
pub struct GenerateArgs {
    /// Path to the deployment configuration (YAML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Which template to generate (general, network, infra, main)
    #[arg(short, long)]
    pub stack: String,

    /// Write the template here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: GenerateArgs) -> Result<()> {
    let kind = parse_kind(&args.stack)?;
    let cfg = load_config(&args.config)?;

    info!("Generating template: {}", kind.name());
    let document = forge_stacks::emit_stack(kind, &cfg)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, document)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Wrote {}", path.display());
        }
        None => print!("{document}"),
    }

    Ok(())
}

pub(crate) fn parse_kind(name: &str) -> Result<StackKind> {
    StackKind::ALL
        .into_iter()
        .find(|kind| kind.name() == name)
        .with_context(|| format!("Unknown stack '{name}' (expected general, network, infra or main)"))
}

pub(crate) fn load_config(path: &std::path::Path) -> Result<ValidatedConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration {}", path.display()))?;
    ValidatedConfig::from_yaml(&text)
        .with_context(|| format!("Invalid configuration {}", path.display()))
}
