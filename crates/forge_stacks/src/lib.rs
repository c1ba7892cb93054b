//! Stack builders for the four deployable templates.
//!
//! Each builder turns a [`ValidatedConfig`] into a [`Template`]; this crate
//! then resolves and emits them through `forge_graph`. The main template
//! instantiates the other three as nested stacks, so emitting it resolves
//! against the children built from the same configuration.

pub mod error;
pub mod general;
pub mod infra;
pub mod main_stack;
pub mod network;

mod util;

use tracing::info;

use forge_config::ValidatedConfig;
use forge_graph::{emit, resolve, Template, TemplateRegistry};

pub use error::{StackError, StackResult};

/// The deployable templates, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackKind {
    General,
    Network,
    Infra,
    Main,
}

impl StackKind {
    pub const ALL: [StackKind; 4] = [
        StackKind::General,
        StackKind::Network,
        StackKind::Infra,
        StackKind::Main,
    ];

    /// File stem of the emitted template.
    pub fn name(&self) -> &'static str {
        match self {
            StackKind::General => "general",
            StackKind::Network => "network",
            StackKind::Infra => "infra",
            StackKind::Main => "main",
        }
    }
}

/// Build one template from the configuration.
pub fn build(kind: StackKind, cfg: &ValidatedConfig) -> StackResult<Template> {
    let template = match kind {
        StackKind::General => general::build(cfg)?,
        StackKind::Network => network::build(cfg)?,
        StackKind::Infra => infra::build(cfg)?,
        StackKind::Main => main_stack::build(cfg)?,
    };
    info!(stack = kind.name(), nodes = template.len(), "built template");
    Ok(template)
}

/// Build, resolve and emit one template.
pub fn emit_stack(kind: StackKind, cfg: &ValidatedConfig) -> StackResult<String> {
    let template = build(kind, cfg)?;
    let ordered = match kind {
        StackKind::Main => {
            let general = general::build(cfg)?;
            let network = network::build(cfg)?;
            let infra = infra::build(cfg)?;
            let registry = TemplateRegistry::new()
                .with(StackKind::General.name(), &general)
                .with(StackKind::Network.name(), &network)
                .with(StackKind::Infra.name(), &infra);
            resolve(&template, &registry)?
        }
        _ => resolve(&template, &TemplateRegistry::new())?,
    };
    Ok(emit(&ordered)?)
}

/// Emit every template, paired with its file stem.
pub fn emit_all(cfg: &ValidatedConfig) -> StackResult<Vec<(StackKind, String)>> {
    StackKind::ALL
        .iter()
        .map(|&kind| Ok((kind, emit_stack(kind, cfg)?)))
        .collect()
}

/// Resolve every template without emitting, reporting the first failure.
pub fn resolve_all(cfg: &ValidatedConfig) -> StackResult<()> {
    let general = general::build(cfg)?;
    let network = network::build(cfg)?;
    let infra = infra::build(cfg)?;
    let empty = TemplateRegistry::new();
    resolve(&general, &empty)?;
    resolve(&network, &empty)?;
    resolve(&infra, &empty)?;

    let registry = TemplateRegistry::new()
        .with(StackKind::General.name(), &general)
        .with(StackKind::Network.name(), &network)
        .with(StackKind::Infra.name(), &infra);
    resolve(&main_stack::build(cfg)?, &registry)?;
    Ok(())
}
