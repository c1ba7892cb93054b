//! CLI command definitions.
//!
//! Each subcommand covers one step of the template workflow: validate a
//! configuration, generate one template, or generate the whole set.

use clap::{Parser, Subcommand};

pub mod generate;
pub mod generate_all;
pub mod validate;

/// cfnforge - typed infrastructure template generator
#[derive(Parser)]
#[command(name = "cfnforge")]
#[command(version, about = "cfnforge - typed infrastructure template generator")]
#[command(long_about = r#"
cfnforge turns a declarative deployment configuration into a set of
CloudFormation templates: a general stack (VPC and deployment plumbing),
a network stack (public subnets and routing), an infrastructure stack
(per-role autoscaling fleets) and a main stack wiring them together.

WORKFLOWS:
  validate      → Load a configuration and resolve every template
  generate      → Generate one template to stdout or a file
  generate-all  → Generate all templates into a directory

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Configuration failure
  4 - Graph error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate one template
    Generate(generate::GenerateArgs),

    /// Generate every template into a directory
    #[command(name = "generate-all")]
    GenerateAll(generate_all::GenerateAllArgs),

    /// Validate a configuration and resolve every template
    Validate(validate::ValidateArgs),
}
