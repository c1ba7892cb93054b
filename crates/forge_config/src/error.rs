//! Error types for configuration loading and validation.
//!
//! Every variant names the offending field and the reason, so a failed build
//! can be fixed from the message alone. Validation is fail-fast: the first
//! violation found (zones, then prefixes, then roles) aborts the whole build.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration field '{field}' is invalid: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("availability zone '{zone}' is declared more than once")]
    DuplicateZone { zone: String },

    #[error("cidr_map has no entry for zone '{zone}', prefix '{prefix}'")]
    MissingCidr { zone: String, prefix: String },

    #[error(
        "cidr_map index {index} for zone '{zone}', prefix '{prefix}' is already \
         used by another zone/prefix pair"
    )]
    DuplicateSubnetIndex {
        zone: String,
        prefix: String,
        index: u8,
    },

    #[error("role '{role}' places {placement} in undeclared subnet prefix '{subnet}'")]
    UnknownSubnet {
        role: String,
        placement: &'static str,
        subnet: String,
    },

    #[error("role '{role}' has autoscaling min {min} greater than max {max}")]
    InvalidAutoscaling { role: String, min: u32, max: u32 },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}
