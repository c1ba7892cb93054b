//! # forge_config
//!
//! Deployment configuration model for cfnforge: YAML deserialization, CIDR
//! arithmetic and fail-fast validation. Builders never see a raw config;
//! they take a [`ValidatedConfig`] as an explicit argument.

pub mod cidr;
pub mod error;
pub mod model;
pub mod validate;

pub use cidr::CidrBlock;
pub use error::{ConfigError, ConfigResult};
pub use model::{AutoscalingConfig, ElbConfig, InstanceConfig, RawConfig, RoleConfig};
pub use validate::{Placement, ValidatedConfig};
