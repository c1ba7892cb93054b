//! Raw configuration model as deserialized from YAML.
//!
//! Maps use `IndexMap` so the declared order survives deserialization; role
//! and zone expansion later iterates in that order, which is what makes the
//! emitted templates stable under unrelated edits.

use indexmap::IndexMap;
use serde::Deserialize;

/// Unvalidated deployment configuration. Run through
/// [`crate::ValidatedConfig::load`] before building any template.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    pub stack_name: String,
    pub region: String,
    pub availability_zones: Vec<String>,
    pub private_vpc_cidr: String,
    /// Bucket holding the uploaded nested templates.
    pub s3_bucket: String,
    /// Bucket the deployment agent reads application bundles from.
    pub s3_code_bucket: String,
    #[serde(default)]
    pub public_prefixes: Vec<String>,
    /// zone -> prefix -> third octet of the subnet's /24.
    #[serde(default)]
    pub cidr_map: IndexMap<String, IndexMap<String, u8>>,
    #[serde(default)]
    pub roles: IndexMap<String, RoleConfig>,
}

/// Per-role compute settings. Input data, not graph nodes; consumed when the
/// infra builder instantiates resources for each declared role.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleConfig {
    pub instance: InstanceConfig,
    pub autoscaling: AutoscalingConfig,
    /// Absent means a standalone fleet: the autoscaling group is emitted with
    /// no load balancer attached.
    #[serde(default)]
    pub elb: Option<ElbConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    pub ami: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    /// Public prefix the instances are placed in.
    pub subnet: String,
    pub pp_role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoscalingConfig {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElbConfig {
    /// Public prefix the load balancer is placed in.
    pub subnet: String,
    /// Health check target, e.g. `HTTP:80/healthz`.
    pub healthcheck: String,
}
