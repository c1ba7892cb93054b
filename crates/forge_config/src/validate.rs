//! Fail-fast configuration validation.
//!
//! [`ValidatedConfig::load`] checks everything the builders rely on, in a
//! deterministic order (scalar fields, then zones, then prefixes, then
//! roles), and aborts on the first violation. Nothing downstream re-checks:
//! a `ValidatedConfig` is the proof that every zone/prefix pair has a
//! distinct subnet block and every role placement names a declared prefix.

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::cidr::CidrBlock;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{RawConfig, RoleConfig};

/// A subnet placement: one zone/prefix pair and its derived `/24` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement<'a> {
    pub zone: &'a str,
    pub prefix: &'a str,
    pub cidr: CidrBlock,
}

/// Validated deployment configuration. Construction is the only way to get
/// one; every component takes it as an explicit argument.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    stack_name: String,
    region: String,
    availability_zones: Vec<String>,
    vpc_cidr: CidrBlock,
    s3_bucket: String,
    s3_code_bucket: String,
    public_prefixes: Vec<String>,
    cidr_map: IndexMap<String, IndexMap<String, u8>>,
    roles: IndexMap<String, RoleConfig>,
}

impl ValidatedConfig {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml(text: &str) -> ConfigResult<Self> {
        let raw: RawConfig = serde_yaml::from_str(text)?;
        Self::load(raw)
    }

    /// Validate a raw configuration, failing on the first violation.
    pub fn load(raw: RawConfig) -> ConfigResult<Self> {
        check_identifier("stack_name", &raw.stack_name)?;
        check_non_empty("region", &raw.region)?;
        check_non_empty("s3_bucket", &raw.s3_bucket)?;
        check_non_empty("s3_code_bucket", &raw.s3_code_bucket)?;

        let vpc_cidr: CidrBlock = raw.private_vpc_cidr.parse()?;
        if vpc_cidr.prefix_len() != 16 {
            return Err(ConfigError::InvalidField {
                field: "private_vpc_cidr".to_string(),
                reason: format!("expected a /16 block, got /{}", vpc_cidr.prefix_len()),
            });
        }

        if raw.availability_zones.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "availability_zones".to_string(),
                reason: "at least one availability zone is required".to_string(),
            });
        }
        for (i, zone) in raw.availability_zones.iter().enumerate() {
            if raw.availability_zones[..i].contains(zone) {
                return Err(ConfigError::DuplicateZone { zone: zone.clone() });
            }
        }

        for (i, prefix) in raw.public_prefixes.iter().enumerate() {
            if raw.public_prefixes[..i].contains(prefix) {
                return Err(ConfigError::InvalidField {
                    field: "public_prefixes".to_string(),
                    reason: format!("prefix '{prefix}' is declared more than once"),
                });
            }
        }

        // Every zone x prefix pair needs a distinct subnet index.
        let mut used: IndexMap<u8, (String, String)> = IndexMap::new();
        for zone in &raw.availability_zones {
            for prefix in &raw.public_prefixes {
                let index = raw
                    .cidr_map
                    .get(zone)
                    .and_then(|prefixes| prefixes.get(prefix))
                    .copied()
                    .ok_or_else(|| ConfigError::MissingCidr {
                        zone: zone.clone(),
                        prefix: prefix.clone(),
                    })?;
                if used
                    .insert(index, (zone.clone(), prefix.clone()))
                    .is_some()
                {
                    return Err(ConfigError::DuplicateSubnetIndex {
                        zone: zone.clone(),
                        prefix: prefix.clone(),
                        index,
                    });
                }
            }
        }

        for (role, config) in &raw.roles {
            check_identifier("roles", role)?;
            if !raw.public_prefixes.contains(&config.instance.subnet) {
                return Err(ConfigError::UnknownSubnet {
                    role: role.clone(),
                    placement: "its instances",
                    subnet: config.instance.subnet.clone(),
                });
            }
            if let Some(elb) = &config.elb {
                if !raw.public_prefixes.contains(&elb.subnet) {
                    return Err(ConfigError::UnknownSubnet {
                        role: role.clone(),
                        placement: "its load balancer",
                        subnet: elb.subnet.clone(),
                    });
                }
            }
            if config.autoscaling.min > config.autoscaling.max {
                return Err(ConfigError::InvalidAutoscaling {
                    role: role.clone(),
                    min: config.autoscaling.min,
                    max: config.autoscaling.max,
                });
            }
            debug!(role, "role configuration validated");
        }

        info!(
            stack = raw.stack_name,
            zones = raw.availability_zones.len(),
            prefixes = raw.public_prefixes.len(),
            roles = raw.roles.len(),
            "configuration validated"
        );

        Ok(Self {
            stack_name: raw.stack_name,
            region: raw.region,
            availability_zones: raw.availability_zones,
            vpc_cidr,
            s3_bucket: raw.s3_bucket,
            s3_code_bucket: raw.s3_code_bucket,
            public_prefixes: raw.public_prefixes,
            cidr_map: raw.cidr_map,
            roles: raw.roles,
        })
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn s3_bucket(&self) -> &str {
        &self.s3_bucket
    }

    pub fn s3_code_bucket(&self) -> &str {
        &self.s3_code_bucket
    }

    pub fn vpc_cidr(&self) -> CidrBlock {
        self.vpc_cidr
    }

    /// Availability zones in declared order.
    pub fn zones(&self) -> &[String] {
        &self.availability_zones
    }

    /// Public subnet prefixes in declared order.
    pub fn prefixes(&self) -> &[String] {
        &self.public_prefixes
    }

    /// Roles in declared order.
    pub fn roles(&self) -> impl Iterator<Item = (&str, &RoleConfig)> {
        self.roles.iter().map(|(name, config)| (name.as_str(), config))
    }

    /// All subnet placements, zone-major (for each zone, each prefix in
    /// declared order). Total: validation guaranteed coverage.
    pub fn placements(&self) -> impl Iterator<Item = Placement<'_>> + '_ {
        self.availability_zones.iter().flat_map(move |zone| {
            self.public_prefixes
                .iter()
                .map(move |prefix| self.placement(zone, prefix))
        })
    }

    /// Placements for one prefix across all zones, in declared zone order.
    pub fn prefix_placements<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = Placement<'a>> + 'a {
        self.availability_zones
            .iter()
            .map(move |zone| self.placement(zone, prefix))
    }

    fn placement<'a>(&'a self, zone: &'a str, prefix: &'a str) -> Placement<'a> {
        // Coverage was proven during load; a miss here is a logic bug.
        let index = self.cidr_map[zone][prefix];
        Placement {
            zone,
            prefix,
            cidr: self.vpc_cidr.subnet(index),
        }
    }
}

fn check_non_empty(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            field: field.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn check_identifier(field: &str, value: &str) -> ConfigResult<()> {
    check_non_empty(field, value)?;
    let mut chars = value.chars();
    let leading_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    if !leading_ok || !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::InvalidField {
            field: field.to_string(),
            reason: format!(
                "'{value}' must be ASCII alphanumeric and start with a letter"
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> String {
        r#"
stack_name: MyStack
region: eu-west-1
availability_zones: [eu-west-1a, eu-west-1b]
private_vpc_cidr: 10.10.0.0/16
s3_bucket: templates-bucket
s3_code_bucket: code-bucket
public_prefixes: [web, api]
cidr_map:
  eu-west-1a: { web: 0, api: 1 }
  eu-west-1b: { web: 2, api: 3 }
roles:
  web:
    instance: { ami: ami-1234, type: t3.small, subnet: web, pp_role: webserver }
    autoscaling: { min: 1, max: 4 }
    elb: { subnet: web, healthcheck: "HTTP:80/healthz" }
  worker:
    instance: { ami: ami-5678, type: t3.large, subnet: api, pp_role: worker }
    autoscaling: { min: 1, max: 2 }
"#
        .to_string()
    }

    #[test]
    fn test_valid_config_loads() {
        let cfg = ValidatedConfig::from_yaml(&sample_yaml()).unwrap();
        assert_eq!(cfg.stack_name(), "MyStack");
        assert_eq!(cfg.zones().len(), 2);
        let roles: Vec<_> = cfg.roles().map(|(name, _)| name).collect();
        assert_eq!(roles, vec!["web", "worker"]);
    }

    #[test]
    fn test_placements_are_distinct_and_contained() {
        let cfg = ValidatedConfig::from_yaml(&sample_yaml()).unwrap();
        let placements: Vec<_> = cfg.placements().collect();
        assert_eq!(placements.len(), 4);
        for (i, a) in placements.iter().enumerate() {
            assert!(cfg.vpc_cidr().contains(&a.cidr));
            for b in &placements[i + 1..] {
                assert_ne!(a.cidr, b.cidr);
            }
        }
    }

    #[test]
    fn test_missing_cidr_entry_fails_first() {
        let yaml = sample_yaml().replace("eu-west-1b: { web: 2, api: 3 }", "eu-west-1b: { api: 3 }");
        let err = ValidatedConfig::from_yaml(&yaml).unwrap_err();
        match err {
            ConfigError::MissingCidr { zone, prefix } => {
                assert_eq!(zone, "eu-west-1b");
                assert_eq!(prefix, "web");
            }
            other => panic!("expected MissingCidr, got {other}"),
        }
    }

    #[test]
    fn test_duplicate_subnet_index_fails() {
        let yaml = sample_yaml().replace("eu-west-1b: { web: 2, api: 3 }", "eu-west-1b: { web: 0, api: 3 }");
        let err = ValidatedConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSubnetIndex { index: 0, .. }));
    }

    #[test]
    fn test_unknown_role_subnet_fails() {
        let yaml = sample_yaml().replace("subnet: api, pp_role: worker", "subnet: db, pp_role: worker");
        let err = ValidatedConfig::from_yaml(&yaml).unwrap_err();
        match err {
            ConfigError::UnknownSubnet { role, subnet, .. } => {
                assert_eq!(role, "worker");
                assert_eq!(subnet, "db");
            }
            other => panic!("expected UnknownSubnet, got {other}"),
        }
    }

    #[test]
    fn test_autoscaling_bounds_checked() {
        let yaml = sample_yaml().replace("min: 1, max: 2", "min: 5, max: 2");
        let err = ValidatedConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidAutoscaling { min: 5, max: 2, .. }
        ));
    }

    #[test]
    fn test_non_16_vpc_cidr_rejected() {
        let yaml = sample_yaml().replace("10.10.0.0/16", "10.10.0.0/20");
        let err = ValidatedConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { .. }));
    }

    #[test]
    fn test_stack_name_must_be_identifier() {
        let yaml = sample_yaml().replace("MyStack", "my-stack");
        let err = ValidatedConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { .. }));
    }

    #[test]
    fn test_duplicate_zone_rejected() {
        let yaml = sample_yaml().replace(
            "[eu-west-1a, eu-west-1b]",
            "[eu-west-1a, eu-west-1a]",
        );
        let err = ValidatedConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateZone { .. }));
    }
}
