//! Network stack: one public subnet per availability zone and prefix, with
//! routing tables, associations and a default route to the internet gateway.

use tracing::debug;

use forge_config::ValidatedConfig;
use forge_graph::{GraphResult, LogicalId, ParameterSpec, Template, Value};

use crate::util::{export_name, name_tags, props};

/// Build the network nested stack.
pub fn build(cfg: &ValidatedConfig) -> GraphResult<Template> {
    let stack = cfg.stack_name();
    let mut t = Template::new(stack, "Network nested stack");

    let stack_name = t.add_parameter(
        LogicalId::new("stackName")?,
        ParameterSpec::string("Stack name"),
    )?;
    let vpc_id = t.add_parameter(LogicalId::new("vpcId")?, ParameterSpec::string("VPC Id"))?;
    let igw = t.add_parameter(
        LogicalId::new("igw")?,
        ParameterSpec::string("Gateway attachment"),
    )?;

    for placement in cfg.placements() {
        let zone = placement.zone;
        let upper = placement.prefix.to_uppercase();
        debug!(zone, prefix = placement.prefix, cidr = %placement.cidr, "adding public subnet");

        let subnet = t.add_resource(
            LogicalId::from_parts(&["pubsub", zone, &upper])?,
            "AWS::EC2::Subnet",
            props(vec![
                ("VpcId", Value::Ref(vpc_id.clone())),
                ("AvailabilityZone", Value::string(zone)),
                ("CidrBlock", Value::string(placement.cidr.to_string())),
                ("MapPublicIpOnLaunch", Value::bool(false)),
                (
                    "Tags",
                    name_tags(&stack_name, &format!("-{zone}-public-subnet-{upper}")),
                ),
            ]),
        )?;

        let route_table = t.add_resource(
            LogicalId::from_parts(&["pubrttable", zone, &upper])?,
            "AWS::EC2::RouteTable",
            props(vec![
                ("VpcId", Value::Ref(vpc_id.clone())),
                (
                    "Tags",
                    name_tags(
                        &stack_name,
                        &format!("-{zone}-public-route-table-{}", placement.prefix),
                    ),
                ),
            ]),
        )?;

        t.add_resource(
            LogicalId::from_parts(&["pubsubassoc", zone, &upper])?,
            "AWS::EC2::SubnetRouteTableAssociation",
            props(vec![
                ("RouteTableId", Value::Ref(route_table.clone())),
                ("SubnetId", Value::Ref(subnet)),
            ]),
        )?;

        t.add_resource(
            LogicalId::from_parts(&["pubrt", zone, &upper])?,
            "AWS::EC2::Route",
            props(vec![
                ("GatewayId", Value::Ref(igw.clone())),
                ("DestinationCidrBlock", Value::string("0.0.0.0/0")),
                ("RouteTableId", Value::Ref(route_table)),
            ]),
        )?;
    }

    // Per-prefix exports, then the combined list; both prefix-major.
    let mut combined = Vec::new();
    for prefix in cfg.prefixes() {
        let upper = prefix.to_uppercase();
        let mut subnets = Vec::new();
        for placement in cfg.prefix_placements(prefix) {
            let subnet = LogicalId::from_parts(&["pubsub", placement.zone, &upper])?;
            subnets.push(Value::Ref(subnet.clone()));
            combined.push(Value::Ref(subnet));
        }

        let logical = format!("pubsub{upper}");
        t.add_output(
            LogicalId::new(export_name(stack, &logical))?,
            format!("Public Subnet for referencing {prefix}"),
            Value::join(",", subnets),
            Some(export_name(stack, &logical)),
        )?;
    }

    t.add_output(
        LogicalId::new(export_name(stack, "pubsubs"))?,
        "Comma separated public subnets.",
        Value::join(",", combined),
        Some(export_name(stack, "pubsubs")),
    )?;

    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_graph::{emit, resolve, NodeKind, TemplateRegistry};

    fn config(zones: &str, cidr_map: &str) -> ValidatedConfig {
        ValidatedConfig::from_yaml(&format!(
            r#"
stack_name: MyStack
region: eu-west-1
availability_zones: {zones}
private_vpc_cidr: 10.10.0.0/16
s3_bucket: templates
s3_code_bucket: bundles
public_prefixes: [web]
cidr_map:
{cidr_map}
roles: {{}}
"#
        ))
        .unwrap()
    }

    fn two_zone_config() -> ValidatedConfig {
        config(
            "[eu-west-1a, eu-west-1b]",
            "  eu-west-1a: { web: 0 }\n  eu-west-1b: { web: 1 }",
        )
    }

    #[test]
    fn test_network_resolves_and_emits() {
        let t = build(&two_zone_config()).unwrap();
        let ordered = resolve(&t, &TemplateRegistry::new()).unwrap();
        let doc = emit(&ordered).unwrap();
        assert!(doc.contains("AWS::EC2::Subnet"));
    }

    #[test]
    fn test_subnet_cidrs_are_distinct_within_vpc() {
        let cfg = two_zone_config();
        let t = build(&cfg).unwrap();

        let cidrs: Vec<String> = t
            .nodes()
            .filter(|n| {
                matches!(&n.kind, NodeKind::Resource { resource_type }
                    if resource_type == "AWS::EC2::Subnet")
            })
            .map(|n| match &n.attributes["CidrBlock"] {
                Value::Literal(forge_graph::Scalar::String(s)) => s.clone(),
                other => panic!("unexpected CidrBlock value: {other:?}"),
            })
            .collect();

        assert_eq!(cidrs, vec!["10.10.0.0/24", "10.10.1.0/24"]);
        for cidr in &cidrs {
            let block: forge_config::CidrBlock = cidr.parse().unwrap();
            assert!(cfg.vpc_cidr().contains(&block));
        }
    }

    #[test]
    fn test_per_prefix_export_joins_zones() {
        let t = build(&two_zone_config()).unwrap();
        let output = t
            .nodes()
            .find(|n| n.id.as_str() == "MyStackpubsubWEB")
            .expect("per-prefix output exists");
        let refs: Vec<_> = output
            .references()
            .iter()
            .map(|r| r.as_str().to_string())
            .collect();
        assert_eq!(refs, vec!["pubsubeuwest1aWEB", "pubsubeuwest1bWEB"]);
    }
}
