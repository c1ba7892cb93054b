//! End-to-end tests for the build-resolve-emit pipeline.

use forge_config::ValidatedConfig;
use forge_stacks::{emit_all, emit_stack, resolve_all, StackKind};

const SAMPLE: &str = r#"
stack_name: ProdStack
region: eu-west-1
availability_zones: [eu-west-1a, eu-west-1b]
private_vpc_cidr: 10.10.0.0/16
s3_bucket: prod-templates
s3_code_bucket: prod-bundles
public_prefixes: [web, api]
cidr_map:
  eu-west-1a: { web: 0, api: 1 }
  eu-west-1b: { web: 2, api: 3 }
roles:
  frontend:
    instance: { ami: ami-0aaaaaaa, type: t3.small, subnet: web, pp_role: frontend }
    autoscaling: { min: 2, max: 6 }
    elb: { subnet: web, healthcheck: "HTTP:80/healthz" }
  worker:
    instance: { ami: ami-0bbbbbbb, type: t3.large, subnet: api, pp_role: worker }
    autoscaling: { min: 1, max: 3 }
"#;

fn sample() -> ValidatedConfig {
    ValidatedConfig::from_yaml(SAMPLE).unwrap()
}

#[test]
fn test_all_templates_resolve_and_emit() {
    let cfg = sample();
    resolve_all(&cfg).unwrap();

    let emitted = emit_all(&cfg).unwrap();
    assert_eq!(emitted.len(), 4);
    for (kind, doc) in &emitted {
        let parsed: serde_json::Value = serde_json::from_str(doc).unwrap();
        assert_eq!(
            parsed["AWSTemplateFormatVersion"], "2010-09-09",
            "template {}",
            kind.name()
        );
    }
}

#[test]
fn test_emission_is_byte_identical_across_runs() {
    let cfg = sample();
    for kind in StackKind::ALL {
        let first = emit_stack(kind, &cfg).unwrap();
        let second = emit_stack(kind, &cfg).unwrap();
        assert_eq!(first, second, "template {}", kind.name());
    }
}

#[test]
fn test_exports_are_prefixed_and_unique() {
    let cfg = sample();
    let mut seen = std::collections::HashSet::new();
    for kind in [StackKind::General, StackKind::Network] {
        let template = forge_stacks::build(kind, &cfg).unwrap();
        for (_, export) in template.exports() {
            assert!(export.starts_with("ProdStack"), "export {export}");
            assert!(seen.insert(export.to_string()), "duplicate export {export}");
        }
    }
    assert!(seen.contains("ProdStackvpcid"));
    assert!(seen.contains("ProdStackpubsubWEB"));
    assert!(seen.contains("ProdStackpubsubAPI"));
    assert!(seen.contains("ProdStackpubsubs"));
}

#[test]
fn test_subnet_cidrs_are_disjoint() {
    let cfg = sample();
    let doc = emit_stack(StackKind::Network, &cfg).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();

    let resources = parsed["Resources"].as_object().unwrap();
    let mut cidrs: Vec<String> = resources
        .values()
        .filter(|r| r["Type"] == "AWS::EC2::Subnet")
        .map(|r| r["Properties"]["CidrBlock"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(cidrs.len(), 4);
    cidrs.sort();
    cidrs.dedup();
    assert_eq!(cidrs.len(), 4, "subnet blocks must not collide");
}

#[test]
fn test_role_order_follows_declaration() {
    let swapped = SAMPLE.replace(
        "roles:\n  frontend:",
        "roles:\n  aardvark:\n    instance: { ami: ami-0ccccccc, type: t3.micro, subnet: api, pp_role: aardvark }\n    autoscaling: { min: 1, max: 1 }\n  frontend:",
    );
    let cfg = ValidatedConfig::from_yaml(&swapped).unwrap();
    let template = forge_stacks::build(StackKind::Infra, &cfg).unwrap();

    let ids: Vec<&str> = template
        .nodes()
        .map(|n| n.id.as_str())
        .filter(|id| id.starts_with("autoscaling"))
        .collect();
    assert_eq!(
        ids,
        vec![
            "autoscalingAARDVARK",
            "autoscalingFRONTEND",
            "autoscalingWORKER"
        ]
    );
}

#[test]
fn test_main_template_wires_children() {
    let cfg = sample();
    let doc = emit_stack(StackKind::Main, &cfg).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();

    let resources = parsed["Resources"].as_object().unwrap();
    for id in ["vpcnetworkgeneral", "vpcnetworkpublic", "vpcinfra"] {
        assert_eq!(resources[id]["Type"], "AWS::CloudFormation::Stack");
    }

    let infra_params = resources["vpcinfra"]["Properties"]["Parameters"]
        .as_object()
        .unwrap();
    assert_eq!(
        infra_params["pubsubWEB"],
        serde_json::json!({
            "Fn::GetAtt": ["vpcnetworkpublic", "Outputs.ProdStackpubsubWEB"]
        })
    );
    assert_eq!(
        infra_params["defaultSG"],
        serde_json::json!({
            "Fn::GetAtt": ["vpcnetworkgeneral", "Outputs.ProdStackdefaultsg"]
        })
    );
}

#[test]
fn test_parameters_precede_dependent_resources() {
    let cfg = sample();
    let doc = emit_stack(StackKind::General, &cfg).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&doc).unwrap();

    let resources = parsed["Resources"].as_object().unwrap();
    let ids: Vec<&String> = resources.keys().collect();
    let vpc = ids.iter().position(|id| *id == "vpc").unwrap();
    let attach = ids.iter().position(|id| *id == "attachgw").unwrap();
    assert!(vpc < attach);
}
