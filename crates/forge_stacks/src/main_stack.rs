//! Entry stack: instantiates the general, network and infrastructure
//! templates as nested stacks and wires their exports together.

use forge_config::ValidatedConfig;
use forge_graph::{GraphResult, LogicalId, ParameterSpec, Template, Value};

use crate::util::{export_name, props, pubsub_param};

/// Build the top-level stack referencing the three nested templates.
pub fn build(cfg: &ValidatedConfig) -> GraphResult<Template> {
    let stack = cfg.stack_name();
    let mut t = Template::new(stack, "Main stack");

    let stack_name = t.add_parameter(
        LogicalId::new("stackName")?,
        ParameterSpec::string("Stack name").with_default(stack),
    )?;
    let key_name = t.add_parameter(
        LogicalId::new("keyName")?,
        ParameterSpec::string("SSH Keypair name"),
    )?;
    let environment = t.add_parameter(
        LogicalId::new("environment")?,
        ParameterSpec::string("Environment stack is running in (production,development)")
            .with_allowed_values(["production", "development"])
            .with_default("development"),
    )?;
    let vpc_cidr = t.add_parameter(
        LogicalId::new("privateVpcCidr")?,
        ParameterSpec::string("VPC Cidr Block").with_default(cfg.vpc_cidr().to_string()),
    )?;

    let general_url = t.add_parameter(
        LogicalId::new("generalTemplateURL")?,
        ParameterSpec::string("Location of the general template")
            .with_default(template_url(cfg, "general")),
    )?;
    let network_url = t.add_parameter(
        LogicalId::new("networkTemplateURL")?,
        ParameterSpec::string("Location of the network template")
            .with_default(template_url(cfg, "network")),
    )?;
    let infra_url = t.add_parameter(
        LogicalId::new("infraTemplateURL")?,
        ParameterSpec::string("Location of the infra template")
            .with_default(template_url(cfg, "infra")),
    )?;

    let general = t.add_nested_stack(
        LogicalId::new("vpcnetworkgeneral")?,
        "general",
        Value::Ref(general_url),
        props(vec![
            ("stackName", Value::Ref(stack_name.clone())),
            ("vpcCidr", Value::Ref(vpc_cidr)),
        ]),
    )?;

    let network = t.add_nested_stack(
        LogicalId::new("vpcnetworkpublic")?,
        "network",
        Value::Ref(network_url),
        props(vec![
            ("stackName", Value::Ref(stack_name.clone())),
            (
                "vpcId",
                t.nested_output(&general, export_name(stack, "vpcid")),
            ),
            ("igw", t.nested_output(&general, export_name(stack, "igw"))),
        ]),
    )?;

    let mut infra_params = props(vec![
        ("stackName", Value::Ref(stack_name)),
        ("keyName", Value::Ref(key_name)),
        ("environment", Value::Ref(environment)),
        (
            "iamCodeDeploy",
            t.nested_output(&general, export_name(stack, "iamCodeDeploy")),
        ),
    ]);
    for prefix in cfg.prefixes() {
        let logical = format!("pubsub{}", prefix.to_uppercase());
        infra_params.insert(
            pubsub_param(prefix)?.to_string(),
            t.nested_output(&network, export_name(stack, &logical)),
        );
    }
    infra_params.insert(
        "defaultSG".to_string(),
        t.nested_output(&general, export_name(stack, "defaultsg")),
    );
    infra_params.insert(
        "vpcId".to_string(),
        t.nested_output(&general, export_name(stack, "vpcid")),
    );

    t.add_nested_stack(
        LogicalId::new("vpcinfra")?,
        "infra",
        Value::Ref(infra_url),
        infra_params,
    )?;

    Ok(t)
}

/// Default location of a nested template in the configured bucket.
fn template_url(cfg: &ValidatedConfig, name: &str) -> String {
    format!(
        "https://s3-{}.amazonaws.com/{}/{}.cfn",
        cfg.region(),
        cfg.s3_bucket(),
        name
    )
}
