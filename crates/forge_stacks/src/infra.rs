//! Infrastructure stack: security groups plus, per declared role, a launch
//! configuration, an optional classic load balancer and an autoscaling group.
//!
//! Roles expand in config-declared order. A role without a load balancer is a
//! valid standalone fleet: its autoscaling group is emitted with an empty
//! load-balancer list.

use tracing::debug;

use forge_config::{RoleConfig, ValidatedConfig};
use forge_graph::{GraphResult, LogicalId, ParameterSpec, Template, Value};

use crate::util::{asg_tag, object, props, pubsub_param};

/// Build the infrastructure nested stack.
pub fn build(cfg: &ValidatedConfig) -> GraphResult<Template> {
    let stack = cfg.stack_name();
    let mut t = Template::new(stack, "Infrastructure nested stack");

    let stack_name = t.add_parameter(
        LogicalId::new("stackName")?,
        ParameterSpec::string("Stack name"),
    )?;
    let key_name = t.add_parameter(
        LogicalId::new("keyName")?,
        ParameterSpec::string("SSH Keypair name"),
    )?;
    let environment = t.add_parameter(
        LogicalId::new("environment")?,
        ParameterSpec::string("Environment stack is running in (production,development)")
            .with_allowed_values(["production", "development"]),
    )?;
    let iam_code_deploy = t.add_parameter(
        LogicalId::new("iamCodeDeploy")?,
        ParameterSpec::string("Iam role for codedeploy"),
    )?;

    for prefix in cfg.prefixes() {
        t.add_parameter(
            pubsub_param(prefix)?,
            ParameterSpec::string(format!(
                "Public subnets for {}",
                prefix.to_uppercase()
            )),
        )?;
    }

    let default_sg = t.add_parameter(
        LogicalId::new("defaultSG")?,
        ParameterSpec::string("default VPC Security Group"),
    )?;
    let vpc_id = t.add_parameter(
        LogicalId::new("vpcId")?,
        ParameterSpec::string("VPC Id for referencing"),
    )?;

    let server_sg = t.add_resource(
        LogicalId::new("ServerSecurityGroup")?,
        "AWS::EC2::SecurityGroup",
        props(vec![
            ("VpcId", Value::Ref(vpc_id.clone())),
            ("GroupName", Value::string("ServerSecurityGroup")),
            (
                "GroupDescription",
                Value::string("default Server Security group."),
            ),
            (
                "SecurityGroupIngress",
                Value::List(vec![object(vec![
                    ("IpProtocol", Value::string("-1")),
                    ("CidrIp", Value::string("0.0.0.0/0")),
                ])]),
            ),
            ("Tags", environment_tags(&environment)),
        ]),
    )?;

    // All traffic between instances allowed.
    t.add_resource(
        LogicalId::new("ServerSecurityGroupIngress")?,
        "AWS::EC2::SecurityGroupIngress",
        props(vec![
            ("IpProtocol", Value::string("-1")),
            ("GroupId", Value::Ref(server_sg.clone())),
            ("SourceSecurityGroupId", Value::Ref(server_sg.clone())),
        ]),
    )?;

    let elb_sg = t.add_resource(
        LogicalId::new("ElbSecurityGroup")?,
        "AWS::EC2::SecurityGroup",
        props(vec![
            ("VpcId", Value::Ref(vpc_id)),
            ("GroupName", Value::string("ElbSecurityGroup")),
            (
                "GroupDescription",
                Value::string("default ELB Security group."),
            ),
            (
                "SecurityGroupIngress",
                Value::List(vec![
                    object(vec![
                        ("IpProtocol", Value::string("tcp")),
                        ("FromPort", Value::int(80)),
                        ("ToPort", Value::int(80)),
                        ("CidrIp", Value::string("0.0.0.0/0")),
                    ]),
                    object(vec![
                        ("IpProtocol", Value::string("tcp")),
                        ("FromPort", Value::int(443)),
                        ("ToPort", Value::int(443)),
                        ("CidrIp", Value::string("0.0.0.0/0")),
                    ]),
                ]),
            ),
            ("Tags", environment_tags(&environment)),
        ]),
    )?;

    for (role, role_cfg) in cfg.roles() {
        debug!(role, "adding role resources");
        add_role(
            &mut t,
            cfg,
            role,
            role_cfg,
            &RoleParams {
                stack_name: &stack_name,
                key_name: &key_name,
                environment: &environment,
                iam_code_deploy: &iam_code_deploy,
                default_sg: &default_sg,
                server_sg: &server_sg,
                elb_sg: &elb_sg,
            },
        )?;
    }

    Ok(t)
}

struct RoleParams<'a> {
    stack_name: &'a LogicalId,
    key_name: &'a LogicalId,
    environment: &'a LogicalId,
    iam_code_deploy: &'a LogicalId,
    default_sg: &'a LogicalId,
    server_sg: &'a LogicalId,
    elb_sg: &'a LogicalId,
}

fn add_role(
    t: &mut Template,
    cfg: &ValidatedConfig,
    role: &str,
    role_cfg: &RoleConfig,
    params: &RoleParams<'_>,
) -> GraphResult<()> {
    let upper = role.to_uppercase();

    let launch_config = t.add_resource(
        LogicalId::from_parts(&["launchconfig", &upper])?,
        "AWS::AutoScaling::LaunchConfiguration",
        props(vec![
            ("ImageId", Value::string(role_cfg.instance.ami.as_str())),
            (
                "SecurityGroups",
                Value::List(vec![
                    Value::Ref(params.default_sg.clone()),
                    Value::Ref(params.server_sg.clone()),
                ]),
            ),
            (
                "InstanceType",
                Value::string(role_cfg.instance.instance_type.as_str()),
            ),
            ("IamInstanceProfile", Value::Ref(params.iam_code_deploy.clone())),
            ("AssociatePublicIpAddress", Value::bool(true)),
            ("KeyName", Value::Ref(params.key_name.clone())),
            (
                "BlockDeviceMappings",
                Value::List(vec![object(vec![
                    ("DeviceName", Value::string("/dev/xvda")),
                    (
                        "Ebs",
                        object(vec![
                            ("DeleteOnTermination", Value::bool(true)),
                            ("VolumeType", Value::string("gp2")),
                            ("VolumeSize", Value::int(10)),
                        ]),
                    ),
                ])]),
            ),
            ("UserData", agent_user_data(cfg.region())),
        ]),
    )?;

    let load_balancer = match &role_cfg.elb {
        Some(elb) => {
            let subnet_param = pubsub_param(&elb.subnet)?;
            let elb_resource = t.add_resource(
                LogicalId::from_parts(&["elb", &upper])?,
                "AWS::ElasticLoadBalancing::LoadBalancer",
                props(vec![
                    (
                        "Subnets",
                        Value::split(",", Value::Ref(subnet_param)),
                    ),
                    (
                        "Listeners",
                        Value::List(vec![object(vec![
                            ("LoadBalancerPort", Value::int(80)),
                            ("InstancePort", Value::int(80)),
                            ("Protocol", Value::string("HTTP")),
                        ])]),
                    ),
                    (
                        "SecurityGroups",
                        Value::List(vec![
                            Value::Ref(params.default_sg.clone()),
                            Value::Ref(params.elb_sg.clone()),
                        ]),
                    ),
                    (
                        "HealthCheck",
                        object(vec![
                            ("Target", Value::string(elb.healthcheck.as_str())),
                            ("HealthyThreshold", Value::string("2")),
                            ("UnhealthyThreshold", Value::string("2")),
                            ("Interval", Value::string("10")),
                            ("Timeout", Value::string("5")),
                        ]),
                    ),
                    (
                        "ConnectionDrainingPolicy",
                        object(vec![
                            ("Enabled", Value::bool(true)),
                            ("Timeout", Value::int(300)),
                        ]),
                    ),
                    ("CrossZone", Value::bool(true)),
                    (
                        "Tags",
                        Value::List(vec![
                            object(vec![
                                ("Key", Value::string("Environment")),
                                ("Value", Value::Ref(params.environment.clone())),
                            ]),
                            object(vec![
                                ("Key", Value::string("Service")),
                                ("Value", Value::string(role)),
                            ]),
                        ]),
                    ),
                ]),
            )?;
            vec![Value::Ref(elb_resource)]
        }
        // Standalone fleet: no load balancer attached.
        None => Vec::new(),
    };

    let instance_subnet = pubsub_param(&role_cfg.instance.subnet)?;
    t.add_resource(
        LogicalId::from_parts(&["autoscaling", &upper])?,
        "AWS::AutoScaling::AutoScalingGroup",
        props(vec![
            (
                "VPCZoneIdentifier",
                Value::split(",", Value::Ref(instance_subnet)),
            ),
            ("LaunchConfigurationName", Value::Ref(launch_config)),
            ("LoadBalancerNames", Value::List(load_balancer)),
            ("TargetGroupARNs", Value::List(Vec::new())),
            ("MinSize", Value::int(i64::from(role_cfg.autoscaling.min))),
            ("MaxSize", Value::int(i64::from(role_cfg.autoscaling.max))),
            (
                "Tags",
                Value::List(vec![
                    asg_tag("Environment", Value::Ref(params.environment.clone())),
                    asg_tag(
                        "Name",
                        Value::join(
                            "-",
                            vec![
                                Value::Ref(params.stack_name.clone()),
                                Value::string(role),
                            ],
                        ),
                    ),
                    asg_tag("Service", Value::string(role)),
                    asg_tag("Role", Value::string(role)),
                    asg_tag("pp_role", Value::string(role_cfg.instance.pp_role.as_str())),
                ]),
            ),
        ]),
    )?;

    Ok(())
}

/// User data installing the regional deployment agent on first boot.
fn agent_user_data(region: &str) -> Value {
    Value::Base64(Box::new(Value::join(
        "",
        vec![
            Value::string("#!/bin/bash\n"),
            Value::string("sudo apt-get install wget\n"),
            Value::string("wget https://aws-codedeploy-"),
            Value::string(region),
            Value::string(".s3.amazonaws.com/latest/install\n"),
            Value::string("chmod +x ./install\n"),
            Value::string("sudo ./install auto\n"),
        ],
    )))
}

fn environment_tags(environment: &LogicalId) -> Value {
    Value::List(vec![object(vec![
        ("Key", Value::string("Environment")),
        ("Value", Value::Ref(environment.clone())),
    ])])
}
