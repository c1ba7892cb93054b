//! General stack: VPC, internet gateway and the CodeDeploy plumbing
//! (roles, instance profile, application, one deployment group per role).

use tracing::debug;

use forge_config::ValidatedConfig;
use forge_graph::{GraphResult, LogicalId, ParameterSpec, Template, Value};

use crate::util::{export_name, name_tags, object, props};

/// Regions with an AWS-managed CodeDeploy agent bucket.
const CODEDEPLOY_REGIONS: &[&str] = &[
    "us-east-2",
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-central-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-south-1",
    "sa-east-1",
];

/// Build the general nested stack.
pub fn build(cfg: &ValidatedConfig) -> GraphResult<Template> {
    let stack = cfg.stack_name();
    let mut t = Template::new(stack, "Network general stack");

    let stack_name = t.add_parameter(
        LogicalId::new("stackName")?,
        ParameterSpec::string("Stack name"),
    )?;
    let vpc_cidr = t.add_parameter(
        LogicalId::new("vpcCidr")?,
        ParameterSpec::string("VPC Cidr Block").with_default(cfg.vpc_cidr().to_string()),
    )?;

    let vpc = t.add_resource(
        LogicalId::new("vpc")?,
        "AWS::EC2::VPC",
        props(vec![
            ("EnableDnsSupport", Value::bool(true)),
            ("CidrBlock", Value::Ref(vpc_cidr.clone())),
            ("EnableDnsHostnames", Value::bool(true)),
            ("Tags", name_tags(&stack_name, "-vpc")),
        ]),
    )?;

    let igw = t.add_resource(
        LogicalId::new("igw")?,
        "AWS::EC2::InternetGateway",
        props(vec![("Tags", name_tags(&stack_name, "-internet-gateway"))]),
    )?;

    t.add_resource(
        LogicalId::new("attachgw")?,
        "AWS::EC2::VPCGatewayAttachment",
        props(vec![
            ("VpcId", Value::Ref(vpc.clone())),
            ("InternetGatewayId", Value::Ref(igw.clone())),
        ]),
    )?;

    let service_role = t.add_resource(
        LogicalId::from_parts(&[stack, "CodeDeployServiceIAMRole"])?,
        "AWS::IAM::Role",
        props(vec![
            (
                "AssumeRolePolicyDocument",
                object(vec![
                    ("Version", Value::string("2012-10-17")),
                    (
                        "Statement",
                        Value::List(vec![object(vec![
                            ("Sid", Value::string("CodeDeployTrustPolicy")),
                            ("Effect", Value::string("Allow")),
                            (
                                "Principal",
                                object(vec![(
                                    "Service",
                                    Value::List(vec![Value::string("codedeploy.amazonaws.com")]),
                                )]),
                            ),
                            ("Action", Value::string("sts:AssumeRole")),
                        ])]),
                    ),
                ]),
            ),
            ("Path", Value::string("/")),
            (
                "ManagedPolicyArns",
                Value::List(vec![Value::string(
                    "arn:aws:iam::aws:policy/service-role/AWSCodeDeployRole",
                )]),
            ),
        ]),
    )?;

    let instance_role_name = export_name(stack, "CodeDeployInstanceIAMRole");
    let instance_role = t.add_resource(
        LogicalId::new(instance_role_name.clone())?,
        "AWS::IAM::Role",
        props(vec![
            ("RoleName", Value::string(instance_role_name.clone())),
            (
                "Policies",
                Value::List(vec![object(vec![
                    ("PolicyName", Value::string(instance_role_name.clone())),
                    ("PolicyDocument", instance_policy_document(cfg)),
                ])]),
            ),
            (
                "AssumeRolePolicyDocument",
                object(vec![
                    ("Version", Value::string("2012-10-17")),
                    (
                        "Statement",
                        Value::List(vec![object(vec![
                            ("Sid", Value::string("")),
                            ("Effect", Value::string("Allow")),
                            (
                                "Principal",
                                object(vec![("Service", Value::string("ec2.amazonaws.com"))]),
                            ),
                            ("Action", Value::string("sts:AssumeRole")),
                        ])]),
                    ),
                ]),
            ),
        ]),
    )?;

    let instance_profile = t.add_resource(
        LogicalId::from_parts(&[stack, "CodeDeployInstanceProfile"])?,
        "AWS::IAM::InstanceProfile",
        props(vec![(
            "Roles",
            Value::List(vec![Value::Ref(instance_role.clone())]),
        )]),
    )?;

    let application = t.add_resource(
        LogicalId::new(stack)?,
        "AWS::CodeDeploy::Application",
        props(vec![
            ("ApplicationName", Value::string(stack)),
            ("ComputePlatform", Value::string("Server")),
        ]),
    )?;

    for (role, _) in cfg.roles() {
        debug!(role, "adding deployment group");
        t.add_resource_depending_on(
            LogicalId::from_parts(&[stack, role, "DeploymentGroup"])?,
            "AWS::CodeDeploy::DeploymentGroup",
            props(vec![
                ("DeploymentGroupName", Value::string(capitalize(role))),
                ("ApplicationName", Value::string(stack)),
                (
                    "AutoRollbackConfiguration",
                    object(vec![
                        ("Enabled", Value::bool(true)),
                        (
                            "Events",
                            Value::List(vec![Value::string("DEPLOYMENT_FAILURE")]),
                        ),
                    ]),
                ),
                (
                    "DeploymentStyle",
                    object(vec![(
                        "DeploymentOption",
                        Value::string("WITHOUT_TRAFFIC_CONTROL"),
                    )]),
                ),
                (
                    "ServiceRoleArn",
                    Value::get_att(service_role.clone(), "Arn"),
                ),
                (
                    "Ec2TagSet",
                    object(vec![(
                        "Ec2TagSetList",
                        Value::List(vec![object(vec![(
                            "Ec2TagGroup",
                            Value::List(vec![object(vec![
                                ("Key", Value::string("Role")),
                                ("Type", Value::string("KEY_AND_VALUE")),
                                ("Value", Value::string(role)),
                            ])]),
                        )])]),
                    )]),
                ),
            ]),
            vec![application.clone()],
        )?;
    }

    t.add_output(
        LogicalId::new(export_name(stack, "vpcid"))?,
        "VPC ID of a stack.",
        Value::Ref(vpc.clone()),
        Some(export_name(stack, "vpcid")),
    )?;
    t.add_output(
        LogicalId::new(export_name(stack, "vpccidr"))?,
        "VPC Cidr mask.",
        Value::Ref(vpc_cidr),
        Some(export_name(stack, "vpccidr")),
    )?;
    t.add_output(
        LogicalId::new(export_name(stack, "defaultsg"))?,
        "Default Security group id.",
        Value::get_att(vpc, "DefaultSecurityGroup"),
        Some(export_name(stack, "defaultsg")),
    )?;
    t.add_output(
        LogicalId::new(export_name(stack, "igw"))?,
        "VPC GW ID of a stack.",
        Value::Ref(igw),
        Some(export_name(stack, "igw")),
    )?;
    t.add_output(
        LogicalId::new(export_name(stack, "iamCodeDeploy"))?,
        "Instance profile for the deployment agent.",
        Value::Ref(instance_profile),
        Some(export_name(stack, "iamCodeDeploy")),
    )?;

    Ok(t)
}

/// S3 read access to the application bundle bucket and the regional agent
/// buckets, plus the instance discovery calls the agent makes.
fn instance_policy_document(cfg: &ValidatedConfig) -> Value {
    let mut bundle_arns = vec![
        Value::string(format!("arn:aws:s3:::{}", cfg.s3_code_bucket())),
        Value::string(format!("arn:aws:s3:::{}/*", cfg.s3_code_bucket())),
    ];
    for region in CODEDEPLOY_REGIONS {
        bundle_arns.push(Value::string(format!(
            "arn:aws:s3:::aws-codedeploy-{region}/*"
        )));
    }

    object(vec![
        ("Version", Value::string("2012-10-17")),
        (
            "Statement",
            Value::List(vec![
                object(vec![
                    ("Effect", Value::string("Allow")),
                    (
                        "Action",
                        Value::List(vec![Value::string("s3:Get*"), Value::string("s3:List*")]),
                    ),
                    ("Resource", Value::List(bundle_arns)),
                ]),
                object(vec![
                    (
                        "Action",
                        Value::List(vec![
                            Value::string("opsworks-cm:AssociateNode"),
                            Value::string("opsworks-cm:DescribeNodeAssociationStatus"),
                            Value::string("opsworks-cm:DescribeServers"),
                            Value::string("ec2:DescribeTags"),
                        ]),
                    ),
                    ("Resource", Value::string("*")),
                    ("Effect", Value::string("Allow")),
                ]),
            ]),
        ),
    ])
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
