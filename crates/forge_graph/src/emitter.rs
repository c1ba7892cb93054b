//! Template emission to CloudFormation JSON.
//!
//! Emission is a pure function of a resolved template: the resolver fixes the
//! node order and serde_json's `preserve_order` keeps map keys in insertion
//! order, so identical input always yields byte-identical output. Constructs
//! that the pinned format version cannot represent abort the whole document; a
//! template is never partially emitted.

use serde_json::{json, Map, Value as Json};
use tracing::debug;

use crate::error::EmitError;
use crate::id::LogicalId;
use crate::node::{Node, NodeKind, ParameterSpec};
use crate::resolver::OrderedTemplate;
use crate::value::{Scalar, Value};

/// Serialize a resolved template. Sections appear in a fixed order; nodes
/// within each section follow the resolver's dependency order.
pub fn emit(ordered: &OrderedTemplate<'_>) -> Result<String, EmitError> {
    let template = ordered.template();
    debug!(template = template.name(), "emitting template");

    let mut parameters = Map::new();
    let mut resources = Map::new();
    let mut outputs = Map::new();

    for node in ordered.nodes() {
        match &node.kind {
            NodeKind::Parameter(spec) => {
                parameters.insert(node.id.to_string(), render_parameter(spec));
            }
            NodeKind::Resource { resource_type } => {
                resources.insert(node.id.to_string(), render_resource(node, resource_type)?);
            }
            NodeKind::Output { description, export } => {
                outputs.insert(
                    node.id.to_string(),
                    render_output(node, description.as_deref(), export.as_deref())?,
                );
            }
        }
    }

    let mut doc = Map::new();
    if let Some(version) = template.format_version() {
        doc.insert("AWSTemplateFormatVersion".to_string(), json!(version));
    }
    doc.insert("Description".to_string(), json!(template.description()));
    if !parameters.is_empty() {
        doc.insert("Parameters".to_string(), Json::Object(parameters));
    }
    if !resources.is_empty() {
        doc.insert("Resources".to_string(), Json::Object(resources));
    }
    if !outputs.is_empty() {
        doc.insert("Outputs".to_string(), Json::Object(outputs));
    }

    let mut text = serde_json::to_string_pretty(&Json::Object(doc))?;
    text.push('\n');
    Ok(text)
}

fn render_parameter(spec: &ParameterSpec) -> Json {
    let mut out = Map::new();
    out.insert("Type".to_string(), json!(spec.param_type));
    if let Some(description) = &spec.description {
        out.insert("Description".to_string(), json!(description));
    }
    if let Some(default) = &spec.default {
        out.insert("Default".to_string(), render_scalar(default));
    }
    if !spec.allowed_values.is_empty() {
        out.insert(
            "AllowedValues".to_string(),
            Json::Array(spec.allowed_values.iter().map(render_scalar).collect()),
        );
    }
    Json::Object(out)
}

fn render_resource(node: &Node, resource_type: &str) -> Result<Json, EmitError> {
    let mut out = Map::new();
    out.insert("Type".to_string(), json!(resource_type));
    if !node.attributes.is_empty() {
        let mut properties = Map::new();
        for (key, value) in &node.attributes {
            properties.insert(key.clone(), render_value(&node.id, value)?);
        }
        out.insert("Properties".to_string(), Json::Object(properties));
    }
    if !node.depends_on.is_empty() {
        let rendered = if node.depends_on.len() == 1 {
            json!(node.depends_on[0].as_str())
        } else {
            Json::Array(node.depends_on.iter().map(|d| json!(d.as_str())).collect())
        };
        out.insert("DependsOn".to_string(), rendered);
    }
    Ok(Json::Object(out))
}

fn render_output(
    node: &Node,
    description: Option<&str>,
    export: Option<&str>,
) -> Result<Json, EmitError> {
    let Some(value) = node.attributes.get("Value") else {
        return Err(EmitError::UnsupportedValue {
            id: node.id.to_string(),
            reason: "output has no value".to_string(),
        });
    };

    let mut out = Map::new();
    if let Some(description) = description {
        out.insert("Description".to_string(), json!(description));
    }
    out.insert("Value".to_string(), render_value(&node.id, value)?);
    if let Some(export) = export {
        out.insert(
            "Export".to_string(),
            json!({ "Name": { "Fn::Sub": export } }),
        );
    }
    Ok(Json::Object(out))
}

fn render_scalar(scalar: &Scalar) -> Json {
    match scalar {
        Scalar::String(s) => json!(s),
        Scalar::Int(i) => json!(i),
        Scalar::Bool(b) => json!(b),
    }
}

fn render_value(id: &LogicalId, value: &Value) -> Result<Json, EmitError> {
    Ok(match value {
        Value::Literal(scalar) => render_scalar(scalar),
        Value::List(items) => Json::Array(
            items
                .iter()
                .map(|item| render_value(id, item))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(entries) => {
            let mut out = Map::new();
            for (key, entry) in entries {
                out.insert(key.clone(), render_value(id, entry)?);
            }
            Json::Object(out)
        }
        Value::Ref(target) => json!({ "Ref": target.as_str() }),
        Value::GetAtt { target, attribute } => {
            json!({ "Fn::GetAtt": [target.as_str(), attribute] })
        }
        Value::Join { separator, parts } => {
            let rendered: Vec<Json> = parts
                .iter()
                .map(|part| render_value(id, part))
                .collect::<Result<_, _>>()?;
            json!({ "Fn::Join": [separator, rendered] })
        }
        Value::Split { separator, source } => {
            json!({ "Fn::Split": [separator, render_value(id, source)?] })
        }
        Value::Base64(inner) => json!({ "Fn::Base64": render_value(id, inner)? }),
        Value::Lookup { map, keys } => {
            if keys.len() != 2 {
                return Err(EmitError::UnsupportedValue {
                    id: id.to_string(),
                    reason: format!(
                        "Fn::FindInMap takes exactly two keys, got {}",
                        keys.len()
                    ),
                });
            }
            let rendered: Vec<Json> = keys
                .iter()
                .map(|key| render_value(id, key))
                .collect::<Result<_, _>>()?;
            json!({ "Fn::FindInMap": [map, rendered[0], rendered[1]] })
        }
        Value::NestedRef { stack, export } => {
            json!({ "Fn::GetAtt": [stack.as_str(), format!("Outputs.{export}")] })
        }
    })
}
