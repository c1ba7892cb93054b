//! A template: one stack's worth of nodes, in insertion order.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::id::LogicalId;
use crate::node::{Node, NodeKind, ParameterSpec};
use crate::value::Value;

/// The pinned target format version.
pub const FORMAT_VERSION: &str = "2010-09-09";

/// One deployable stack described as a graph of nodes.
///
/// Insertion order is preserved and later used as the stable tiebreak when two
/// nodes have no dependency relationship, so output is reproducible across
/// runs given identical input. Nested-stack relations are declared explicitly
/// via [`Template::add_nested_stack`] rather than inferred from strings.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    description: String,
    format_version: Option<String>,
    nodes: IndexMap<LogicalId, Node>,
    /// Nested-stack resource id -> child template name.
    nested: IndexMap<LogicalId, String>,
}

impl Template {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            format_version: Some(FORMAT_VERSION.to_string()),
            nodes: IndexMap::new(),
            nested: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn format_version(&self) -> Option<&str> {
        self.format_version.as_deref()
    }

    /// Add a fully formed node. Fails if the id is already present.
    pub fn add_node(&mut self, node: Node) -> GraphResult<LogicalId> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateId {
                id: node.id.to_string(),
            });
        }
        let id = node.id.clone();
        debug!(id = %id, "added node to template {}", self.name);
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    /// Add a parameter node.
    pub fn add_parameter(&mut self, id: LogicalId, spec: ParameterSpec) -> GraphResult<LogicalId> {
        self.add_node(Node {
            id,
            kind: NodeKind::Parameter(spec),
            attributes: IndexMap::new(),
            depends_on: Vec::new(),
        })
    }

    /// Add a resource node with the given properties.
    pub fn add_resource(
        &mut self,
        id: LogicalId,
        resource_type: impl Into<String>,
        properties: IndexMap<String, Value>,
    ) -> GraphResult<LogicalId> {
        self.add_node(Node {
            id,
            kind: NodeKind::Resource {
                resource_type: resource_type.into(),
            },
            attributes: properties,
            depends_on: Vec::new(),
        })
    }

    /// Add a resource node with explicit ordering hints.
    pub fn add_resource_depending_on(
        &mut self,
        id: LogicalId,
        resource_type: impl Into<String>,
        properties: IndexMap<String, Value>,
        depends_on: Vec<LogicalId>,
    ) -> GraphResult<LogicalId> {
        self.add_node(Node {
            id,
            kind: NodeKind::Resource {
                resource_type: resource_type.into(),
            },
            attributes: properties,
            depends_on,
        })
    }

    /// Add an output node. `export` is the cross-stack export name, which by
    /// convention is `<stackName><logicalName>`.
    pub fn add_output(
        &mut self,
        id: LogicalId,
        description: impl Into<String>,
        value: Value,
        export: Option<String>,
    ) -> GraphResult<LogicalId> {
        let mut attributes = IndexMap::new();
        attributes.insert("Value".to_string(), value);
        self.add_node(Node {
            id,
            kind: NodeKind::Output {
                description: Some(description.into()),
                export,
            },
            attributes,
            depends_on: Vec::new(),
        })
    }

    /// Add a nested-stack resource and declare which child template it
    /// instantiates. The declaration is what lets the resolver check
    /// [`Template::nested_output`] values against real exports.
    pub fn add_nested_stack(
        &mut self,
        id: LogicalId,
        child_template: impl Into<String>,
        template_url: Value,
        parameters: IndexMap<String, Value>,
    ) -> GraphResult<LogicalId> {
        let mut properties = IndexMap::new();
        properties.insert("TemplateURL".to_string(), template_url);
        properties.insert("Parameters".to_string(), Value::Map(parameters));
        let id = self.add_resource(id, "AWS::CloudFormation::Stack", properties)?;
        self.nested.insert(id.clone(), child_template.into());
        Ok(id)
    }

    /// A cross-template reference to an export of a declared nested stack.
    pub fn nested_output(&self, stack: &LogicalId, export: impl Into<String>) -> Value {
        Value::NestedRef {
            stack: stack.clone(),
            export: export.into(),
        }
    }

    pub fn get(&self, id: &LogicalId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &LogicalId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child template name declared for a nested-stack resource.
    pub fn nested_child(&self, id: &LogicalId) -> Option<&str> {
        self.nested.get(id).map(String::as_str)
    }

    /// Exported outputs as `(node, export name)` pairs, in insertion order.
    pub fn exports(&self) -> impl Iterator<Item = (&Node, &str)> {
        self.nodes
            .values()
            .filter_map(|n| n.export().map(|e| (n, e)))
    }
}
