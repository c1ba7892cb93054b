//! Graph nodes: parameters, resources and outputs.

use indexmap::IndexMap;

use crate::id::LogicalId;
use crate::value::{Scalar, Value};

/// Declarative description of a template parameter.
#[derive(Debug, Clone, Default)]
pub struct ParameterSpec {
    /// Parameter type in the target format (`String`, `Number`, ...).
    pub param_type: String,
    pub description: Option<String>,
    pub default: Option<Scalar>,
    pub allowed_values: Vec<Scalar>,
}

impl ParameterSpec {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            param_type: "String".to_string(),
            description: Some(description.into()),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(Scalar::String(default.into()));
        self
    }

    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = values
            .into_iter()
            .map(|v| Scalar::String(v.into()))
            .collect();
        self
    }
}

/// What a node is. Outputs keep their value in `attributes["Value"]` so every
/// kind shares one attribute scan for dependency edges.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Parameter(ParameterSpec),
    Resource { resource_type: String },
    Output {
        description: Option<String>,
        /// Export name for cross-stack consumption, `<stackName><logicalName>`.
        export: Option<String>,
    },
}

/// One node in a template graph. Immutable once added to a template.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: LogicalId,
    pub kind: NodeKind,
    pub attributes: IndexMap<String, Value>,
    /// Explicit ordering hints on top of the derived reference edges.
    pub depends_on: Vec<LogicalId>,
}

impl Node {
    /// Every same-template node this node depends on, derived from its
    /// attributes plus explicit `depends_on` hints. Scan order is attribute
    /// insertion order, then hint order.
    pub fn references(&self) -> Vec<&LogicalId> {
        let mut out = Vec::new();
        for value in self.attributes.values() {
            out.extend(value.references());
        }
        out.extend(self.depends_on.iter());
        out
    }

    /// Every declared cross-stack reference in this node's attributes.
    pub fn nested_references(&self) -> Vec<(&LogicalId, &str)> {
        let mut out = Vec::new();
        for value in self.attributes.values() {
            out.extend(value.nested_references());
        }
        out
    }

    /// Export name, if this is an exported output.
    pub fn export(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Output { export, .. } => export.as_deref(),
            _ => None,
        }
    }
}
