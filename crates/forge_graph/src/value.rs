//! Attribute values and their dependency scanning.
//!
//! A [`Value`] is a tagged union covering everything the emitted template
//! format can express: literals, nested lists/maps, references to other nodes
//! in the same template, intrinsic string operations and declared cross-stack
//! references. Edges in the resource graph are never stored; they are derived
//! by recursively scanning a node's values for reference variants.

use indexmap::IndexMap;

use crate::id::LogicalId;

/// A literal scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i64),
    Bool(bool),
}

/// An attribute value. References may nest arbitrarily inside joins, lists
/// and maps; they all count identically for dependency purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(Scalar),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// Reference to another node in the same template.
    Ref(LogicalId),
    /// Attribute of another resource in the same template.
    GetAtt {
        target: LogicalId,
        attribute: String,
    },
    Join {
        separator: String,
        parts: Vec<Value>,
    },
    Split {
        separator: String,
        source: Box<Value>,
    },
    Base64(Box<Value>),
    /// Two-level mapping lookup (`Fn::FindInMap`). Keys may themselves be
    /// references.
    Lookup {
        map: String,
        keys: Vec<Value>,
    },
    /// Declared cross-stack reference: the value of an exported output of a
    /// nested stack. `stack` names the nested-stack resource in the current
    /// template; `export` names the export the child template must provide.
    NestedRef {
        stack: LogicalId,
        export: String,
    },
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Literal(Scalar::String(s.into()))
    }

    pub fn int(i: i64) -> Self {
        Value::Literal(Scalar::Int(i))
    }

    pub fn bool(b: bool) -> Self {
        Value::Literal(Scalar::Bool(b))
    }

    pub fn join(separator: impl Into<String>, parts: Vec<Value>) -> Self {
        Value::Join {
            separator: separator.into(),
            parts,
        }
    }

    pub fn split(separator: impl Into<String>, source: Value) -> Self {
        Value::Split {
            separator: separator.into(),
            source: Box::new(source),
        }
    }

    pub fn get_att(target: LogicalId, attribute: impl Into<String>) -> Self {
        Value::GetAtt {
            target,
            attribute: attribute.into(),
        }
    }

    /// Collect every same-template node this value references, in scan order.
    pub fn references(&self) -> Vec<&LogicalId> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    /// Collect every declared cross-stack reference as `(stack, export)`
    /// pairs, in scan order.
    pub fn nested_references(&self) -> Vec<(&LogicalId, &str)> {
        let mut out = Vec::new();
        self.collect_nested_references(&mut out);
        out
    }

    fn collect_nested_references<'a>(&'a self, out: &mut Vec<(&'a LogicalId, &'a str)>) {
        match self {
            Value::Literal(_) | Value::Ref(_) | Value::GetAtt { .. } => {}
            Value::List(items) => {
                for item in items {
                    item.collect_nested_references(out);
                }
            }
            Value::Map(entries) => {
                for value in entries.values() {
                    value.collect_nested_references(out);
                }
            }
            Value::Join { parts, .. } => {
                for part in parts {
                    part.collect_nested_references(out);
                }
            }
            Value::Split { source, .. } => source.collect_nested_references(out),
            Value::Base64(inner) => inner.collect_nested_references(out),
            Value::Lookup { keys, .. } => {
                for key in keys {
                    key.collect_nested_references(out);
                }
            }
            Value::NestedRef { stack, export } => out.push((stack, export.as_str())),
        }
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a LogicalId>) {
        match self {
            Value::Literal(_) => {}
            Value::List(items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            Value::Map(entries) => {
                for value in entries.values() {
                    value.collect_references(out);
                }
            }
            Value::Ref(id) => out.push(id),
            Value::GetAtt { target, .. } => out.push(target),
            Value::Join { parts, .. } => {
                for part in parts {
                    part.collect_references(out);
                }
            }
            Value::Split { source, .. } => source.collect_references(out),
            Value::Base64(inner) => inner.collect_references(out),
            Value::Lookup { keys, .. } => {
                for key in keys {
                    key.collect_references(out);
                }
            }
            // The nested-stack resource itself is a same-template dependency;
            // the export is validated against the child template separately.
            Value::NestedRef { stack, .. } => out.push(stack),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<LogicalId> for Value {
    fn from(id: LogicalId) -> Self {
        Value::Ref(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    #[test]
    fn test_literal_has_no_references() {
        assert!(Value::string("10.10.0.0/24").references().is_empty());
    }

    #[test]
    fn test_ref_inside_join_counts() {
        let value = Value::join(",", vec![Value::Ref(id("subA")), Value::Ref(id("subB"))]);
        let refs = value.references();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].as_str(), "subA");
        assert_eq!(refs[1].as_str(), "subB");
    }

    #[test]
    fn test_deeply_nested_references() {
        let mut tags = IndexMap::new();
        tags.insert(
            "Name".to_string(),
            Value::join("-", vec![Value::Ref(id("stackName")), Value::string("vpc")]),
        );
        let value = Value::Base64(Box::new(Value::List(vec![Value::Map(tags)])));
        let refs = value.references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].as_str(), "stackName");
    }

    #[test]
    fn test_nested_ref_depends_on_stack_resource() {
        let value = Value::NestedRef {
            stack: id("vpcnetworkgeneral"),
            export: "Stackvpcid".to_string(),
        };
        let refs = value.references();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].as_str(), "vpcnetworkgeneral");
    }
}
