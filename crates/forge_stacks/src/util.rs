//! Shared building blocks for the stack builders.

use indexmap::IndexMap;

use forge_graph::{GraphResult, LogicalId, Value};

/// Resource properties from `(key, value)` pairs, preserving order.
pub(crate) fn props<K>(entries: Vec<(K, Value)>) -> IndexMap<String, Value>
where
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// An object-shaped value from `(key, value)` pairs.
pub(crate) fn object<K>(entries: Vec<(K, Value)>) -> Value
where
    K: Into<String>,
{
    Value::Map(props(entries))
}

/// An EC2-style tag list with a single `Name` tag of
/// `Join("", [Ref(stackName), suffix])`.
pub(crate) fn name_tags(stack_param: &LogicalId, suffix: &str) -> Value {
    Value::List(vec![object(vec![
        ("Key", Value::string("Name")),
        (
            "Value",
            Value::join(
                "",
                vec![Value::Ref(stack_param.clone()), Value::string(suffix)],
            ),
        ),
    ])])
}

/// An autoscaling-style tag that propagates to launched instances.
pub(crate) fn asg_tag(key: &str, value: Value) -> Value {
    object(vec![
        ("Key", Value::string(key)),
        ("Value", value),
        ("PropagateAtLaunch", Value::string("true")),
    ])
}

/// Export name for a cross-stack output: `<stackName><logicalName>`.
pub(crate) fn export_name(stack: &str, logical: &str) -> String {
    format!("{stack}{logical}")
}

/// Logical id of the per-prefix public subnet parameter, `pubsub<PREFIX>`.
pub(crate) fn pubsub_param(prefix: &str) -> GraphResult<LogicalId> {
    LogicalId::from_parts(&["pubsub", &prefix.to_uppercase()])
}
