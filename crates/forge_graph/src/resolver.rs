//! Reference resolution and dependency ordering.
//!
//! Resolution validates a template before anything is emitted:
//!
//! 1. every reference points at a node that exists in the template;
//! 2. every cross-stack reference points at a declared nested stack and at an
//!    export the declared child template actually provides;
//! 3. export names are unique within the template;
//! 4. the dependency graph is acyclic (three-color depth-first traversal);
//! 5. nodes are put in topological order, ties broken by insertion order, so
//!    the emitter's output is reproducible across runs.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::ResolveError;
use crate::id::LogicalId;
use crate::node::Node;
use crate::template::Template;

/// Child templates available for cross-stack export checks, keyed by the
/// names used in nested-stack declarations.
#[derive(Debug, Default)]
pub struct TemplateRegistry<'a> {
    templates: IndexMap<String, &'a Template>,
}

impl<'a> TemplateRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, template: &'a Template) {
        self.templates.insert(name.into(), template);
    }

    pub fn with(mut self, name: impl Into<String>, template: &'a Template) -> Self {
        self.register(name, template);
        self
    }

    fn get(&self, name: &str) -> Option<&'a Template> {
        self.templates.get(name).copied()
    }
}

/// A validated template plus the dependency order the emitter must follow.
#[derive(Debug)]
pub struct OrderedTemplate<'a> {
    template: &'a Template,
    order: Vec<LogicalId>,
}

impl<'a> OrderedTemplate<'a> {
    pub fn template(&self) -> &'a Template {
        self.template
    }

    pub fn order(&self) -> &[LogicalId] {
        &self.order
    }

    /// Nodes in dependency order.
    pub fn nodes(&self) -> impl Iterator<Item = &'a Node> + '_ {
        self.order.iter().filter_map(|id| self.template.get(id))
    }
}

/// Validate a template and compute its emission order.
///
/// `children` must hold every template named in a nested-stack declaration;
/// pass an empty registry for leaf templates.
pub fn resolve<'a>(
    template: &'a Template,
    children: &TemplateRegistry<'_>,
) -> Result<OrderedTemplate<'a>, ResolveError> {
    debug!(template = template.name(), nodes = template.len(), "resolving template");

    check_references(template, children)?;
    check_exports(template)?;

    let ids: Vec<&LogicalId> = template.nodes().map(|n| &n.id).collect();
    let index: IndexMap<&LogicalId, usize> =
        ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    // deps[i] lists the insertion indexes node i depends on.
    let mut deps: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
    for (i, node) in template.nodes().enumerate() {
        for target in node.references() {
            // Existence was checked above.
            if let Some(&j) = index.get(target) {
                deps[i].push(j);
            }
        }
    }

    if let Some(cycle) = find_cycle(&ids, &deps) {
        return Err(ResolveError::CyclicDependency { cycle });
    }

    let order = stable_topological_order(&ids, &deps);
    debug!(template = template.name(), "resolution succeeded");
    Ok(OrderedTemplate { template, order })
}

fn check_references(
    template: &Template,
    children: &TemplateRegistry<'_>,
) -> Result<(), ResolveError> {
    for node in template.nodes() {
        for target in node.references() {
            if !template.contains(target) {
                return Err(ResolveError::UnresolvedReference {
                    from: node.id.to_string(),
                    to: target.to_string(),
                });
            }
        }
        for (stack, export) in node.nested_references() {
            let Some(child_name) = template.nested_child(stack) else {
                return Err(ResolveError::UnresolvedReference {
                    from: node.id.to_string(),
                    to: format!("{stack}/{export}"),
                });
            };
            let Some(child) = children.get(child_name) else {
                return Err(ResolveError::UnresolvedReference {
                    from: node.id.to_string(),
                    to: format!("{child_name}/{export}"),
                });
            };
            if !child.exports().any(|(_, e)| e == export) {
                return Err(ResolveError::UnresolvedReference {
                    from: node.id.to_string(),
                    to: format!("{child_name}/{export}"),
                });
            }
        }
    }
    Ok(())
}

fn check_exports(template: &Template) -> Result<(), ResolveError> {
    let mut seen = HashSet::new();
    for (_, export) in template.exports() {
        if !seen.insert(export) {
            return Err(ResolveError::DuplicateExport {
                name: export.to_string(),
            });
        }
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    Unvisited,
    InProgress,
    Done,
}

/// Three-color depth-first search. Returns the ordered id list around the
/// first cycle found, starting and ending at the same node; a self-reference
/// reports as `[a, a]`.
fn find_cycle(ids: &[&LogicalId], deps: &[Vec<usize>]) -> Option<Vec<String>> {
    let mut colors = vec![Color::Unvisited; ids.len()];
    let mut path = Vec::new();
    for start in 0..ids.len() {
        if colors[start] == Color::Unvisited {
            if let Some(cycle) = visit(start, ids, deps, &mut colors, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit(
    node: usize,
    ids: &[&LogicalId],
    deps: &[Vec<usize>],
    colors: &mut [Color],
    path: &mut Vec<usize>,
) -> Option<Vec<String>> {
    colors[node] = Color::InProgress;
    path.push(node);

    for &dep in &deps[node] {
        match colors[dep] {
            Color::InProgress => {
                // Back-edge: the cycle is the path suffix from `dep` onwards.
                let pos = path.iter().position(|&n| n == dep).unwrap_or(0);
                let mut cycle: Vec<String> =
                    path[pos..].iter().map(|&n| ids[n].to_string()).collect();
                cycle.push(ids[dep].to_string());
                return Some(cycle);
            }
            Color::Unvisited => {
                if let Some(cycle) = visit(dep, ids, deps, colors, path) {
                    return Some(cycle);
                }
            }
            Color::Done => {}
        }
    }

    path.pop();
    colors[node] = Color::Done;
    None
}

/// Kahn-style ordering that always picks the eligible node with the smallest
/// insertion index, so independent nodes keep their declared relative order.
fn stable_topological_order(ids: &[&LogicalId], deps: &[Vec<usize>]) -> Vec<LogicalId> {
    let n = ids.len();
    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while order.len() < n {
        let next = (0..n)
            .find(|&i| !placed[i] && deps[i].iter().all(|&d| placed[d]))
            .expect("acyclic graph always has an eligible node");
        placed[next] = true;
        order.push(ids[next].clone());
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ParameterSpec;
    use crate::value::Value;
    use indexmap::IndexMap;

    fn id(s: &str) -> LogicalId {
        LogicalId::new(s).unwrap()
    }

    fn props(entries: &[(&str, Value)]) -> IndexMap<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn empty() -> TemplateRegistry<'static> {
        TemplateRegistry::new()
    }

    #[test]
    fn test_resolve_orders_dependencies_first() {
        let mut t = Template::new("Stack", "test");
        t.add_resource(
            id("subnet"),
            "AWS::EC2::Subnet",
            props(&[("VpcId", Value::Ref(id("vpc")))]),
        )
        .unwrap();
        t.add_resource(id("vpc"), "AWS::EC2::VPC", IndexMap::new())
            .unwrap();

        let ordered = resolve(&t, &empty()).unwrap();
        let order: Vec<_> = ordered.order().iter().map(|i| i.as_str()).collect();
        assert_eq!(order, vec!["vpc", "subnet"]);
    }

    #[test]
    fn test_independent_nodes_keep_insertion_order() {
        let mut t = Template::new("Stack", "test");
        t.add_resource(id("zeta"), "AWS::EC2::VPC", IndexMap::new())
            .unwrap();
        t.add_resource(id("alpha"), "AWS::EC2::VPC", IndexMap::new())
            .unwrap();
        t.add_resource(id("mike"), "AWS::EC2::VPC", IndexMap::new())
            .unwrap();

        let ordered = resolve(&t, &empty()).unwrap();
        let order: Vec<_> = ordered.order().iter().map(|i| i.as_str()).collect();
        assert_eq!(order, vec!["zeta", "alpha", "mike"]);
    }

    #[test]
    fn test_dangling_reference_fails() {
        let mut t = Template::new("Stack", "test");
        t.add_resource(
            id("subnet"),
            "AWS::EC2::Subnet",
            props(&[("VpcId", Value::Ref(id("ghost")))]),
        )
        .unwrap();

        let err = resolve(&t, &empty()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnresolvedReference {
                from: "subnet".to_string(),
                to: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_two_node_cycle_names_both_ids() {
        let mut t = Template::new("Stack", "test");
        t.add_resource(
            id("roleA"),
            "AWS::EC2::Instance",
            props(&[("Peer", Value::Ref(id("roleB")))]),
        )
        .unwrap();
        t.add_resource(
            id("roleB"),
            "AWS::EC2::Instance",
            props(&[("Peer", Value::Ref(id("roleA")))]),
        )
        .unwrap();

        let err = resolve(&t, &empty()).unwrap_err();
        match err {
            ResolveError::CyclicDependency { cycle } => {
                assert!(cycle.contains(&"roleA".to_string()));
                assert!(cycle.contains(&"roleB".to_string()));
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut t = Template::new("Stack", "test");
        t.add_resource(
            id("narcissus"),
            "AWS::EC2::Instance",
            props(&[("Peer", Value::Ref(id("narcissus")))]),
        )
        .unwrap();

        let err = resolve(&t, &empty()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::CyclicDependency {
                cycle: vec!["narcissus".to_string(), "narcissus".to_string()],
            }
        );
    }

    #[test]
    fn test_reference_inside_join_counts_for_ordering() {
        let mut t = Template::new("Stack", "test");
        t.add_output(
            id("combined"),
            "joined subnets",
            Value::join(",", vec![Value::Ref(id("subA"))]),
            None,
        )
        .unwrap();
        t.add_resource(id("subA"), "AWS::EC2::Subnet", IndexMap::new())
            .unwrap();

        let ordered = resolve(&t, &empty()).unwrap();
        let order: Vec<_> = ordered.order().iter().map(|i| i.as_str()).collect();
        assert_eq!(order, vec!["subA", "combined"]);
    }

    #[test]
    fn test_explicit_depends_on_orders_nodes() {
        let mut t = Template::new("Stack", "test");
        t.add_resource_depending_on(
            id("group"),
            "AWS::CodeDeploy::DeploymentGroup",
            IndexMap::new(),
            vec![id("application")],
        )
        .unwrap();
        t.add_resource(id("application"), "AWS::CodeDeploy::Application", IndexMap::new())
            .unwrap();

        let ordered = resolve(&t, &empty()).unwrap();
        let order: Vec<_> = ordered.order().iter().map(|i| i.as_str()).collect();
        assert_eq!(order, vec!["application", "group"]);
    }

    #[test]
    fn test_duplicate_export_fails() {
        let mut t = Template::new("Stack", "test");
        t.add_output(
            id("first"),
            "first",
            Value::string("a"),
            Some("Stackvpcid".to_string()),
        )
        .unwrap();
        t.add_output(
            id("second"),
            "second",
            Value::string("b"),
            Some("Stackvpcid".to_string()),
        )
        .unwrap();

        let err = resolve(&t, &empty()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::DuplicateExport {
                name: "Stackvpcid".to_string()
            }
        );
    }

    #[test]
    fn test_nested_reference_matches_child_export() {
        let mut child = Template::new("Stack", "general");
        child
            .add_output(
                id("Stackvpcid"),
                "VPC id",
                Value::string("vpc-123"),
                Some("Stackvpcid".to_string()),
            )
            .unwrap();

        let mut main = Template::new("Main", "main");
        let stack = main
            .add_nested_stack(
                id("vpcnetworkgeneral"),
                "general",
                Value::string("https://example/general.cfn"),
                IndexMap::new(),
            )
            .unwrap();
        let value = main.nested_output(&stack, "Stackvpcid");
        main.add_nested_stack(
            id("vpcnetworkpublic"),
            "network",
            Value::string("https://example/network.cfn"),
            props(&[("vpcId", value)]),
        )
        .unwrap();

        let mut network = Template::new("Stack", "network");
        network
            .add_parameter(id("vpcId"), ParameterSpec::string("VPC Id"))
            .unwrap();

        let registry = TemplateRegistry::new()
            .with("general", &child)
            .with("network", &network);
        assert!(resolve(&main, &registry).is_ok());
    }

    #[test]
    fn test_nested_reference_to_missing_export_fails() {
        let child = Template::new("Stack", "general");

        let mut main = Template::new("Main", "main");
        let stack = main
            .add_nested_stack(
                id("vpcnetworkgeneral"),
                "general",
                Value::string("https://example/general.cfn"),
                IndexMap::new(),
            )
            .unwrap();
        let value = main.nested_output(&stack, "Stackvpcid");
        main.add_nested_stack(
            id("vpcnetworkpublic"),
            "network",
            Value::string("https://example/network.cfn"),
            props(&[("vpcId", value)]),
        )
        .unwrap();

        let registry = TemplateRegistry::new().with("general", &child);
        let err = resolve(&main, &registry).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnresolvedReference {
                from: "vpcnetworkpublic".to_string(),
                to: "general/Stackvpcid".to_string(),
            }
        );
    }

    #[test]
    fn test_nested_reference_to_undeclared_stack_fails() {
        let mut main = Template::new("Main", "main");
        main.add_resource(id("phantom"), "AWS::EC2::VPC", IndexMap::new())
            .unwrap();
        main.add_output(
            id("leak"),
            "leak",
            Value::NestedRef {
                stack: id("phantom"),
                export: "Stackvpcid".to_string(),
            },
            None,
        )
        .unwrap();

        let err = resolve(&main, &empty()).unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnresolvedReference {
                from: "leak".to_string(),
                to: "phantom/Stackvpcid".to_string(),
            }
        );
    }
}
