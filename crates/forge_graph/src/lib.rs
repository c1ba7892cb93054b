//! # forge_graph
//!
//! Typed infrastructure-graph core for cfnforge.
//!
//! Resources, parameters and outputs are nodes in a per-template graph with
//! derived dependency edges. A template is built in one pass, validated by the
//! resolver (dangling references, cross-stack export contracts, cycles) and
//! then emitted deterministically as CloudFormation JSON.
//!
//! ## Example
//!
//! ```rust
//! use forge_graph::{emit, resolve, LogicalId, ParameterSpec, Template, TemplateRegistry, Value};
//! use indexmap::IndexMap;
//!
//! let mut t = Template::new("MyStack", "Network general stack");
//! t.add_parameter(LogicalId::new("stackName").unwrap(), ParameterSpec::string("Stack name")).unwrap();
//! t.add_resource(LogicalId::new("vpc").unwrap(), "AWS::EC2::VPC", IndexMap::new()).unwrap();
//!
//! let ordered = resolve(&t, &TemplateRegistry::new()).unwrap();
//! let document = emit(&ordered).unwrap();
//! assert!(document.contains("AWS::EC2::VPC"));
//! ```

pub mod emitter;
pub mod error;
pub mod id;
pub mod node;
pub mod resolver;
pub mod template;
pub mod value;

pub use emitter::emit;
pub use error::{EmitError, GraphError, GraphResult, ResolveError};
pub use id::LogicalId;
pub use node::{Node, NodeKind, ParameterSpec};
pub use resolver::{resolve, OrderedTemplate, TemplateRegistry};
pub use template::{Template, FORMAT_VERSION};
pub use value::{Scalar, Value};
