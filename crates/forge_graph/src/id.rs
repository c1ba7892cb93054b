//! Validated logical identifiers.
//!
//! CloudFormation logical ids are ASCII alphanumeric. Instead of scattering
//! string concatenation and `.replace("-", "")` calls through every builder,
//! all ids go through [`LogicalId`], which validates the character set once.

use std::fmt;

use serde::Serialize;

use crate::error::{GraphError, GraphResult};

/// A validated template-unique identifier for a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LogicalId(String);

impl LogicalId {
    /// Create an id, validating that it is non-empty, ASCII alphanumeric and
    /// starts with a letter.
    pub fn new(raw: impl Into<String>) -> GraphResult<Self> {
        let raw = raw.into();
        match raw.chars().next() {
            None => {
                return Err(GraphError::InvalidId {
                    id: raw,
                    reason: "empty id".to_string(),
                })
            }
            Some(c) if !c.is_ascii_alphabetic() => {
                return Err(GraphError::InvalidId {
                    id: raw,
                    reason: "must start with an ASCII letter".to_string(),
                })
            }
            Some(_) => {}
        }
        if let Some(bad) = raw.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(GraphError::InvalidId {
                id: raw.clone(),
                reason: format!("invalid character '{bad}'"),
            });
        }
        Ok(Self(raw))
    }

    /// Build an id from config-derived fragments, dropping any character that
    /// is not alphanumeric (`eu-west-1a` becomes `euwest1a`).
    ///
    /// The result still has to pass [`LogicalId::new`], so a fragment list
    /// that sanitizes down to nothing (or to a leading digit) is rejected
    /// rather than silently emitted.
    pub fn from_parts(parts: &[&str]) -> GraphResult<Self> {
        let mut raw = String::new();
        for part in parts {
            raw.extend(part.chars().filter(|c| c.is_ascii_alphanumeric()));
        }
        Self::new(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LogicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
