//! Handles to resources materialized during a run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of creating or locating a resource.
///
/// Outputs form a tree of named attributes that other resources can point at
/// with `Resource <name>, <a>-><b>` expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceHandle {
    /// Resource kind, e.g. `harbor:project`.
    pub kind: String,
    /// Name the provider knows the resource by.
    pub resource_name: String,
    /// Output attributes.
    pub outputs: Map<String, Value>,
}

impl ResourceHandle {
    pub fn new(kind: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            resource_name: resource_name.into(),
            outputs: Map::new(),
        }
    }

    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.outputs.insert(key.into(), value.into());
        self
    }

    /// Provider identifier, when the handle carries an `id` output.
    pub fn id(&self) -> Option<&str> {
        self.outputs.get("id").and_then(Value::as_str)
    }

    /// Walk `path` through nested outputs.
    ///
    /// Yields `None` as soon as a segment is missing or `null`.
    pub fn output<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.outputs.get(first.as_ref())?;

        for segment in rest {
            if current.is_null() {
                return None;
            }
            current = match current {
                Value::Object(map) => map.get(segment.as_ref())?,
                Value::Array(items) => items.get(segment.as_ref().parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        if current.is_null() { None } else { Some(current) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handle() -> ResourceHandle {
        ResourceHandle::new("test:network", "t-s-e-network")
            .with_output("id", "net-1")
            .with_output("networkInfo", json!({ "endpoint": "x", "ports": [80, 443] }))
            .with_output("description", Value::Null)
    }

    #[test]
    fn test_nested_output() {
        let handle = handle();
        assert_eq!(handle.id(), Some("net-1"));
        assert_eq!(
            handle.output(&["networkInfo", "endpoint"]),
            Some(&json!("x"))
        );
        assert_eq!(handle.output(&["networkInfo", "ports", "1"]), Some(&json!(443)));
    }

    #[test]
    fn test_missing_segments_are_absent() {
        let handle = handle();
        assert_eq!(handle.output(&["networkInfo", "gateway"]), None);
        assert_eq!(handle.output(&["description"]), None);
        assert_eq!(handle.output(&["description", "text"]), None);
        assert_eq!(handle.output(&["id", "nested"]), None);
        assert_eq!(handle.output::<&str>(&[]), None);
    }
}
