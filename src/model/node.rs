use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One inventory entry: the attribute document describing a managed host.
///
/// Records are opaque JSON objects. Well-known fields (`hostname`,
/// `environment`, `roles`, `recipes`) get typed accessors; everything else
/// is reached through [`NodeRecord::get_path`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRecord(Map<String, Value>);

impl NodeRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        NodeRecord(fields)
    }

    pub fn hostname(&self) -> Option<&str> {
        self.0.get("hostname").and_then(Value::as_str)
    }

    pub fn environment(&self) -> Option<&str> {
        self.0.get("environment").and_then(Value::as_str)
    }

    /// Roles assigned to this node.
    pub fn has_role(&self, role: &str) -> bool {
        self.string_list_contains("roles", role)
    }

    /// Recipes in this node's expanded run list.
    pub fn has_recipe(&self, recipe: &str) -> bool {
        self.string_list_contains("recipes", recipe)
    }

    /// Resolve a dot-separated attribute path, e.g. `network.management.ip`.
    ///
    /// Each segment indexes one level deeper into the record. A segment that
    /// does not resolve (or lands in a non-object mid-path) yields `None`;
    /// whether absence is an error is the caller's call.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');

        let first = segments.next()?;
        let mut value = self.0.get(first)?;

        for segment in segments {
            value = value.as_object()?.get(segment)?;
        }

        Some(value)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    fn string_list_contains(&self, field: &str, wanted: &str) -> bool {
        self.0
            .get(field)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).any(|s| s == wanted))
            .unwrap_or(false)
    }
}

impl TryFrom<Value> for NodeRecord {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(NodeRecord(fields)),
            other => Err(format!("Node record must be a JSON object, got: {}", other)),
        }
    }
}
