use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Work item already present on the destination project, as returned by the
/// batch field fetch. Only the fields the reconciler compares are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state: String,
}

/// One operation of an `application/json-patch+json` body. The destination
/// API dictates the shape; it is passed through verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct FieldPatch {
    pub op: String,
    pub path: String,
    pub from: Option<String>,
    pub value: Value,
}

impl FieldPatch {
    pub fn add(path: &str, value: impl Into<Value>) -> Self {
        Self {
            op: "add".into(),
            path: path.into(),
            from: None,
            value: value.into(),
        }
    }

    pub fn replace(path: &str, value: impl Into<Value>) -> Self {
        Self {
            op: "replace".into(),
            path: path.into(),
            from: None,
            value: value.into(),
        }
    }
}

/// Result of a create or update call: the assigned id plus the state the
/// server actually stored (its default may differ from the one we want).
#[derive(Debug, Clone)]
pub struct CreatedItem {
    pub id: i64,
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_patch_serializes_to_json_patch_shape() {
        let patch = FieldPatch::add("/fields/System.Title", "Login");
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["op"], "add");
        assert_eq!(json["path"], "/fields/System.Title");
        assert_eq!(json["from"], Value::Null);
        assert_eq!(json["value"], "Login");
    }

    #[test]
    fn replace_patch_keeps_object_values() {
        let patch = FieldPatch::replace(
            "/relations/-",
            serde_json::json!({"rel": "System.LinkTypes.Related", "url": "wi://7"}),
        );
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["value"]["rel"], "System.LinkTypes.Related");
    }
}
