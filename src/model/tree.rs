use std::collections::HashMap;

use serde::Deserialize;

/// Source id of the synthetic root every level-1 node hangs off.
pub const ROOT_SOURCE_ID: &str = "-1";
/// Destination id recorded for the synthetic root.
pub const ROOT_DESTINATION_ID: i64 = -1;

/// Requirements tree as returned by the R4J plugin REST endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RequirementsTree {
    #[serde(default)]
    pub folders: Vec<TreeFolder>,
    #[serde(default)]
    pub issues: Vec<TreeIssue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeFolder {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub absolute_position: i64,
    #[serde(default)]
    pub folders: Vec<TreeFolder>,
    #[serde(default)]
    pub issues: Vec<TreeIssue>,
}

/// Issue stub inside the tree payload. Full fields come from a separate
/// project search, see [`crate::model::tree::SourceIssue`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeIssue {
    pub issue_id: i64,
    pub key: String,
    pub summary: String,
    pub absolute_position: i64,
    pub child_reqs: Option<ChildReqs>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildReqs {
    #[serde(default)]
    pub child_req: Vec<TreeIssue>,
}

impl TreeIssue {
    pub fn children(&self) -> &[TreeIssue] {
        self.child_reqs
            .as_ref()
            .map(|c| c.child_req.as_slice())
            .unwrap_or_default()
    }
}

/// Fully fetched source issue, normalized by the source provider.
#[derive(Debug, Clone)]
pub struct SourceIssue {
    pub id: String,
    pub key: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    pub status: String,
    pub links: Vec<IssueLink>,
}

/// Outward issue link held by a source issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueLink {
    pub link_type: String,
    pub target_source_id: String,
}

/// Flattened tree entry. Folders and issues share structure; issue-only
/// fields live behind the `Issue` variant.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub kind: NodeKind,
    pub title: String,
    pub description: String,
    pub level: u32,
    pub position: i64,
    pub parent_source_id: String,
    pub source_id: String,
    pub destination_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Folder,
    Issue(IssueFields),
}

#[derive(Debug, Clone, Default)]
pub struct IssueFields {
    pub key: String,
    pub issue_type: String,
    pub status: String,
    pub links: Vec<IssueLink>,
}

impl TreeNode {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder)
    }

    pub fn issue_fields(&self) -> Option<&IssueFields> {
        match &self.kind {
            NodeKind::Folder => None,
            NodeKind::Issue(fields) => Some(fields),
        }
    }
}

/// Source-id to destination-id correspondence built up during a run.
/// Always starts with the synthetic root entry and only ever grows.
#[derive(Debug, Clone)]
pub struct IdMap(HashMap<String, i64>);

impl IdMap {
    pub fn new() -> Self {
        let mut map = HashMap::new();
        map.insert(ROOT_SOURCE_ID.to_string(), ROOT_DESTINATION_ID);
        Self(map)
    }

    pub fn insert(&mut self, source_id: &str, destination_id: i64) {
        self.0.insert(source_id.to_string(), destination_id);
    }

    pub fn get(&self, source_id: &str) -> Option<i64> {
        self.0.get(source_id).copied()
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.0.contains_key(source_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for IdMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_map_starts_with_root_sentinel() {
        let map = IdMap::new();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(ROOT_SOURCE_ID), Some(ROOT_DESTINATION_ID));
    }

    #[test]
    fn id_map_records_and_reads_back() {
        let mut map = IdMap::new();
        map.insert("10001", 42);
        assert_eq!(map.get("10001"), Some(42));
        assert!(map.contains("10001"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn tree_issue_children_defaults_to_empty() {
        let issue = TreeIssue {
            issue_id: 1,
            key: "REQ-1".into(),
            summary: "A requirement".into(),
            absolute_position: 1,
            child_reqs: None,
        };
        assert!(issue.children().is_empty());
    }
}
