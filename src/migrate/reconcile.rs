use tracing::debug;

use crate::error::MigrationError;
use crate::model::tree::{IdMap, IssueFields, NodeKind, SourceIssue, TreeNode};
use crate::model::work_item::DestinationItem;

/// Output of the match-and-consume pass: a fresh node collection with
/// destination ids filled in where a match was found, the grown id map, and
/// whether every node matched (nothing left to create).
#[derive(Debug)]
pub struct Reconciliation {
    pub nodes: Vec<TreeNode>,
    pub id_map: IdMap,
    pub complete: bool,
}

/// The tree payload only carries issue stubs; swap in the fields of the
/// fully fetched source issues. An issue missing from the fetched set means
/// the snapshot is stale or inconsistent, which is fatal.
pub fn resolve_issue_fields(
    nodes: Vec<TreeNode>,
    issues: &[SourceIssue],
) -> Result<Vec<TreeNode>, MigrationError> {
    nodes
        .into_iter()
        .map(|mut node| {
            if let NodeKind::Issue(stub) = &node.kind {
                let issue = issues.iter().find(|i| i.id == node.source_id).ok_or_else(|| {
                    MigrationError::ReferentialIntegrity(format!(
                        "issue {} (id {}) not found in the fetched project issues",
                        stub.key, node.source_id
                    ))
                })?;
                node.title = issue.summary.clone();
                node.description = issue.description.clone();
                node.kind = NodeKind::Issue(IssueFields {
                    key: issue.key.clone(),
                    issue_type: issue.issue_type.clone(),
                    status: issue.status.clone(),
                    links: issue.links.clone(),
                });
            }
            Ok(node)
        })
        .collect()
}

/// The destination stores a plain non-breaking space as its HTML entity, so
/// the source side must be normalized the same way or descriptions that are
/// otherwise equal never match.
pub fn normalize_description(description: &str) -> String {
    description.replace('\u{a0}', "&nbsp;")
}

/// Match each node against the work items already on the destination by
/// (title, normalized description). A matched item is consumed from the
/// candidate pool so colliding titles cannot map twice.
pub fn reconcile(
    nodes: Vec<TreeNode>,
    existing: Vec<DestinationItem>,
    id_map: IdMap,
) -> Reconciliation {
    let mut pool = existing;
    let mut id_map = id_map;

    let nodes: Vec<TreeNode> = nodes
        .into_iter()
        .map(|mut node| {
            if node.destination_id.is_some() {
                return node;
            }
            let description = normalize_description(&node.description);
            let found = pool
                .iter()
                .position(|item| item.title == node.title && item.description == description);
            if let Some(index) = found {
                let item = pool.remove(index);
                debug!(title = %node.title, work_item = item.id, "Matched existing work item");
                node.destination_id = Some(item.id);
                id_map.insert(&node.source_id, item.id);
            }
            node
        })
        .collect();

    // Root sentinel accounts for the extra map entry.
    let complete = nodes.len() == id_map.len() - 1;
    Reconciliation {
        nodes,
        id_map,
        complete,
    }
}
