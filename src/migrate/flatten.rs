use crate::model::tree::{
    IssueFields, NodeKind, RequirementsTree, TreeFolder, TreeIssue, TreeNode, ROOT_SOURCE_ID,
};

/// Flatten the nested requirements tree into a list of [`TreeNode`]s by
/// pre-order traversal. The root itself is not emitted; level-1 nodes point
/// at the synthetic root. Emission follows source traversal order — the
/// depth-first sorter produces the final ordering later.
pub fn flatten_tree(tree: &RequirementsTree) -> Vec<TreeNode> {
    let mut nodes = Vec::new();
    walk(&tree.folders, &tree.issues, ROOT_SOURCE_ID, 1, &mut nodes);
    nodes
}

fn walk(
    folders: &[TreeFolder],
    issues: &[TreeIssue],
    parent_source_id: &str,
    level: u32,
    out: &mut Vec<TreeNode>,
) {
    for folder in folders {
        let source_id = folder.id.to_string();
        out.push(TreeNode {
            kind: NodeKind::Folder,
            title: folder.name.clone(),
            description: folder.description.clone().unwrap_or_default(),
            level,
            position: folder.absolute_position,
            parent_source_id: parent_source_id.to_string(),
            source_id: source_id.clone(),
            destination_id: None,
        });
        walk(&folder.folders, &folder.issues, &source_id, level + 1, out);
    }

    for issue in issues {
        let source_id = issue.issue_id.to_string();
        out.push(TreeNode {
            kind: NodeKind::Issue(IssueFields {
                key: issue.key.clone(),
                ..IssueFields::default()
            }),
            title: issue.summary.clone(),
            description: String::new(),
            level,
            position: issue.absolute_position,
            parent_source_id: parent_source_id.to_string(),
            source_id: source_id.clone(),
            destination_id: None,
        });
        // An issue with no nested requirements is a leaf.
        walk(&[], issue.children(), &source_id, level + 1, out);
    }
}
