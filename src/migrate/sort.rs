use crate::model::tree::{TreeNode, ROOT_SOURCE_ID};

/// Re-order the flattened list depth-first: every parent precedes its
/// descendants and siblings come out in ascending position. Children are
/// selected by (parent source id, level) — the level check guards against
/// id collisions between unrelated subtrees at different depths. The output
/// contains every input node exactly once.
pub fn sort_tree(nodes: &[TreeNode]) -> Vec<TreeNode> {
    let mut ordered = Vec::with_capacity(nodes.len());
    append_children(ROOT_SOURCE_ID, 1, nodes, &mut ordered);
    ordered
}

fn append_children(
    parent_source_id: &str,
    level: u32,
    nodes: &[TreeNode],
    out: &mut Vec<TreeNode>,
) {
    let mut children: Vec<&TreeNode> = nodes
        .iter()
        .filter(|n| n.parent_source_id == parent_source_id && n.level == level)
        .collect();
    children.sort_by_key(|n| n.position);

    for child in children {
        out.push(child.clone());
        append_children(&child.source_id, child.level + 1, nodes, out);
    }
}
