use anyhow::Result;
use tracing::{debug, info, warn};

use crate::error::MigrationError;
use crate::migrate::mapping::FieldMappings;
use crate::model::tree::{IdMap, NodeKind, TreeNode};
use crate::model::work_item::FieldPatch;
use crate::providers::Destination;

const DESCRIPTION_PATH: &str = "/fields/System.Description";
const TITLE_PATH: &str = "/fields/System.Title";
const STATE_PATH: &str = "/fields/System.State";
const RELATIONS_PATH: &str = "/relations/-";

/// Creation request for one node: the destination work item type, the
/// json-patch body (no state field — see [`create_missing_items`]), and the
/// state the item should end up in.
#[derive(Debug)]
pub struct CreationPlan {
    pub work_item_type: String,
    pub patch: Vec<FieldPatch>,
    pub desired_state: Option<String>,
}

/// Result of the creation pass over the reconciled node list.
#[derive(Debug)]
pub struct CreationOutcome {
    pub nodes: Vec<TreeNode>,
    pub id_map: IdMap,
    pub created: usize,
}

/// Build the creation request for a single node. Issue links are attached
/// only when the target already resolves through the id map; links to
/// not-yet-created targets are skipped (a resume-order limitation — a later
/// run with all items present attaches nothing retroactively). An unmapped
/// link type aborts before anything is sent for this node.
pub fn build_creation_plan(
    node: &TreeNode,
    id_map: &IdMap,
    mappings: &FieldMappings,
    destination: &dyn Destination,
) -> Result<CreationPlan, MigrationError> {
    let mut patch = vec![
        FieldPatch::add(DESCRIPTION_PATH, node.description.clone()),
        FieldPatch::add(TITLE_PATH, node.title.clone()),
    ];

    match &node.kind {
        NodeKind::Folder => Ok(CreationPlan {
            work_item_type: mappings.folder_type().to_string(),
            patch,
            desired_state: None,
        }),
        NodeKind::Issue(fields) => {
            let work_item_type = mappings.map_issue_type(&fields.issue_type).to_string();
            let desired_state = mappings.map_status(&work_item_type, &fields.status).to_string();

            for link in &fields.links {
                let rel = mappings.map_link_type(&link.link_type)?;
                match id_map.get(&link.target_source_id) {
                    Some(target_id) => {
                        patch.push(FieldPatch::add(
                            RELATIONS_PATH,
                            serde_json::json!({
                                "rel": rel,
                                "url": destination.work_item_url(target_id),
                            }),
                        ));
                    }
                    None => {
                        warn!(
                            issue = %fields.key,
                            target = %link.target_source_id,
                            link_type = %link.link_type,
                            "Skipping link: target work item not created yet"
                        );
                    }
                }
            }

            Ok(CreationPlan {
                work_item_type,
                patch,
                desired_state: Some(desired_state),
            })
        }
    }
}

/// Create a destination work item for every node the reconciler left without
/// a destination id, in source-flattened order.
///
/// State is assigned in two phases: the create call carries no state field
/// (the server applies its own default), and only when the returned state
/// differs from the desired mapped state is a single follow-up update sent.
pub async fn create_missing_items(
    destination: &dyn Destination,
    project: &str,
    nodes: Vec<TreeNode>,
    id_map: IdMap,
    mappings: &FieldMappings,
) -> Result<CreationOutcome> {
    let mut id_map = id_map;
    let mut out = Vec::with_capacity(nodes.len());
    let mut created = 0;

    for mut node in nodes {
        if node.destination_id.is_none() {
            let plan = build_creation_plan(&node, &id_map, mappings, destination)?;
            let item = destination
                .create_work_item(project, &plan.work_item_type, &plan.patch)
                .await?;
            debug!(title = %node.title, work_item = item.id, "Created work item");

            if let Some(desired) = &plan.desired_state {
                if item.state != *desired {
                    destination
                        .update_work_item(
                            project,
                            item.id,
                            &[FieldPatch::replace(STATE_PATH, desired.clone())],
                        )
                        .await?;
                    debug!(work_item = item.id, state = %desired, "Adjusted state");
                }
            }

            id_map.insert(&node.source_id, item.id);
            node.destination_id = Some(item.id);
            created += 1;
        }
        out.push(node);
    }

    info!(created, "Work item creation finished");
    Ok(CreationOutcome {
        nodes: out,
        id_map,
        created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingConfig;
    use crate::model::tree::{IssueFields, IssueLink, ROOT_SOURCE_ID};
    use crate::providers::tests::MockDestination;

    fn mappings() -> FieldMappings {
        let config = MappingConfig {
            issue_types: Default::default(),
            statuses: [("Done".to_string(), "Closed".to_string())].into(),
            link_types: [(
                "relates to".to_string(),
                "System.LinkTypes.Related".to_string(),
            )]
            .into(),
        };
        FieldMappings::new(&config, "Folder")
    }

    fn issue(source_id: &str, title: &str, status: &str, links: Vec<IssueLink>) -> TreeNode {
        TreeNode {
            kind: NodeKind::Issue(IssueFields {
                key: format!("REQ-{source_id}"),
                issue_type: "Requirement".to_string(),
                status: status.to_string(),
                links,
            }),
            title: title.to_string(),
            description: String::new(),
            level: 1,
            position: 1,
            parent_source_id: ROOT_SOURCE_ID.to_string(),
            source_id: source_id.to_string(),
            destination_id: None,
        }
    }

    fn link(link_type: &str, target: &str) -> IssueLink {
        IssueLink {
            link_type: link_type.to_string(),
            target_source_id: target.to_string(),
        }
    }

    #[test]
    fn folder_plan_has_no_state_and_uses_folder_type() {
        let destination = MockDestination::new("New");
        let node = TreeNode {
            kind: NodeKind::Folder,
            ..issue("1", "Reqs", "", vec![])
        };
        let plan = build_creation_plan(&node, &IdMap::new(), &mappings(), &destination).unwrap();
        assert_eq!(plan.work_item_type, "Folder");
        assert!(plan.desired_state.is_none());
        assert_eq!(plan.patch.len(), 2);
    }

    #[test]
    fn issue_plan_maps_status_but_keeps_it_out_of_the_patch() {
        let destination = MockDestination::new("New");
        let node = issue("1", "Login", "Done", vec![]);
        let plan = build_creation_plan(&node, &IdMap::new(), &mappings(), &destination).unwrap();
        assert_eq!(plan.desired_state.as_deref(), Some("Closed"));
        assert!(plan.patch.iter().all(|p| p.path != STATE_PATH));
    }

    #[test]
    fn link_to_resolved_target_is_attached() {
        let destination = MockDestination::new("New");
        let mut id_map = IdMap::new();
        id_map.insert("42", 900);
        let node = issue("1", "Login", "Open", vec![link("relates to", "42")]);
        let plan = build_creation_plan(&node, &id_map, &mappings(), &destination).unwrap();
        let relation = plan.patch.iter().find(|p| p.path == RELATIONS_PATH).unwrap();
        assert_eq!(relation.value["rel"], "System.LinkTypes.Related");
        assert_eq!(relation.value["url"], destination.work_item_url(900));
    }

    #[test]
    fn link_to_unresolved_target_is_skipped() {
        let destination = MockDestination::new("New");
        let node = issue("1", "Login", "Open", vec![link("relates to", "42")]);
        let plan = build_creation_plan(&node, &IdMap::new(), &mappings(), &destination).unwrap();
        assert!(plan.patch.iter().all(|p| p.path != RELATIONS_PATH));
    }

    #[test]
    fn unmapped_link_type_aborts_the_plan() {
        let destination = MockDestination::new("New");
        let node = issue("1", "Login", "Open", vec![link("blocks", "42")]);
        let err = build_creation_plan(&node, &IdMap::new(), &mappings(), &destination).unwrap_err();
        assert!(matches!(err, MigrationError::Configuration(_)));
    }

    #[tokio::test]
    async fn two_phase_state_updates_once_when_default_differs() {
        let destination = MockDestination::new("New");
        let outcome = create_missing_items(
            &destination,
            "Proj",
            vec![issue("1", "Login", "Done", vec![])],
            IdMap::new(),
            &mappings(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.created, 1);
        assert_eq!(destination.create_calls(), 1);
        let updates = destination.update_patches();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1[0].path, STATE_PATH);
        assert_eq!(updates[0].1[0].value, "Closed");
    }

    #[tokio::test]
    async fn two_phase_state_skips_update_when_default_matches() {
        let destination = MockDestination::new("Closed");
        let outcome = create_missing_items(
            &destination,
            "Proj",
            vec![issue("1", "Login", "Done", vec![])],
            IdMap::new(),
            &mappings(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.created, 1);
        assert!(destination.update_patches().is_empty());
    }

    #[tokio::test]
    async fn already_matched_nodes_are_not_recreated() {
        let destination = MockDestination::new("New");
        let mut matched = issue("1", "Login", "Open", vec![]);
        matched.destination_id = Some(77);
        let mut id_map = IdMap::new();
        id_map.insert("1", 77);

        let outcome =
            create_missing_items(&destination, "Proj", vec![matched], id_map, &mappings())
                .await
                .unwrap();

        assert_eq!(outcome.created, 0);
        assert_eq!(destination.create_calls(), 0);
        assert_eq!(outcome.nodes[0].destination_id, Some(77));
    }

    #[tokio::test]
    async fn configuration_error_stops_before_any_payload_for_that_item() {
        let destination = MockDestination::new("New");
        let nodes = vec![
            issue("1", "Login", "Open", vec![]),
            issue("2", "Logout", "Open", vec![link("blocks", "1")]),
        ];

        let err = create_missing_items(&destination, "Proj", nodes, IdMap::new(), &mappings())
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<MigrationError>().is_some());
        // The first item went through; nothing was sent for the failing one.
        assert_eq!(destination.create_calls(), 1);
    }
}
