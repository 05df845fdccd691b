pub mod flatten;
pub mod mapping;
pub mod plan;
pub mod reconcile;
pub mod sort;

use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::config::AppConfig;
use crate::error::MigrationError;
use crate::model::tree::IdMap;
use crate::providers::{self, Destination, Source};
use crate::report;

/// Migrate one project's requirements tree. Safe to re-run: reconciliation
/// picks up whatever a previous run already created.
pub async fn run_migration(config: &AppConfig, project_name: &str, dry_run: bool) -> Result<()> {
    let source = providers::jira_source(config)?;
    let destination = providers::ado_destination(config)?;
    run_migration_with(&source, &destination, config, project_name, dry_run).await
}

pub async fn run_migration_with(
    source: &dyn Source,
    destination: &dyn Destination,
    config: &AppConfig,
    project_name: &str,
    dry_run: bool,
) -> Result<()> {
    info!("Destination verifications started");
    destination.verify_access().await?;
    let dest_project = destination.project(project_name).await?;
    let folder_type = destination.folder_work_item_type(&dest_project.id).await?;
    info!("All verifications passed");

    info!("Downloading issues from the source project");
    let project = source.project_by_name(project_name).await?;
    let issues = source.project_issues(&project.key, &project.name).await?;

    info!("Downloading the requirements tree");
    let tree = source.requirements_tree(&project.key).await?;
    let nodes = flatten::flatten_tree(&tree);
    info!(
        nodes = nodes.len(),
        issues = issues.len(),
        "Flattened the source tree"
    );

    let nodes = reconcile::resolve_issue_fields(nodes, &issues)?;

    info!("Matching tree items against existing destination work items");
    let existing = destination.existing_work_items(&dest_project.name).await?;
    let recon = reconcile::reconcile(nodes, existing, IdMap::new());
    let mut nodes = recon.nodes;
    let mut id_map = recon.id_map;

    if recon.complete {
        info!("Every tree item already exists on the destination");
    } else {
        info!(
            found = id_map.len() - 1,
            missing = nodes.len() + 1 - id_map.len(),
            "Creating missing work items"
        );
        let mappings = mapping::FieldMappings::new(&config.mappings, folder_type);
        let outcome =
            plan::create_missing_items(destination, &dest_project.name, nodes, id_map, &mappings)
                .await?;
        nodes = outcome.nodes;
        id_map = outcome.id_map;
    }

    let ordered = sort::sort_tree(&nodes);

    if dry_run {
        info!("Dry run: rendering the expected tree instead of creating it");
        let path = report::write_expected_tree(Path::new("report"), &ordered, &dest_project.name)?;
        info!(path = %path.display(), "Expected tree report written");
        report::open_in_browser(&path);
        return Ok(());
    }

    info!("Creating the requirements tree on the destination");
    let mut created = 0usize;
    for node in &ordered {
        let child = node.destination_id.ok_or_else(|| {
            MigrationError::ReferentialIntegrity(format!(
                "node '{}' has no destination work item",
                node.title
            ))
        })?;
        let parent = id_map.get(&node.parent_source_id).ok_or_else(|| {
            MigrationError::ReferentialIntegrity(format!(
                "parent {} of '{}' is not mapped to a destination id",
                node.parent_source_id, node.title
            ))
        })?;
        destination
            .create_tree_item(&dest_project.id, child, parent)
            .await?;
        created += 1;
    }
    info!(created, "Migration completed");
    Ok(())
}

/// Delete every easeRequirements tree item of a project. Operator reset
/// tool; work items themselves are left untouched.
pub async fn run_clean(config: &AppConfig, project_name: &str) -> Result<()> {
    let destination = providers::ado_destination(config)?;
    clean_tree(&destination, project_name).await
}

pub async fn clean_tree(destination: &dyn Destination, project_name: &str) -> Result<()> {
    let project = destination.project(project_name).await?;
    let items = destination.tree_items(&project.id).await?;
    info!(count = items.len(), project = %project.name, "Deleting tree items");
    for item in &items {
        destination.delete_tree_item(&project.id, &item.id).await?;
    }
    info!("Tree cleaned");
    Ok(())
}
