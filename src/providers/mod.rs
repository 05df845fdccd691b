pub mod ado;
pub mod jira;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::AppConfig;
use crate::model::tree::{RequirementsTree, SourceIssue};
use crate::model::work_item::{CreatedItem, DestinationItem, FieldPatch};

/// Project on the source side.
#[derive(Debug, Clone)]
pub struct SourceProject {
    pub key: String,
    pub name: String,
}

/// Project on the destination side.
#[derive(Debug, Clone)]
pub struct ProjectRef {
    pub id: String,
    pub name: String,
}

/// One easeRequirements tree item document.
#[derive(Debug, Clone)]
pub struct TreeItemRef {
    pub id: String,
}

/// Read-only view of the source system: the project, its issues, and the
/// nested requirements tree.
#[async_trait]
pub trait Source: Send + Sync {
    async fn project_by_name(&self, name: &str) -> Result<SourceProject>;
    /// All issues reachable from the project or its requirements tree,
    /// with the fields the migration needs already normalized.
    async fn project_issues(&self, project_key: &str, project_name: &str)
        -> Result<Vec<SourceIssue>>;
    async fn requirements_tree(&self, project_key: &str) -> Result<RequirementsTree>;
}

/// Destination system operations. Work item bodies are
/// `application/json-patch+json` and passed through untouched.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Cheap authenticated call used as a preflight check.
    async fn verify_access(&self) -> Result<()>;
    async fn project(&self, id_or_name: &str) -> Result<ProjectRef>;
    /// Every work item already in the project, with the title, description
    /// and state fields the reconciler compares.
    async fn existing_work_items(&self, project: &str) -> Result<Vec<DestinationItem>>;
    /// The work item type configured for folders, from the extension
    /// settings. Fails when none is configured.
    async fn folder_work_item_type(&self, project_id: &str) -> Result<String>;
    async fn create_work_item(
        &self,
        project: &str,
        work_item_type: &str,
        patch: &[FieldPatch],
    ) -> Result<CreatedItem>;
    async fn update_work_item(
        &self,
        project: &str,
        work_item_id: i64,
        patch: &[FieldPatch],
    ) -> Result<CreatedItem>;
    /// URL used in link relation payloads to address a work item.
    fn work_item_url(&self, work_item_id: i64) -> String;
    async fn tree_items(&self, project_id: &str) -> Result<Vec<TreeItemRef>>;
    async fn create_tree_item(
        &self,
        project_id: &str,
        child_id: i64,
        parent_id: i64,
    ) -> Result<String>;
    async fn delete_tree_item(&self, project_id: &str, item_id: &str) -> Result<()>;
}

pub fn jira_source(config: &AppConfig) -> Result<jira::JiraDataCenter> {
    match &config.jira {
        Some(cfg) => jira::JiraDataCenter::new(cfg),
        None => bail!("No [jira] section configured. Add credentials to ~/.reqtree/config.toml"),
    }
}

pub fn ado_destination(config: &AppConfig) -> Result<ado::AzureDevOps> {
    match &config.ado {
        Some(cfg) => ado::AzureDevOps::new(cfg),
        None => bail!("No [ado] section configured. Add credentials to ~/.reqtree/config.toml"),
    }
}
