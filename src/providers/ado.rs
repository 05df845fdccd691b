use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Destination, ProjectRef, TreeItemRef};
use crate::config::AdoConfig;
use crate::model::work_item::{CreatedItem, DestinationItem, FieldPatch};
use crate::util::retry::retry_request;

const API_VERSION: &str = "7.1-preview.3";
const API_VERSION_WIQL: &str = "5.1";
const EXTENSION_API_VERSION: &str = "3.2-preview";

const TITLE_FIELD: &str = "System.Title";
const DESCRIPTION_FIELD: &str = "System.Description";
const STATE_FIELD: &str = "System.State";

/// Azure DevOps organization running the easeRequirements extension. Tree
/// item documents live in the extension data service on the `extmgmt.` host.
pub struct AzureDevOps {
    base_url: String,
    extension_url: String,
    organization: String,
    auth_header: String,
    client: reqwest::Client,
}

impl AzureDevOps {
    pub fn new(config: &AdoConfig) -> Result<Self> {
        let creds = format!("{}:{}", config.username, config.pat);
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("Failed to build Azure DevOps HTTP client")?;
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let host = base_url.split("//").last().unwrap_or(&base_url).to_string();
        Ok(Self {
            extension_url: format!("https://extmgmt.{host}"),
            base_url,
            organization: config.organization.clone(),
            auth_header: format!("Basic {encoded}"),
            client,
        })
    }

    fn accept(version: &str) -> String {
        format!("application/json; api-version={version}")
    }

    fn tree_collection_url(&self, project_id: &str) -> String {
        format!(
            "{}/{}/_apis/ExtensionManagement/InstalledExtensions/easesol/ease-requirements/Data/Scopes/Default/Current/Collections/TreeItems_{project_id}/Documents/",
            self.extension_url, self.organization
        )
    }

    fn settings_url(&self, project_id: &str) -> String {
        format!(
            "{}/{}/_apis/ExtensionManagement/InstalledExtensions/easesol/ease-requirements/Data/Scopes/Default/Current/Collections/%24settings/Documents/Settings_{project_id}",
            self.extension_url, self.organization
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, version: &str) -> Result<T> {
        retry_request(|| async {
            let resp = self
                .client
                .get(url)
                .header("Authorization", &self.auth_header)
                .header("Accept", Self::accept(version))
                .send()
                .await?
                .error_for_status()?;
            Ok(resp.json::<T>().await?)
        })
        .await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        version: &str,
        body: &Value,
    ) -> Result<T> {
        retry_request(|| async {
            let resp = self
                .client
                .post(url)
                .header("Authorization", &self.auth_header)
                .header("Accept", Self::accept(version))
                .json(body)
                .send()
                .await?
                .error_for_status()?;
            Ok(resp.json::<T>().await?)
        })
        .await
    }

    async fn send_patch_body(
        &self,
        method: reqwest::Method,
        url: &str,
        patch: &[FieldPatch],
    ) -> Result<WorkItemWire> {
        retry_request(|| async {
            let resp = self
                .client
                .request(method.clone(), url)
                .header("Authorization", &self.auth_header)
                .header("Accept", format!("application/json-patch+json; api-version={API_VERSION}"))
                .header("Content-Type", "application/json-patch+json")
                .json(&patch)
                .send()
                .await?
                .error_for_status()?;
            Ok(resp.json::<WorkItemWire>().await?)
        })
        .await
    }
}

#[derive(Deserialize)]
struct ProjectWire {
    id: String,
    name: String,
}

#[derive(Deserialize)]
struct WiqlWire {
    #[serde(rename = "workItems")]
    work_items: Vec<WiqlItemWire>,
}

#[derive(Deserialize)]
struct WiqlItemWire {
    id: i64,
}

#[derive(Deserialize)]
struct BatchWire {
    value: Vec<WorkItemWire>,
}

#[derive(Deserialize)]
struct WorkItemWire {
    id: i64,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

impl WorkItemWire {
    fn field(&self, name: &str) -> String {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Deserialize)]
struct SettingsWire {
    value: SettingsValueWire,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsValueWire {
    folder_settings: FolderSettingsWire,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderSettingsWire {
    folder_item_type: String,
}

#[derive(Deserialize)]
struct DocumentListWire {
    #[serde(default)]
    value: Vec<DocumentWire>,
}

#[derive(Deserialize)]
struct DocumentWire {
    id: Value,
}

fn document_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Destination for AzureDevOps {
    async fn verify_access(&self) -> Result<()> {
        let url = format!("{}/{}/_apis/projects", self.base_url, self.organization);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", Self::accept(API_VERSION))
            .send()
            .await
            .context("Azure DevOps API request failed")?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            bail!("Not authorized to use the Azure DevOps REST API, check your credentials");
        }
        resp.error_for_status()
            .context("Azure DevOps project listing failed")?;
        Ok(())
    }

    async fn project(&self, id_or_name: &str) -> Result<ProjectRef> {
        let url = format!(
            "{}/{}/_apis/projects/{id_or_name}",
            self.base_url, self.organization
        );
        let project: ProjectWire = self
            .get_json(&url, API_VERSION)
            .await
            .with_context(|| format!("Project {id_or_name} not found on Azure DevOps"))?;
        Ok(ProjectRef {
            id: project.id,
            name: project.name,
        })
    }

    async fn existing_work_items(&self, project: &str) -> Result<Vec<DestinationItem>> {
        let team = format!("{project} Team");
        let wiql_url = format!(
            "{}/{}/{}/{}/_apis/wit/wiql?top=100",
            self.base_url,
            self.organization,
            urlencoding::encode(project),
            urlencoding::encode(&team)
        );
        let query = serde_json::json!({
            "query": format!(
                "SELECT [System.Id] FROM workitems WHERE [System.TeamProject] = '{project}'"
            )
        });
        let wiql: WiqlWire = self
            .post_json(&wiql_url, API_VERSION_WIQL, &query)
            .await
            .context("WIQL query failed")?;

        let ids: Vec<i64> = wiql.work_items.iter().map(|w| w.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let batch_url = format!(
            "{}/{}/{}/_apis/wit/workitemsbatch",
            self.base_url,
            self.organization,
            urlencoding::encode(project)
        );
        let body = serde_json::json!({
            "ids": ids,
            "fields": [DESCRIPTION_FIELD, TITLE_FIELD, STATE_FIELD],
        });
        let batch: BatchWire = self
            .post_json(&batch_url, API_VERSION_WIQL, &body)
            .await
            .context("Work item batch fetch failed")?;

        Ok(batch
            .value
            .into_iter()
            .map(|item| DestinationItem {
                id: item.id,
                title: item.field(TITLE_FIELD),
                description: item.field(DESCRIPTION_FIELD),
                state: item.field(STATE_FIELD),
            })
            .collect())
    }

    async fn folder_work_item_type(&self, project_id: &str) -> Result<String> {
        let settings: SettingsWire = self
            .get_json(&self.settings_url(project_id), EXTENSION_API_VERSION)
            .await
            .context(
                "Cannot retrieve the folder work item type; configure it in the Requirements settings",
            )?;
        let folder_type = settings.value.folder_settings.folder_item_type;
        if folder_type == "None" {
            bail!(
                "Folder work item type is not configured for this project; \
                 set it in the Requirements settings before migrating"
            );
        }
        debug!(%folder_type, "Resolved folder work item type");
        Ok(folder_type)
    }

    async fn create_work_item(
        &self,
        project: &str,
        work_item_type: &str,
        patch: &[FieldPatch],
    ) -> Result<CreatedItem> {
        let url = format!(
            "{}/{}/{}/_apis/wit/workitems/${}",
            self.base_url,
            self.organization,
            urlencoding::encode(project),
            urlencoding::encode(work_item_type)
        );
        let item = self
            .send_patch_body(reqwest::Method::POST, &url, patch)
            .await
            .with_context(|| format!("Error creating work item '{work_item_type}'"))?;
        Ok(CreatedItem {
            id: item.id,
            state: item.field(STATE_FIELD),
        })
    }

    async fn update_work_item(
        &self,
        project: &str,
        work_item_id: i64,
        patch: &[FieldPatch],
    ) -> Result<CreatedItem> {
        let url = format!(
            "{}/{}/{}/_apis/wit/workitems/{work_item_id}",
            self.base_url,
            self.organization,
            urlencoding::encode(project)
        );
        let item = self
            .send_patch_body(reqwest::Method::PATCH, &url, patch)
            .await
            .with_context(|| format!("Error updating work item '{work_item_id}'"))?;
        Ok(CreatedItem {
            id: item.id,
            state: item.field(STATE_FIELD),
        })
    }

    fn work_item_url(&self, work_item_id: i64) -> String {
        format!(
            "{}/{}/_apis/wit/workItems/{work_item_id}",
            self.base_url, self.organization
        )
    }

    async fn tree_items(&self, project_id: &str) -> Result<Vec<TreeItemRef>> {
        let url = self.tree_collection_url(project_id);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .header("Accept", Self::accept(EXTENSION_API_VERSION))
            .send()
            .await
            .context("Tree item listing failed")?;
        // A project that never had a tree has no document collection yet.
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let list: DocumentListWire = resp
            .error_for_status()
            .context("Tree item listing failed")?
            .json()
            .await?;
        Ok(list
            .value
            .iter()
            .map(|doc| TreeItemRef {
                id: document_id(&doc.id),
            })
            .collect())
    }

    async fn create_tree_item(
        &self,
        project_id: &str,
        child_id: i64,
        parent_id: i64,
    ) -> Result<String> {
        let url = self.tree_collection_url(project_id);
        let body = serde_json::json!({"id": child_id, "parent": parent_id});
        let doc: DocumentWire = retry_request(|| async {
            let resp = self
                .client
                .put(&url)
                .header("Authorization", &self.auth_header)
                .header("Accept", Self::accept(EXTENSION_API_VERSION))
                .json(&body)
                .send()
                .await?
                .error_for_status()?;
            Ok(resp.json::<DocumentWire>().await?)
        })
        .await
        .with_context(|| format!("Error creating tree item for work item {child_id}"))?;
        Ok(document_id(&doc.id))
    }

    async fn delete_tree_item(&self, project_id: &str, item_id: &str) -> Result<()> {
        let url = format!("{}{item_id}", self.tree_collection_url(project_id));
        retry_request(|| async {
            self.client
                .delete(&url)
                .header("Authorization", &self.auth_header)
                .header("Accept", Self::accept(EXTENSION_API_VERSION))
                .send()
                .await?
                .error_for_status()?;
            Ok(())
        })
        .await
        .with_context(|| format!("Error deleting tree item {item_id}"))
    }
}
