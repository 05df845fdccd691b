use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{Source, SourceProject};
use crate::config::JiraConfig;
use crate::model::tree::{IssueLink, RequirementsTree, SourceIssue};
use crate::util::retry::retry_request;

const JIRA_API: &str = "rest/api/2";
const REQUIREMENTS_API: &str = "rest/com.easesolutions.jira.plugins.requirements/1.0";

/// Jira Data Center instance running the Requirements plugin.
pub struct JiraDataCenter {
    base_url: String,
    auth_header: String,
    client: reqwest::Client,
}

impl JiraDataCenter {
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let auth_header = match (&config.pat, &config.username, &config.password) {
            (Some(pat), _, _) if !pat.is_empty() => format!("Bearer {pat}"),
            (_, Some(user), Some(password)) => {
                let creds = format!("{user}:{password}");
                let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
                format!("Basic {encoded}")
            }
            _ => bail!("Jira config needs either a pat or username/password"),
        };
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .context("Failed to build Jira HTTP client")?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            auth_header,
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        retry_request(|| async {
            let resp = self
                .client
                .get(url)
                .header("Authorization", &self.auth_header)
                .header("Accept", "application/json")
                .send()
                .await?
                .error_for_status()?;
            Ok(resp.json::<T>().await?)
        })
        .await
    }
}

#[derive(Deserialize)]
struct ProjectWire {
    key: String,
    name: String,
}

#[derive(Deserialize)]
struct SearchWire {
    issues: Vec<IssueWire>,
}

#[derive(Deserialize)]
struct IssueWire {
    id: String,
    key: String,
    fields: IssueFieldsWire,
}

#[derive(Deserialize)]
struct IssueFieldsWire {
    summary: Option<String>,
    description: Option<String>,
    issuetype: Option<NamedWire>,
    status: Option<NamedWire>,
    #[serde(default)]
    issuelinks: Vec<IssueLinkWire>,
}

#[derive(Deserialize)]
struct NamedWire {
    name: String,
}

#[derive(Deserialize)]
struct IssueLinkWire {
    #[serde(rename = "type")]
    link_type: Option<NamedWire>,
    #[serde(rename = "outwardIssue")]
    outward_issue: Option<LinkedIssueWire>,
}

#[derive(Deserialize)]
struct LinkedIssueWire {
    id: String,
}

impl IssueWire {
    fn normalize(self) -> SourceIssue {
        // Every link shows up on both endpoints; keeping the outward side
        // only avoids creating each relation twice.
        let links = self
            .fields
            .issuelinks
            .into_iter()
            .filter_map(|link| {
                let target = link.outward_issue?;
                let name = link.link_type?;
                Some(IssueLink {
                    link_type: name.name,
                    target_source_id: target.id,
                })
            })
            .collect();

        SourceIssue {
            id: self.id,
            key: self.key,
            summary: self.fields.summary.unwrap_or_default(),
            description: self.fields.description.unwrap_or_default(),
            issue_type: self.fields.issuetype.map(|t| t.name).unwrap_or_default(),
            status: self.fields.status.map(|s| s.name).unwrap_or_default(),
            links,
        }
    }
}

#[async_trait]
impl Source for JiraDataCenter {
    async fn project_by_name(&self, name: &str) -> Result<SourceProject> {
        let url = format!("{}/{JIRA_API}/project", self.base_url);
        let projects: Vec<ProjectWire> = self
            .get_json(&url)
            .await
            .context("Failed to list Jira projects")?;
        projects
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| SourceProject {
                key: p.key,
                name: p.name,
            })
            .with_context(|| format!("Project with name {name} not found"))
    }

    async fn project_issues(
        &self,
        project_key: &str,
        project_name: &str,
    ) -> Result<Vec<SourceIssue>> {
        let jql = format!(
            "project={project_key} OR issue in requirementsPath(\"{project_name}\")"
        );
        let url = format!(
            "{}/{JIRA_API}/search?jql={}&maxResults=1000&fields=summary,description,issuetype,status,issuelinks",
            self.base_url,
            urlencoding::encode(&jql)
        );
        let search: SearchWire = self
            .get_json(&url)
            .await
            .context("Failed to search Jira issues")?;
        Ok(search.issues.into_iter().map(IssueWire::normalize).collect())
    }

    async fn requirements_tree(&self, project_key: &str) -> Result<RequirementsTree> {
        let url = format!("{}/{REQUIREMENTS_API}/tree/{project_key}", self.base_url);
        self.get_json(&url)
            .await
            .context("Failed to fetch the requirements tree")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_only_outward_links() {
        let wire: IssueWire = serde_json::from_value(serde_json::json!({
            "id": "10001",
            "key": "REQ-1",
            "fields": {
                "summary": "Login",
                "description": "The login requirement",
                "issuetype": {"name": "Requirement"},
                "status": {"name": "Done"},
                "issuelinks": [
                    {"type": {"name": "relates to"}, "outwardIssue": {"id": "10002"}},
                    {"type": {"name": "relates to"}, "inwardIssue": {"id": "10003"}}
                ]
            }
        }))
        .unwrap();

        let issue = wire.normalize();
        assert_eq!(issue.summary, "Login");
        assert_eq!(issue.status, "Done");
        assert_eq!(
            issue.links,
            vec![IssueLink {
                link_type: "relates to".to_string(),
                target_source_id: "10002".to_string(),
            }]
        );
    }

    #[test]
    fn normalize_tolerates_null_fields() {
        let wire: IssueWire = serde_json::from_value(serde_json::json!({
            "id": "10001",
            "key": "REQ-1",
            "fields": {
                "summary": null,
                "description": null,
                "issuetype": null,
                "status": null
            }
        }))
        .unwrap();

        let issue = wire.normalize();
        assert_eq!(issue.summary, "");
        assert_eq!(issue.description, "");
        assert!(issue.links.is_empty());
    }

    #[test]
    fn tree_payload_deserializes() {
        let tree: RequirementsTree = serde_json::from_value(serde_json::json!({
            "id": "PROJ",
            "folders": [{
                "id": 5,
                "name": "Reqs",
                "description": null,
                "absolutePosition": 1,
                "folders": [],
                "issues": [{
                    "issueId": 10001,
                    "key": "REQ-1",
                    "summary": "Login",
                    "absolutePosition": 1,
                    "childReqs": {"childReq": []}
                }]
            }],
            "issues": []
        }))
        .unwrap();

        assert_eq!(tree.folders.len(), 1);
        assert_eq!(tree.folders[0].issues[0].key, "REQ-1");
        assert!(tree.folders[0].issues[0].children().is_empty());
    }
}
