use std::collections::HashMap;

use crate::config::MappingConfig;
use crate::error::MigrationError;

/// Per-run, immutable view of the vocabulary translation tables plus the
/// destination's resolved folder work item type. Built once per migration
/// and passed by reference wherever mapping happens.
#[derive(Debug, Clone)]
pub struct FieldMappings {
    issue_types: HashMap<String, String>,
    statuses: HashMap<String, String>,
    link_types: HashMap<String, String>,
    folder_type: String,
}

impl FieldMappings {
    pub fn new(config: &MappingConfig, folder_type: impl Into<String>) -> Self {
        Self {
            issue_types: config.issue_types.clone(),
            statuses: config.statuses.clone(),
            link_types: config.link_types.clone(),
            folder_type: folder_type.into(),
        }
    }

    /// The destination work item type every folder node maps to.
    pub fn folder_type(&self) -> &str {
        &self.folder_type
    }

    /// Unmapped types keep their source name.
    pub fn map_issue_type<'a>(&'a self, source_type: &'a str) -> &'a str {
        self.issue_types
            .get(source_type)
            .map(String::as_str)
            .unwrap_or(source_type)
    }

    /// Type-scoped entries (`"Type/Status"`) win over bare status entries;
    /// an unmapped status keeps its source name.
    pub fn map_status<'a>(&'a self, work_item_type: &str, source_status: &'a str) -> &'a str {
        let scoped = format!("{work_item_type}/{source_status}");
        if let Some(mapped) = self.statuses.get(&scoped) {
            return mapped;
        }
        self.statuses
            .get(source_status)
            .map(String::as_str)
            .unwrap_or(source_status)
    }

    /// Link relationship names have no passthrough: the destination rejects
    /// unknown relationship names, so a missing entry is fatal.
    pub fn map_link_type<'a>(&'a self, source_name: &str) -> Result<&'a str, MigrationError> {
        self.link_types
            .get(source_name)
            .map(String::as_str)
            .ok_or_else(|| {
                MigrationError::Configuration(format!(
                    "no destination link type configured for '{source_name}'"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mappings() -> FieldMappings {
        let config = MappingConfig {
            issue_types: [("Story".to_string(), "User Story".to_string())].into(),
            statuses: [
                ("Task/Done".to_string(), "Closed".to_string()),
                ("Done".to_string(), "Resolved".to_string()),
            ]
            .into(),
            link_types: [(
                "relates to".to_string(),
                "System.LinkTypes.Related".to_string(),
            )]
            .into(),
        };
        FieldMappings::new(&config, "Folder")
    }

    #[test]
    fn issue_type_lookup_with_passthrough() {
        let m = mappings();
        assert_eq!(m.map_issue_type("Story"), "User Story");
        assert_eq!(m.map_issue_type("Epic"), "Epic");
    }

    #[test]
    fn scoped_status_wins_over_bare_status() {
        let m = mappings();
        assert_eq!(m.map_status("Task", "Done"), "Closed");
        assert_eq!(m.map_status("Bug", "Done"), "Resolved");
        assert_eq!(m.map_status("Bug", "Open"), "Open");
    }

    #[test]
    fn link_type_lookup() {
        let m = mappings();
        assert_eq!(
            m.map_link_type("relates to").unwrap(),
            "System.LinkTypes.Related"
        );
    }

    #[test]
    fn unmapped_link_type_is_a_configuration_error() {
        let m = mappings();
        let err = m.map_link_type("blocks").unwrap_err();
        assert!(matches!(err, MigrationError::Configuration(_)));
        assert!(err.to_string().contains("blocks"));
    }

    #[test]
    fn folder_type_resolved_per_run() {
        assert_eq!(mappings().folder_type(), "Folder");
    }
}
