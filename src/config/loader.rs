//! Document template catalog loader
//! Loads the YAML catalog of HTML templates used by the document generator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::database::models::DocumentTemplate;
use crate::database::queries::Queries;
use crate::database::Database;
use crate::error::GovernanceError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateCatalog {
    pub templates: BTreeMap<String, TemplateEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateEntry {
    pub name: String,
    pub html_content: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl TemplateCatalog {
    /// Load a catalog file such as `templates.yml`
    pub fn load_from_file(path: &Path) -> Result<Self, GovernanceError> {
        info!("Loading document templates from: {:?}", path);

        if !path.exists() {
            return Err(GovernanceError::ConfigError(format!(
                "Template catalog not found: {:?}",
                path
            )));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            GovernanceError::ConfigError(format!("Failed to read {:?}: {}", path, e))
        })?;

        Self::parse(&contents).map_err(|e| match e {
            GovernanceError::ConfigError(msg) => {
                GovernanceError::ConfigError(format!("{:?}: {}", path, msg))
            }
            other => other,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, GovernanceError> {
        let catalog: TemplateCatalog = serde_yaml::from_str(contents)
            .map_err(|e| GovernanceError::ConfigError(format!("Failed to parse catalog: {}", e)))?;

        for (key, entry) in &catalog.templates {
            if entry.html_content.trim().is_empty() {
                return Err(GovernanceError::ConfigError(format!(
                    "Template {} has no HTML content",
                    key
                )));
            }
        }

        info!("Loaded {} document templates", catalog.templates.len());
        Ok(catalog)
    }

    pub fn to_templates(&self) -> Vec<DocumentTemplate> {
        self.templates
            .iter()
            .map(|(key, entry)| DocumentTemplate {
                template_key: key.clone(),
                name: entry.name.clone(),
                html_content: entry.html_content.clone(),
                is_active: entry.is_active,
            })
            .collect()
    }

    /// Writes every catalog entry into `document_templates`, replacing
    /// stored templates with the same key.
    pub async fn seed(&self, database: &Database) -> Result<usize, GovernanceError> {
        let templates = self.to_templates();
        for template in &templates {
            Queries::upsert_template(database.pool(), template).await?;
        }
        info!("Seeded {} document templates", templates.len());
        Ok(templates.len())
    }
}
