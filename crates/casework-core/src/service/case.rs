//! Case catalogue: listing, lookup and TOML import.

use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use casework_types::case::{Agent, AgentId, Case, CaseId, CaseWithAgent};
use casework_types::error::RepositoryError;

use crate::repository::case::CaseRepository;

/// Errors from importing a case catalogue.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalogue: {0}")]
    Parse(String),

    #[error("case '{case}' references unknown agent '{agent}'")]
    UnknownAgent { case: String, agent: String },

    #[error("case '{case}' requires unknown case '{prerequisite}'")]
    UnknownPrerequisite { case: String, prerequisite: String },

    #[error("duplicate slug '{0}' in catalogue")]
    DuplicateSlug(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A catalogue file: agent personas plus the cases they front.
#[derive(Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
    #[serde(default)]
    pub cases: Vec<CaseEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AgentEntry {
    pub name: String,
    pub position: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CaseEntry {
    pub slug: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub story: Option<String>,
    pub difficulty: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    /// Agent name, defined in the same file.
    pub agent: Option<String>,
    /// Slug of the case to finish first.
    pub can_be_done_after: Option<String>,
    pub criteria_outcomes: Option<serde_json::Value>,
}

fn default_public() -> bool {
    true
}

impl Catalog {
    pub fn from_toml(source: &str) -> Result<Self, CatalogError> {
        toml::from_str(source).map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub agents: usize,
    pub cases: usize,
}

pub struct CaseService<K: CaseRepository> {
    cases: K,
}

impl<K: CaseRepository> CaseService<K> {
    pub fn new(cases: K) -> Self {
        Self { cases }
    }

    pub async fn list(&self) -> Result<Vec<Case>, RepositoryError> {
        self.cases.list().await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<CaseWithAgent>, RepositoryError> {
        self.cases.get_by_slug(slug).await
    }

    /// Upsert every agent (by name) and case (by slug) in the catalogue.
    ///
    /// References are checked before anything is written. Prerequisites may
    /// point at cases in the same file or already in the database.
    pub async fn import(&self, catalog: &Catalog) -> Result<ImportSummary, CatalogError> {
        let mut in_file: HashMap<&str, &CaseEntry> = HashMap::new();
        for entry in &catalog.cases {
            if in_file.insert(entry.slug.as_str(), entry).is_some() {
                return Err(CatalogError::DuplicateSlug(entry.slug.clone()));
            }
        }

        let mut prerequisites: HashMap<String, CaseId> = HashMap::new();
        for entry in &catalog.cases {
            if let Some(agent) = &entry.agent {
                if !catalog.agents.iter().any(|a| &a.name == agent) {
                    return Err(CatalogError::UnknownAgent {
                        case: entry.slug.clone(),
                        agent: agent.clone(),
                    });
                }
            }
            if let Some(required) = &entry.can_be_done_after {
                if in_file.contains_key(required.as_str()) {
                    continue;
                }
                match self.cases.get_by_slug(required).await? {
                    Some(existing) => {
                        prerequisites.insert(required.clone(), existing.case.id);
                    }
                    None => {
                        return Err(CatalogError::UnknownPrerequisite {
                            case: entry.slug.clone(),
                            prerequisite: required.clone(),
                        });
                    }
                }
            }
        }

        let mut agent_ids: HashMap<&str, AgentId> = HashMap::new();
        for entry in &catalog.agents {
            let agent = Agent {
                id: AgentId::new(),
                name: entry.name.clone(),
                position: entry.position.clone(),
                prompt: entry.prompt.clone(),
                created_at: Utc::now(),
            };
            let id = self.cases.upsert_agent(&agent).await?;
            debug!(agent = %entry.name, agent_id = %id, "agent imported");
            agent_ids.insert(entry.name.as_str(), id);
        }

        // First pass stores every case so in-file prerequisites get ids.
        let mut stored: Vec<Case> = Vec::with_capacity(catalog.cases.len());
        for entry in &catalog.cases {
            let mut case = Case {
                id: CaseId::new(),
                slug: entry.slug.clone(),
                title: entry.title.clone(),
                description: entry.description.clone(),
                story: entry.story.clone(),
                criteria_outcomes: entry.criteria_outcomes.clone(),
                difficulty: entry.difficulty,
                tags: entry.tags.clone(),
                is_public: entry.is_public,
                can_be_done_after: entry
                    .can_be_done_after
                    .as_ref()
                    .and_then(|slug| prerequisites.get(slug).copied()),
                agent_id: entry
                    .agent
                    .as_ref()
                    .and_then(|name| agent_ids.get(name.as_str()).copied()),
                created_at: Utc::now(),
            };
            case.id = self.cases.upsert_case(&case).await?;
            prerequisites.insert(entry.slug.clone(), case.id);
            stored.push(case);
        }

        for (case, entry) in stored.iter_mut().zip(&catalog.cases) {
            let Some(required) = &entry.can_be_done_after else {
                continue;
            };
            if case.can_be_done_after.is_some() {
                continue;
            }
            case.can_be_done_after = prerequisites.get(required).copied();
            self.cases.upsert_case(case).await?;
        }

        let summary = ImportSummary {
            agents: catalog.agents.len(),
            cases: catalog.cases.len(),
        };
        info!(agents = summary.agents, cases = summary.cases, "catalogue imported");
        Ok(summary)
    }
}
