//! Case studies and the agent personas that front them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Unique identifier for a case, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(pub Uuid);

impl CaseId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for CaseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CaseId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for an agent persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AgentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An AI persona the learner talks to while working a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    /// Role or job title shown next to the name ("head of procurement").
    pub position: Option<String>,
    /// System-prompt fragment describing how the persona behaves.
    pub prompt: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A case study presented to the learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    /// URL-safe unique slug.
    pub slug: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub story: Option<String>,
    /// Rubric: learning outcomes and grading criteria, kept as free-form JSON.
    pub criteria_outcomes: Option<serde_json::Value>,
    pub difficulty: Option<i32>,
    pub tags: Vec<String>,
    pub is_public: bool,
    /// Case that should be completed before this one.
    pub can_be_done_after: Option<CaseId>,
    /// The persona that fronts this case.
    pub agent_id: Option<AgentId>,
    pub created_at: DateTime<Utc>,
}

/// A case joined with its agent persona, as returned by case lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseWithAgent {
    #[serde(flatten)]
    pub case: Case,
    pub agent: Option<Agent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_id_display_parse() {
        let id = CaseId::new();
        let parsed: CaseId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_case_with_agent_flattens_case_fields() {
        let case = Case {
            id: CaseId::new(),
            slug: "supplier-audit".to_string(),
            title: Some("Supplier audit".to_string()),
            description: None,
            story: None,
            criteria_outcomes: None,
            difficulty: Some(2),
            tags: vec!["procurement".to_string()],
            is_public: true,
            can_be_done_after: None,
            agent_id: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(CaseWithAgent { case, agent: None }).unwrap();
        assert_eq!(value["slug"], "supplier-audit");
        assert!(value["agent"].is_null());
    }
}
