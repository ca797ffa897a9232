//! Case and agent repository trait definition.

use casework_types::case::{Agent, AgentId, Case, CaseId, CaseWithAgent};
use casework_types::error::RepositoryError;

/// Repository trait for case studies and their agent personas.
pub trait CaseRepository: Send + Sync {
    /// All cases in catalogue order.
    fn list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Case>, RepositoryError>> + Send;

    fn get(
        &self,
        id: &CaseId,
    ) -> impl std::future::Future<Output = Result<Option<Case>, RepositoryError>> + Send;

    /// A case by slug, joined with its agent.
    fn get_by_slug(
        &self,
        slug: &str,
    ) -> impl std::future::Future<Output = Result<Option<CaseWithAgent>, RepositoryError>> + Send;

    fn get_agent(
        &self,
        id: &AgentId,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    /// Insert or replace an agent keyed by name. Returns the stored agent id.
    fn upsert_agent(
        &self,
        agent: &Agent,
    ) -> impl std::future::Future<Output = Result<AgentId, RepositoryError>> + Send;

    /// Insert or replace a case keyed by slug. Returns the stored case id.
    fn upsert_case(
        &self,
        case: &Case,
    ) -> impl std::future::Future<Output = Result<CaseId, RepositoryError>> + Send;
}
