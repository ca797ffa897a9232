//! Case submission and rubric assessment.
//!
//! Submitting a chat renders the assessment prompt, makes one model call,
//! validates the JSON report and closes the chat with the classified outcome.
//! Any failure before the final write leaves the chat exactly as it was.

use std::sync::Arc;

use tracing::{info, warn};

use casework_types::assessment::{AssessmentResult, classify, clamp_percentage};
use casework_types::chat::{ChatId, ChatMessage, ChatStatus, MessageKind};
use casework_types::error::{AssessmentError, RepositoryError};
use casework_types::user::UserId;

use crate::assessment::{parse_report, render_summary};
use crate::llm::GenerationSettings;
use crate::llm::provider::LlmProvider;
use crate::prompt;
use crate::repository::case::CaseRepository;
use crate::repository::chat::{AssessmentUpdate, ChatRepository};

/// Fallback speaker label when a chat has no agent persona.
const DEFAULT_AGENT_NAME: &str = "Agent";

pub const SUBMITTED_MESSAGE: &str = "Case successfully assessed and submitted!";

/// Runs the assessment pipeline for submitted chats.
pub struct AssessmentService<C: ChatRepository, K: CaseRepository, P: LlmProvider> {
    chats: C,
    cases: K,
    llm: Option<Arc<P>>,
    settings: GenerationSettings,
}

impl<C: ChatRepository, K: CaseRepository, P: LlmProvider> AssessmentService<C, K, P> {
    pub fn new(chats: C, cases: K, llm: Option<Arc<P>>, settings: GenerationSettings) -> Self {
        Self {
            chats,
            cases,
            llm,
            settings,
        }
    }

    /// Assess a chat and close it with the resulting status.
    ///
    /// Rejected with `AlreadySubmitted` if the chat is already closed; the
    /// model is not called in that case.
    pub async fn submit(
        &self,
        user_id: &UserId,
        id: ChatId,
        final_reflection: Option<&str>,
    ) -> Result<AssessmentResult, AssessmentError> {
        let chat = self
            .chats
            .get_for_user(id, user_id)
            .await?
            .ok_or(AssessmentError::ChatNotFound)?;

        if chat.status.is_terminal() {
            warn!(chat_id = %id, status = %chat.status, "submission rejected, chat already closed");
            return Err(AssessmentError::AlreadySubmitted);
        }

        let llm = self.llm.as_ref().ok_or(AssessmentError::NotConfigured)?;

        let case = self
            .cases
            .get(&chat.case_id)
            .await?
            .ok_or(AssessmentError::CaseNotFound)?;
        let agent = match chat.agent_id.or(case.agent_id) {
            Some(agent_id) => self.cases.get_agent(&agent_id).await?,
            None => None,
        };
        let agent_name = agent
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or(DEFAULT_AGENT_NAME);

        let rendered = prompt::assessment_prompt(&case, agent_name, &chat.messages, final_reflection);
        let request = self.settings.request(None, rendered);
        let response = llm.complete(&request).await?;

        let report = parse_report(&response.content).inspect_err(|e| {
            warn!(chat_id = %id, error = %e, "assessment response rejected");
        })?;

        let score = clamp_percentage(report.assessment_percentage);
        let outcome = classify(score);
        let status: ChatStatus = outcome.into();

        let learning_outcomes = serde_json::to_value(&report)
            .map_err(|e| AssessmentError::Schema(e.to_string()))?;
        let summary = ChatMessage::now(MessageKind::Agent, render_summary(&report, score, outcome));

        let update = AssessmentUpdate {
            status,
            score,
            learning_outcomes,
            summary,
        };
        match self.chats.record_assessment(id, &update).await {
            Ok(()) => {}
            // Another submission closed the chat while we were assessing.
            Err(RepositoryError::NotFound) => return Err(AssessmentError::AlreadySubmitted),
            Err(e) => return Err(e.into()),
        }

        info!(chat_id = %id, %user_id, score, %status, "case assessed");

        Ok(AssessmentResult {
            success: true,
            assessment_percentage: score,
            status,
            detailed_feedback: report.detailed_feedback,
            message: SUBMITTED_MESSAGE.to_string(),
        })
    }
}
