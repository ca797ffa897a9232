//! In-memory repository and provider fakes shared by the service tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use casework_types::case::{Agent, AgentId, Case, CaseId, CaseWithAgent};
use casework_types::chat::{Chat, ChatId, ChatMessage, ChatStatus, NewChat};
use casework_types::error::RepositoryError;
use casework_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, StopReason, Usage,
};
use casework_types::subscription::{Plan, Subscription, SubscriptionStatus, SubscriptionSync};
use casework_types::user::{User, UserId};

use crate::llm::provider::LlmProvider;
use crate::repository::case::CaseRepository;
use crate::repository::chat::{AssessmentUpdate, ChatRepository};
use crate::repository::subscription::SubscriptionRepository;
use crate::repository::user::UserRepository;

// --- Chats ---

#[derive(Clone, Default)]
pub struct InMemoryChats {
    pub chats: Arc<Mutex<Vec<Chat>>>,
}

impl InMemoryChats {
    pub fn snapshot(&self, id: ChatId) -> Chat {
        self.chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .unwrap()
    }

    pub fn insert(&self, chat: Chat) {
        self.chats.lock().unwrap().push(chat);
    }

    fn newest_first(mut chats: Vec<Chat>) -> Vec<Chat> {
        chats.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        chats
    }
}

impl ChatRepository for InMemoryChats {
    async fn create(&self, new: &NewChat) -> Result<Chat, RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        let id = ChatId(chats.iter().map(|c| c.id.0).max().unwrap_or(0) + 1);
        let chat = Chat {
            id,
            user_id: new.user_id,
            case_id: new.case_id,
            agent_id: new.agent_id,
            status: ChatStatus::Created,
            messages: Vec::new(),
            assessment: None,
            learning_outcomes: None,
            is_archived: false,
            user_rating: None,
            created_at: new.created_at,
        };
        chats.push(chat.clone());
        Ok(chat)
    }

    async fn get_for_user(
        &self,
        id: ChatId,
        user_id: &UserId,
    ) -> Result<Option<Chat>, RepositoryError> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id && c.user_id == *user_id)
            .cloned())
    }

    async fn find_unarchived(
        &self,
        user_id: &UserId,
        case_id: &CaseId,
    ) -> Result<Option<Chat>, RepositoryError> {
        let chats = self.list_for_case(user_id, case_id).await?;
        Ok(chats.into_iter().find(|c| !c.is_archived))
    }

    async fn list_for_case(
        &self,
        user_id: &UserId,
        case_id: &CaseId,
    ) -> Result<Vec<Chat>, RepositoryError> {
        let chats: Vec<Chat> = self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == *user_id && c.case_id == *case_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(chats))
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Chat>, RepositoryError> {
        let chats: Vec<Chat> = self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == *user_id)
            .cloned()
            .collect();
        Ok(Self::newest_first(chats))
    }

    async fn append_message(
        &self,
        id: ChatId,
        message: &ChatMessage,
        status: ChatStatus,
    ) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        let chat = chats
            .iter_mut()
            .find(|c| c.id == id && c.status.is_open())
            .ok_or(RepositoryError::NotFound)?;
        chat.push_message(message.clone());
        chat.status = status;
        Ok(())
    }

    async fn set_status(&self, id: ChatId, status: ChatStatus) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        let chat = chats
            .iter_mut()
            .find(|c| c.id == id && (c.status.is_open() || c.status == status))
            .ok_or(RepositoryError::NotFound)?;
        chat.status = status;
        Ok(())
    }

    async fn record_assessment(
        &self,
        id: ChatId,
        update: &AssessmentUpdate,
    ) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        let chat = chats
            .iter_mut()
            .find(|c| c.id == id && c.status.is_open())
            .ok_or(RepositoryError::NotFound)?;
        chat.status = update.status;
        chat.assessment = Some(update.score);
        chat.learning_outcomes = Some(update.learning_outcomes.clone());
        chat.push_message(update.summary.clone());
        Ok(())
    }

    async fn archive(&self, id: ChatId) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        let chat = chats
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        chat.is_archived = true;
        Ok(())
    }
}

// --- Cases ---

#[derive(Clone, Default)]
pub struct InMemoryCases {
    pub cases: Arc<Mutex<Vec<Case>>>,
    pub agents: Arc<Mutex<Vec<Agent>>>,
}

impl InMemoryCases {
    /// Seed one agent and one case fronted by it.
    pub fn seeded() -> (Self, Case, Agent) {
        let repo = Self::default();
        let agent = sample_agent("Dana");
        let mut case = sample_case("late-shipment");
        case.agent_id = Some(agent.id);
        repo.agents.lock().unwrap().push(agent.clone());
        repo.cases.lock().unwrap().push(case.clone());
        (repo, case, agent)
    }
}

impl CaseRepository for InMemoryCases {
    async fn list(&self) -> Result<Vec<Case>, RepositoryError> {
        Ok(self.cases.lock().unwrap().clone())
    }

    async fn get(&self, id: &CaseId) -> Result<Option<Case>, RepositoryError> {
        Ok(self.cases.lock().unwrap().iter().find(|c| c.id == *id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<CaseWithAgent>, RepositoryError> {
        let case = self
            .cases
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.slug == slug)
            .cloned();
        Ok(match case {
            Some(case) => {
                let agent = match &case.agent_id {
                    Some(id) => self.get_agent(id).await?,
                    None => None,
                };
                Some(CaseWithAgent { case, agent })
            }
            None => None,
        })
    }

    async fn get_agent(&self, id: &AgentId) -> Result<Option<Agent>, RepositoryError> {
        Ok(self.agents.lock().unwrap().iter().find(|a| a.id == *id).cloned())
    }

    async fn upsert_agent(&self, agent: &Agent) -> Result<AgentId, RepositoryError> {
        let mut agents = self.agents.lock().unwrap();
        if let Some(existing) = agents.iter_mut().find(|a| a.name == agent.name) {
            let id = existing.id;
            *existing = Agent { id, ..agent.clone() };
            return Ok(id);
        }
        agents.push(agent.clone());
        Ok(agent.id)
    }

    async fn upsert_case(&self, case: &Case) -> Result<CaseId, RepositoryError> {
        let mut cases = self.cases.lock().unwrap();
        if let Some(existing) = cases.iter_mut().find(|c| c.slug == case.slug) {
            let id = existing.id;
            *existing = Case { id, ..case.clone() };
            return Ok(id);
        }
        cases.push(case.clone());
        Ok(case.id)
    }
}

// --- Users ---

#[derive(Clone, Default)]
pub struct InMemoryUsers {
    pub users: Arc<Mutex<Vec<(User, String)>>>,
}

impl UserRepository for InMemoryUsers {
    async fn create(&self, user: &User, token_hash: &str) -> Result<User, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|(u, _)| u.email.is_some() && u.email == user.email) {
            return Err(RepositoryError::Conflict("email already registered".to_string()));
        }
        users.push((user.clone(), token_hash.to_string()));
        Ok(user.clone())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|(_, h)| h == token_hash)
            .map(|(u, _)| u.clone()))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|(u, _)| u.email.as_deref() == Some(email))
            .map(|(u, _)| u.clone()))
    }
}

// --- Subscriptions ---

#[derive(Clone, Default)]
pub struct InMemorySubscriptions {
    pub rows: Arc<Mutex<Vec<Subscription>>>,
}

impl InMemorySubscriptions {
    pub fn snapshot(&self, user_id: &UserId) -> Subscription {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == *user_id)
            .cloned()
            .unwrap()
    }

    fn update_where(
        &self,
        matches: impl Fn(&Subscription) -> bool,
        apply: impl Fn(&mut Subscription),
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let mut touched = false;
        for row in rows.iter_mut().filter(|r| matches(r)) {
            apply(row);
            row.updated_at = Utc::now();
            touched = true;
        }
        if touched { Ok(()) } else { Err(RepositoryError::NotFound) }
    }
}

impl SubscriptionRepository for InMemorySubscriptions {
    async fn create(&self, subscription: &Subscription) -> Result<(), RepositoryError> {
        self.rows.lock().unwrap().push(subscription.clone());
        Ok(())
    }

    async fn get_by_user(&self, user_id: &UserId) -> Result<Option<Subscription>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.user_id == *user_id)
            .cloned())
    }

    async fn get_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<Subscription>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn set_customer(&self, user_id: &UserId, customer_id: &str) -> Result<(), RepositoryError> {
        self.update_where(
            |r| r.user_id == *user_id,
            |r| r.stripe_customer_id = Some(customer_id.to_string()),
        )
    }

    async fn link_subscription(
        &self,
        user_id: &UserId,
        subscription_id: &str,
    ) -> Result<(), RepositoryError> {
        self.update_where(
            |r| r.user_id == *user_id,
            |r| {
                r.stripe_subscription_id = Some(subscription_id.to_string());
                r.status = SubscriptionStatus::Active;
            },
        )
    }

    async fn sync(&self, user_id: &UserId, sync: &SubscriptionSync) -> Result<(), RepositoryError> {
        self.update_where(
            |r| r.user_id == *user_id,
            |r| {
                r.plan = sync.plan;
                r.status = sync.status;
                r.stripe_subscription_id = Some(sync.stripe_subscription_id.clone());
                r.stripe_price_id = sync.stripe_price_id.clone();
                r.current_period_start = sync.current_period_start;
                r.current_period_end = sync.current_period_end;
            },
        )
    }

    async fn set_status(
        &self,
        user_id: &UserId,
        status: SubscriptionStatus,
    ) -> Result<(), RepositoryError> {
        self.update_where(|r| r.user_id == *user_id, |r| r.status = status)
    }

    async fn set_status_by_customer(
        &self,
        customer_id: &str,
        status: SubscriptionStatus,
    ) -> Result<(), RepositoryError> {
        self.update_where(
            |r| r.stripe_customer_id.as_deref() == Some(customer_id),
            |r| r.status = status,
        )
    }

    async fn cancel_by_customer(
        &self,
        customer_id: &str,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        self.update_where(
            |r| r.stripe_customer_id.as_deref() == Some(customer_id),
            |r| {
                r.plan = Plan::Free;
                r.status = SubscriptionStatus::Canceled;
                r.current_period_end = current_period_end;
            },
        )
    }
}

// --- LLM ---

/// Returns a fixed reply (or error) and records every request it receives.
#[derive(Clone)]
pub struct ScriptedProvider {
    reply: Result<String, String>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            requests: Arc::default(),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Arc::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Ok(text) => Ok(CompletionResponse {
                id: "resp-test".to_string(),
                content: text.clone(),
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            }),
            Err(message) => Err(LlmError::Provider {
                message: message.clone(),
            }),
        }
    }
}

// --- Builders ---

pub fn sample_agent(name: &str) -> Agent {
    Agent {
        id: AgentId::new(),
        name: name.to_string(),
        position: Some("operations manager".to_string()),
        prompt: Some("You are worried about the delay.".to_string()),
        created_at: Utc::now(),
    }
}

pub fn sample_case(slug: &str) -> Case {
    Case {
        id: CaseId::new(),
        slug: slug.to_string(),
        title: Some("Late shipment".to_string()),
        description: Some("A supplier missed a deadline".to_string()),
        story: Some("It is Monday morning.".to_string()),
        criteria_outcomes: Some(serde_json::json!({"root_cause": "Identify the root cause"})),
        difficulty: Some(1),
        tags: vec!["operations".to_string()],
        is_public: true,
        can_be_done_after: None,
        agent_id: None,
        created_at: Utc::now(),
    }
}

pub fn sample_user() -> User {
    User {
        id: UserId::new(),
        email: Some("learner@example.com".to_string()),
        created_at: Utc::now(),
    }
}
