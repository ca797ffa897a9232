//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Services are generic over repository/provider/gateway traits, but AppState
//! pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;
use tracing::{info, warn};

use casework_core::llm::box_provider::BoxLlmProvider;
use casework_core::llm::GenerationSettings;
use casework_core::service::assessment::AssessmentService;
use casework_core::service::billing::BillingService;
use casework_core::service::case::CaseService;
use casework_core::service::chat::ChatService;
use casework_core::service::transcription::TranscriptionService;
use casework_core::service::user::UserService;
use casework_infra::billing::stripe::StripeGateway;
use casework_infra::config::{load_config, resolve_data_dir, Secrets};
use casework_infra::llm::openai::OpenAiProvider;
use casework_infra::llm::whisper::WhisperTranscriber;
use casework_infra::sqlite::case::SqliteCaseRepository;
use casework_infra::sqlite::chat::SqliteChatRepository;
use casework_infra::sqlite::pool::{database_url, DatabasePool};
use casework_infra::sqlite::subscription::SqliteSubscriptionRepository;
use casework_infra::sqlite::user::SqliteUserRepository;
use casework_types::config::{AppConfig, LlmConfig};

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatService =
    ChatService<SqliteChatRepository, SqliteCaseRepository, BoxLlmProvider>;

pub type ConcreteAssessmentService =
    AssessmentService<SqliteChatRepository, SqliteCaseRepository, BoxLlmProvider>;

pub type ConcreteCaseService = CaseService<SqliteCaseRepository>;

pub type ConcreteBillingService = BillingService<SqliteSubscriptionRepository, StripeGateway>;

pub type ConcreteTranscriptionService = TranscriptionService<WhisperTranscriber>;

pub type ConcreteUserService = UserService<SqliteUserRepository, SqliteSubscriptionRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub assessment_service: Arc<ConcreteAssessmentService>,
    pub case_service: Arc<ConcreteCaseService>,
    pub billing_service: Arc<ConcreteBillingService>,
    pub transcription_service: Arc<ConcreteTranscriptionService>,
    pub user_service: Arc<ConcreteUserService>,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let mut config = load_config(&data_dir).await?;
        let secrets = Secrets::from_env();
        secrets.apply(&mut config);

        let db_url = format!("{}?mode=rwc", database_url(&data_dir));
        let db_pool = DatabasePool::new(&db_url).await?;

        Self::build(config, &secrets, db_pool, data_dir)
    }

    /// Wire the services over an open pool.
    pub fn build(
        config: AppConfig,
        secrets: &Secrets,
        db_pool: DatabasePool,
        data_dir: PathBuf,
    ) -> anyhow::Result<Self> {
        let llm = secrets
            .openai_api_key
            .as_ref()
            .map(|key| Arc::new(build_llm(key, &config.llm)));
        if llm.is_none() {
            warn!("OPENAI_API_KEY not set; replies, assessment and transcription are disabled");
        }

        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool.clone()),
            SqliteCaseRepository::new(db_pool.clone()),
            llm.clone(),
            GenerationSettings::chat(&config.llm),
        );

        let assessment_service = AssessmentService::new(
            SqliteChatRepository::new(db_pool.clone()),
            SqliteCaseRepository::new(db_pool.clone()),
            llm,
            GenerationSettings::assessment(&config.llm),
        );

        let transcriber = match &secrets.openai_api_key {
            Some(key) => Some(WhisperTranscriber::new(
                key.clone(),
                config.llm.base_url.as_deref(),
                &config.llm.transcription_model,
            )?),
            None => None,
        };

        let gateway = match &secrets.stripe_secret_key {
            Some(key) => Some(StripeGateway::new(
                key.clone(),
                secrets.stripe_webhook_secret.clone(),
            )?),
            None => {
                warn!("STRIPE_SECRET_KEY not set; billing endpoints are disabled");
                None
            }
        };

        let billing_service = BillingService::new(
            SqliteSubscriptionRepository::new(db_pool.clone()),
            gateway,
            config.billing.price_id.clone(),
            config.billing.public_url.clone(),
        );

        let user_service = UserService::new(
            SqliteUserRepository::new(db_pool.clone()),
            SqliteSubscriptionRepository::new(db_pool.clone()),
        );

        info!(data_dir = %data_dir.display(), model = %config.llm.model, "application state ready");

        Ok(Self {
            chat_service: Arc::new(chat_service),
            assessment_service: Arc::new(assessment_service),
            case_service: Arc::new(CaseService::new(SqliteCaseRepository::new(db_pool.clone()))),
            billing_service: Arc::new(billing_service),
            transcription_service: Arc::new(TranscriptionService::new(transcriber)),
            user_service: Arc::new(user_service),
            config: Arc::new(config),
            data_dir,
        })
    }
}

fn build_llm(api_key: &SecretString, config: &LlmConfig) -> BoxLlmProvider {
    BoxLlmProvider::new(OpenAiProvider::new(
        api_key,
        config.base_url.as_deref(),
        &config.model,
    ))
}
