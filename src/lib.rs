pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::models::role::RoleTable;
use crate::services::{
    grading_service::GradingService, insight_service::InsightService, llm_service::GroqService,
    llm_service::TextCompletionClient, question_service::QuestionService,
};
use reqwest::Client;
use std::sync::Arc;

/// The wired pipeline handed to the persistence/routing layers: question
/// generation, per-answer grading, and session insight synthesis sharing one
/// text-completion client.
#[derive(Clone)]
pub struct InterviewCore {
    pub question_service: QuestionService,
    pub grading_service: GradingService,
    pub insight_service: InsightService,
}

impl InterviewCore {
    pub fn new(config: Config) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap();
        let client: Arc<dyn TextCompletionClient> =
            Arc::new(GroqService::new(&config, http_client));
        Self::with_client(client, config)
    }

    /// Construction seam for tests and alternative providers.
    pub fn with_client(client: Arc<dyn TextCompletionClient>, config: Config) -> Self {
        let question_service =
            QuestionService::new(client.clone(), RoleTable::builtin(), &config);
        let grading_service = GradingService::new(client.clone(), &config);
        let insight_service = InsightService::new(client, &config);

        Self {
            question_service,
            grading_service,
            insight_service,
        }
    }
}
