#![allow(dead_code)]

use async_trait::async_trait;
use interview_core::services::llm_service::{
    CompletionRequest, ServiceError, TextCompletionClient,
};
use std::collections::VecDeque;
use std::sync::{Mutex, Once};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .init();
    });
}

/// Deterministic client double: replays a scripted sequence of responses and
/// records every prompt it was asked. Once the script runs out, every further
/// call fails the way an exhausted retry loop would.
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn failing() -> Self {
        Self::new(Vec::new())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextCompletionClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError> {
        self.prompts.lock().unwrap().push(request.prompt);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(raw)) => Ok(raw),
            Some(Err(message)) => Err(ServiceError::Exhausted {
                attempts: 1,
                last: message,
            }),
            None => Err(ServiceError::Exhausted {
                attempts: 4,
                last: "script exhausted".to_string(),
            }),
        }
    }
}
