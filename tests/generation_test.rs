mod common;

use async_trait::async_trait;
use common::ScriptedClient;
use interview_core::config::Config;
use interview_core::models::question::{
    GenerationRequest, QuestionSource, QuestionType,
};
use interview_core::models::role::{RoleProfile, RoleTable};
use interview_core::services::llm_service::{
    CompletionRequest, ServiceError, TextCompletionClient,
};
use interview_core::services::question_service::QuestionService;
use std::collections::HashSet;
use std::sync::Arc;

mockall::mock! {
    pub Completion {}

    #[async_trait]
    impl TextCompletionClient for Completion {
        async fn complete(&self, request: CompletionRequest) -> Result<String, ServiceError>;
    }
}

fn service(client: Arc<dyn TextCompletionClient>) -> QuestionService {
    QuestionService::new(client, RoleTable::builtin(), &Config::default())
}

fn assert_unique_signatures(questions: &[interview_core::models::question::QuestionSpec]) {
    let signatures: HashSet<&str> = questions.iter().map(|q| q.signature.as_str()).collect();
    assert_eq!(signatures.len(), questions.len());
}

#[tokio::test]
async fn failing_client_degrades_to_stub_backfill() {
    common::init_tracing();
    let mut mock = MockCompletion::new();
    mock.expect_complete().returning(|_| {
        Err(ServiceError::Exhausted {
            attempts: 4,
            last: "connection refused".to_string(),
        })
    });

    let result = service(Arc::new(mock))
        .generate(&GenerationRequest::new("tech", 4, 3))
        .await
        .unwrap();

    assert_eq!(result.questions.len(), 4);
    assert_eq!(result.shortfall, 0);
    assert_unique_signatures(&result.questions);
    for q in &result.questions {
        assert_eq!(q.source, QuestionSource::Template);
        // tech math quota rounds to zero, so no stub may classify as math
        assert_eq!(q.question_type, QuestionType::Reasoning);
    }
}

#[tokio::test]
async fn zero_math_quota_carries_instruction_and_rejects_math_items() {
    let batch = r#"[
        {"text": "Explain what an API gateway does.", "keywords": "gateway,routing", "difficulty": 3, "type": "reasoning"},
        {"text": "Describe how you would design a URL shortener.", "keywords": "hashing,storage", "difficulty": 4, "type": "reasoning"},
        {"text": "What does idempotency mean for HTTP endpoints?", "keywords": "idempotency,http", "difficulty": 3, "type": "reasoning"},
        {"text": "Explain eventual consistency to a new teammate.", "keywords": "consistency,replication", "difficulty": 3, "type": "reasoning"},
        {"text": "Compute 17 plus 25 and explain your steps.", "keywords": "addition", "difficulty": 1, "type": "math"}
    ]"#;
    let client = Arc::new(ScriptedClient::replying(&[batch]));
    let result = service(client.clone())
        .generate(&GenerationRequest::new("tech", 5, 3))
        .await
        .unwrap();

    let prompts = client.prompts();
    assert!(prompts[0].contains("zero math items"));

    assert_eq!(result.questions.len(), 5);
    assert!(result
        .questions
        .iter()
        .all(|q| q.question_type == QuestionType::Reasoning));
    assert!(result
        .questions
        .iter()
        .all(|q| !q.text.contains("17 plus 25")));
    // four survivors from the model, one stub to cover the rejected item
    assert_eq!(
        result
            .questions
            .iter()
            .filter(|q| q.source == QuestionSource::Llm)
            .count(),
        4
    );
    assert_eq!(
        result
            .questions
            .iter()
            .filter(|q| q.source == QuestionSource::Template)
            .count(),
        1
    );
}

#[tokio::test]
async fn duplicates_collapse_within_and_across_batches() {
    let first = r#"[
        {"text": "How do you deal with conflicting priorities?", "keywords": "priorities", "difficulty": 2, "type": "reasoning"},
        {"text": "  how do you   deal with CONFLICTING priorities? ", "keywords": "priorities", "difficulty": 2, "type": "reasoning"},
        {"text": "Describe a moment you changed your mind at work.", "keywords": "feedback", "difficulty": 2, "type": "reasoning"}
    ]"#;
    let second = r#"[
        {"text": "How do you deal with conflicting priorities?", "keywords": "priorities", "difficulty": 2, "type": "reasoning"},
        {"text": "What makes feedback useful to you?", "keywords": "feedback,growth", "difficulty": 2, "type": "reasoning"}
    ]"#;
    let client = Arc::new(ScriptedClient::replying(&[first, second]));
    let result = service(client.clone())
        .generate(&GenerationRequest::new("hr", 3, 2))
        .await
        .unwrap();

    assert_eq!(result.questions.len(), 3);
    assert_eq!(result.shortfall, 0);
    assert_unique_signatures(&result.questions);
    assert!(result
        .questions
        .iter()
        .all(|q| q.source == QuestionSource::Llm));
    assert_eq!(client.prompts().len(), 2);
}

#[tokio::test]
async fn math_quota_swaps_out_reasoning_and_tops_up() {
    // apt with count 2 rounds to a quota of one math item
    let first = r#"[
        {"text": "Explain your approach to breaking down problems.", "keywords": "decomposition", "difficulty": 3, "type": "reasoning"},
        {"text": "Walk through how you verify an assumption.", "keywords": "verification", "difficulty": 3, "type": "reasoning"}
    ]"#;
    let second = r#"[
        {"text": "A train covers 180 km in 3 hours. What is its average speed?", "keywords": "speed,distance", "difficulty": 2, "type": "math"}
    ]"#;
    let client = Arc::new(ScriptedClient::replying(&[first, second]));
    let result = service(client.clone())
        .generate(&GenerationRequest::new("apt", 2, 3))
        .await
        .unwrap();

    assert_eq!(result.questions.len(), 2);
    assert_eq!(
        result.questions[0].text,
        "Explain your approach to breaking down problems."
    );
    assert_eq!(result.questions[1].question_type, QuestionType::Math);

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("Exactly 1 of the 1"));
}

#[tokio::test]
async fn disallowed_types_are_replaced_not_substituted() {
    let roles = RoleTable::builtin().with_role(
        "puzzle",
        RoleProfile::new(0.5, vec![QuestionType::Reasoning]),
    );
    let first = r#"[
        {"text": "Add 40 and 2, then double the result.", "keywords": "addition", "difficulty": 1, "type": "math"},
        {"text": "Describe a puzzle you enjoyed solving and why.", "keywords": "curiosity", "difficulty": 2, "type": "reasoning"}
    ]"#;
    let replacement = r#"[
        {"text": "Explain a strategy you reuse across different puzzles.", "keywords": "strategy", "difficulty": 2, "type": "reasoning"}
    ]"#;
    let client = Arc::new(ScriptedClient::replying(&[first, replacement]));
    let generator = QuestionService::new(client.clone(), roles, &Config::default());
    let result = generator
        .generate(&GenerationRequest::new("puzzle", 2, 2))
        .await
        .unwrap();

    assert_eq!(result.questions.len(), 2);
    assert!(result
        .questions
        .iter()
        .all(|q| q.question_type == QuestionType::Reasoning));
    assert_eq!(
        result.questions[0].text,
        "Describe a puzzle you enjoyed solving and why."
    );
    assert_eq!(
        result.questions[1].text,
        "Explain a strategy you reuse across different puzzles."
    );
}

#[tokio::test]
async fn math_items_without_numerals_get_enriched() {
    let batch = r#"[
        {"text": "Estimate the probability of a fair coin landing heads twice in a row.", "keywords": "probability", "difficulty": 2, "type": "math"}
    ]"#;
    let client = Arc::new(ScriptedClient::replying(&[batch]));
    let result = service(client)
        .generate(&GenerationRequest::new("apt", 1, 2))
        .await
        .unwrap();

    assert_eq!(result.questions.len(), 1);
    let question = &result.questions[0];
    assert_eq!(question.question_type, QuestionType::Math);
    assert!(question.text.chars().any(|c| c.is_ascii_digit()));
    assert!(question.keywords.ends_with("numbers"));
}

#[tokio::test]
async fn stub_pool_exhaustion_returns_short_in_production() {
    // hr has four viable static templates: the "tell me about a time" template
    // classifies as math (the word "time") and is rejected under a zero quota
    let result = service(Arc::new(ScriptedClient::failing()))
        .generate(&GenerationRequest::new("hr", 5, 2))
        .await
        .unwrap();

    assert!(result.questions.len() <= 4);
    assert!(result.shortfall >= 1);
    assert!(!result.is_complete());
    assert_unique_signatures(&result.questions);
    assert!(result
        .questions
        .iter()
        .all(|q| q.source == QuestionSource::Template));
}

#[tokio::test]
async fn stub_variants_fill_the_gap_in_development_mode() {
    let config = Config {
        stub_variants: true,
        ..Config::default()
    };
    let generator = QuestionService::new(
        Arc::new(ScriptedClient::failing()),
        RoleTable::builtin(),
        &config,
    );
    let result = generator
        .generate(&GenerationRequest::new("hr", 5, 2))
        .await
        .unwrap();

    assert_eq!(result.questions.len(), 5);
    assert_eq!(result.shortfall, 0);
    assert_unique_signatures(&result.questions);
    assert!(result.questions.iter().any(|q| q.text.contains("(variant")));
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_any_call() {
    let client = Arc::new(ScriptedClient::failing());
    let generator = service(client.clone());

    assert!(generator
        .generate(&GenerationRequest::new("tech", 0, 3))
        .await
        .is_err());
    assert!(generator
        .generate(&GenerationRequest::new("tech", 3, 9))
        .await
        .is_err());
    assert!(client.prompts().is_empty());
}

#[tokio::test]
async fn unknown_role_resolves_to_balanced_profile() {
    let batch = r#"[
        {"text": "Split 90 minutes across 4 tasks and justify the split.", "keywords": "planning", "difficulty": 3, "type": "math"},
        {"text": "Explain how you prioritize under ambiguity.", "keywords": "prioritization", "difficulty": 3, "type": "reasoning"}
    ]"#;
    let client = Arc::new(ScriptedClient::replying(&[batch]));
    let result = service(client.clone())
        .generate(&GenerationRequest::new("astronaut", 2, 3))
        .await
        .unwrap();

    // balanced default: one math slot out of two
    assert!(client.prompts()[0].contains("Exactly 1 of the 2"));
    assert_eq!(result.questions.len(), 2);
    assert_eq!(
        result
            .questions
            .iter()
            .filter(|q| q.question_type == QuestionType::Math)
            .count(),
        1
    );
}
