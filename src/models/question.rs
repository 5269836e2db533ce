use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Math,
    Reasoning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    Llm,
    Template,
}

/// A validated, deduplicated interview question ready for persistence.
/// `signature` is always the digest of the normalized final `text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub text: String,
    pub keywords: String,
    pub difficulty: i32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub signature: String,
    pub source: QuestionSource,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GenerationRequest {
    pub role: String,
    #[validate(range(min = 1))]
    pub count: u32,
    #[validate(range(min = 1, max = 5))]
    pub difficulty: i32,
}

impl GenerationRequest {
    pub fn new(role: impl Into<String>, count: u32, difficulty: i32) -> Self {
        Self {
            role: role.into(),
            count,
            difficulty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub questions: Vec<QuestionSpec>,
    /// How many requested slots could not be filled with unique, policy-compliant
    /// questions. Non-zero values should surface as an advisory notice upstream.
    pub shortfall: usize,
}

impl GenerationResult {
    pub fn is_complete(&self) -> bool {
        self.shortfall == 0
    }
}
