use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    pub score: i32,
    pub feedback: String,
    pub improvement_tips: Vec<String>,
}

/// One answered question of a finished session, as fed into insight synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question_text: String,
    pub answer_text: String,
    pub score: i32,
    pub feedback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInsights {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub overall_tip: String,
    pub resources: Vec<String>,
}
