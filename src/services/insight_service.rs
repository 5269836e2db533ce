use crate::config::Config;
use crate::models::evaluation::{AnsweredQuestion, SessionInsights};
use crate::services::llm_service::{extract_json_object, CompletionRequest, TextCompletionClient};
use crate::utils::text::truncate_chars;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::warn;

const MAX_QUESTION_CHARS: usize = 600;
const MAX_ANSWER_CHARS: usize = 1000;
const MAX_FEEDBACK_CHARS: usize = 300;
const MAX_CONTEXT_CHARS: usize = 22_000;
const TITLE_CHARS: usize = 120;

const STRENGTHS_CAP: usize = 4;
const IMPROVEMENTS_CAP: usize = 6;
const RESOURCES_CAP: usize = 6;

const FALLBACK_TIP: &str =
    "Practice answering aloud and structure your responses with a clear beginning, middle, and end.";
const FALLBACK_RESOURCES: [&str; 3] = [
    "Review the core concepts behind the questions you scored lowest on",
    "Practice mock interviews with a timer",
    "Write out model answers and compare them with your own",
];

#[derive(Clone)]
pub struct InsightService {
    client: Arc<dyn TextCompletionClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl InsightService {
    pub fn new(client: Arc<dyn TextCompletionClient>, config: &Config) -> Self {
        Self {
            client,
            model: config.groq_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
        }
    }

    /// Aggregate a finished session into overall insights. All four fields are
    /// always populated; failures degrade to the score-based heuristic.
    pub async fn synthesize(&self, answers: &[AnsweredQuestion]) -> SessionInsights {
        let prompt = build_insights_prompt(answers);
        let request = CompletionRequest {
            prompt,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.client.complete(request).await {
            Ok(raw) => match extract_json_object(&raw) {
                Ok(obj) => return merge_with_fallback(&obj, answers),
                Err(e) => warn!(error = %e, "insight output unusable, using heuristic"),
            },
            Err(e) => warn!(error = %e, "insight synthesis call failed, using heuristic"),
        }

        heuristic_insights(answers)
    }
}

fn build_insights_prompt(answers: &[AnsweredQuestion]) -> String {
    let rows: Vec<JsonValue> = answers
        .iter()
        .map(|a| {
            serde_json::json!({
                "question": truncate_chars(&a.question_text, MAX_QUESTION_CHARS),
                "answer": truncate_chars(&a.answer_text, MAX_ANSWER_CHARS),
                "score": a.score,
                "feedback": truncate_chars(&a.feedback, MAX_FEEDBACK_CHARS),
            })
        })
        .collect();
    let context = serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string());
    let context = truncate_chars(&context, MAX_CONTEXT_CHARS);

    format!(
        r#"You are an expert interview coach reviewing a completed mock interview session.

Session data (JSON array of answered questions):
{context}

TASK:
Summarize the candidate's performance across the whole session.
Return ONLY a JSON object with exactly these four keys:
- "strengths": array of at most 4 short strings
- "improvements": array of at most 6 short strings
- "overall_tip": one encouraging, actionable sentence
- "resources": array of at most 6 short study suggestions

No commentary outside the JSON object."#
    )
}

/// Use the model's fields where usable, the heuristic's otherwise, so callers
/// can rely on every key being present.
fn merge_with_fallback(obj: &JsonValue, answers: &[AnsweredQuestion]) -> SessionInsights {
    let fallback = heuristic_insights(answers);

    let strengths = string_list(obj.get("strengths"), STRENGTHS_CAP);
    let improvements = string_list(obj.get("improvements"), IMPROVEMENTS_CAP);
    let overall_tip = obj
        .get("overall_tip")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let resources = string_list(obj.get("resources"), RESOURCES_CAP);

    SessionInsights {
        strengths: strengths.unwrap_or(fallback.strengths),
        improvements: improvements.unwrap_or(fallback.improvements),
        overall_tip: overall_tip.unwrap_or(fallback.overall_tip),
        resources: resources.unwrap_or(fallback.resources),
    }
}

fn string_list(value: Option<&JsonValue>, cap: usize) -> Option<Vec<String>> {
    let items = value?.as_array()?;
    let list: Vec<String> = items
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(cap)
        .collect();
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}

fn heuristic_insights(answers: &[AnsweredQuestion]) -> SessionInsights {
    let mut by_score: Vec<&AnsweredQuestion> = answers.iter().collect();
    by_score.sort_by(|a, b| b.score.cmp(&a.score));

    let strengths = by_score
        .iter()
        .take(3)
        .map(|a| truncate_chars(&a.question_text, TITLE_CHARS))
        .collect();
    let improvements = by_score
        .iter()
        .rev()
        .take(5)
        .map(|a| truncate_chars(&a.question_text, TITLE_CHARS))
        .collect();

    SessionInsights {
        strengths,
        improvements,
        overall_tip: FALLBACK_TIP.to_string(),
        resources: FALLBACK_RESOURCES.iter().map(|r| r.to_string()).collect(),
    }
}
