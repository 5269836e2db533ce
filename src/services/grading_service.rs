use crate::config::Config;
use crate::models::evaluation::AnswerEvaluation;
use crate::models::question::QuestionSpec;
use crate::services::llm_service::{extract_json_array, CompletionRequest, TextCompletionClient};
use crate::utils::text::tokenize;
use std::sync::Arc;
use tracing::debug;

const FILLER_WORDS: [&str; 4] = ["um", "uh", "like", "hmm"];

const NO_ANSWER_FEEDBACK: &str = "You did not provide an answer to this question.";
const NO_ANSWER_TIPS: [&str; 3] = [
    "Answer the question in your own words",
    "Explain the main idea clearly",
    "Add an example to support your explanation",
];

const MAX_TIPS: usize = 5;

#[derive(Clone)]
pub struct GradingService {
    client: Arc<dyn TextCompletionClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GradingService {
    pub fn new(client: Arc<dyn TextCompletionClient>, config: &Config) -> Self {
        Self {
            client,
            model: config.groq_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
        }
    }

    /// Score a submitted answer against its question. Total from the caller's
    /// perspective: every input produces a storable evaluation.
    pub async fn evaluate(
        &self,
        answer_text: &str,
        question: Option<&QuestionSpec>,
    ) -> AnswerEvaluation {
        let answer = answer_text.trim();
        if answer.is_empty() {
            return Self::no_answer();
        }

        let tokens = tokenize(answer);
        let fillers = count_fillers(&tokens);
        let lowered = answer.to_lowercase();
        let word_count = answer.split_whitespace().count();

        let keywords: Vec<String> = question
            .map(|q| {
                q.keywords
                    .split(',')
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let matched = keywords.iter().filter(|k| lowered.contains(k.as_str())).count();

        let keyword_score = if keywords.is_empty() {
            20
        } else {
            ((matched as f64 / keywords.len() as f64) * 40.0).round() as i32
        };
        let length_score = (word_count as i32).clamp(5, 20);
        let grammar_score = 25 - (fillers as i32 * 2).min(10);
        let filler_penalty = (fillers as i32 * 3).min(15);
        let score = (keyword_score + length_score + grammar_score - filler_penalty).max(0);

        let mut feedback_parts: Vec<&str> = Vec::new();
        if word_count < 12 {
            feedback_parts
                .push("Your answer is very short and does not fully explain the concept.");
        } else if word_count < 25 {
            feedback_parts.push("Your answer explains the idea briefly, but it needs more depth.");
        } else {
            feedback_parts.push("You have explained the concept reasonably well.");
        }
        if !keywords.is_empty() && matched == 0 {
            feedback_parts.push("Important points related to the question are missing.");
        } else if !keywords.is_empty() && matched < keywords.len() {
            feedback_parts
                .push("Some important aspects of the topic are missing from your explanation.");
        }
        if fillers > 0 {
            feedback_parts
                .push("Try to reduce filler words to make your answer clearer and more confident.");
        }
        let feedback = feedback_parts.join(" ");

        let mut rule_tips: Vec<String> = Vec::new();
        if word_count < 25 {
            rule_tips.push("Explain the concept in 2-3 clear sentences".to_string());
        }
        if !keywords.is_empty() && matched < keywords.len() {
            rule_tips.push("Include definition, purpose, and usage".to_string());
        }
        rule_tips.push("Add a simple real-world or technical example".to_string());

        let question_text = question.map(|q| q.text.as_str()).unwrap_or("");
        let improvement_tips = match self.ai_improvement_tips(answer, question_text, score).await {
            Some(tips) if !tips.is_empty() => tips,
            _ => rule_tips,
        };

        AnswerEvaluation {
            score,
            feedback,
            improvement_tips,
        }
    }

    /// One attempt at coach-style tips; any failure falls back to rule tips.
    async fn ai_improvement_tips(
        &self,
        answer: &str,
        question_text: &str,
        score: i32,
    ) -> Option<Vec<String>> {
        let prompt = build_tips_prompt(answer, question_text, score);
        let request = CompletionRequest {
            prompt,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let raw = match self.client.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, "tip generation unavailable, using rule-based tips");
                return None;
            }
        };
        let items = match extract_json_array(&raw) {
            Ok(items) => items,
            Err(e) => {
                debug!(error = %e, "tip output unusable, using rule-based tips");
                return None;
            }
        };

        let tips: Vec<String> = items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .take(MAX_TIPS)
            .collect();
        Some(tips)
    }

    fn no_answer() -> AnswerEvaluation {
        AnswerEvaluation {
            score: 0,
            feedback: NO_ANSWER_FEEDBACK.to_string(),
            improvement_tips: NO_ANSWER_TIPS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Mean score across a finished session, for the summary screen.
    pub fn session_average(evaluations: &[AnswerEvaluation]) -> Option<f64> {
        if evaluations.is_empty() {
            return None;
        }
        let sum: i64 = evaluations.iter().map(|e| e.score as i64).sum();
        Some(sum as f64 / evaluations.len() as f64)
    }
}

fn count_fillers(tokens: &[String]) -> usize {
    let singles = tokens
        .iter()
        .filter(|t| FILLER_WORDS.contains(&t.as_str()))
        .count();
    // "you know" only exists as a two-token phrase
    let bigrams = tokens
        .windows(2)
        .filter(|pair| pair[0] == "you" && pair[1] == "know")
        .count();
    singles + bigrams
}

fn build_tips_prompt(answer: &str, question_text: &str, score: i32) -> String {
    format!(
        r#"You are an expert interview coach.

Question:
{question_text}

Candidate Answer:
{answer}

Score: {score}/100

TASK:
Generate 3-5 concise, actionable improvement tips to help the candidate improve.
Tips should be:
- Specific to the answer
- Practical and short
- Focused on clarity, structure, depth, and correctness

Return ONLY a JSON array of strings.
Example:
[
  "Explain the concept step by step",
  "Add a real-world example",
  "Mention trade-offs clearly"
]"#
    )
}
