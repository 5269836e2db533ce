use crate::config::Config;
use crate::error::Result;
use crate::models::question::{
    GenerationRequest, GenerationResult, QuestionSource, QuestionSpec, QuestionType,
};
use crate::models::role::{RoleProfile, RoleTable};
use crate::services::llm_service::{extract_json_array, CompletionRequest, TextCompletionClient};
use crate::services::stub_service::{StubQuestion, StubService};
use crate::utils::signature::signature_of_text;
use crate::utils::text::truncate_chars;
use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::warn;
use validator::Validate;

#[derive(Clone)]
pub struct QuestionService {
    client: Arc<dyn TextCompletionClient>,
    roles: RoleTable,
    model: String,
    temperature: f32,
    max_tokens: u32,
    stub_variants: bool,
}

impl QuestionService {
    pub fn new(client: Arc<dyn TextCompletionClient>, roles: RoleTable, config: &Config) -> Self {
        Self {
            client,
            roles,
            model: config.groq_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
            stub_variants: config.stub_variants,
        }
    }

    /// Produce up to `request.count` unique, role-compliant questions.
    /// External failures never surface here; they degrade to stub backfill.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        request.validate()?;

        let profile = self.roles.resolve(&request.role).clone();
        let count = request.count as usize;
        let math_needed = ((count as f64 * profile.math_ratio).round() as usize).min(count);

        let mut questions: Vec<QuestionSpec> = Vec::with_capacity(count);
        let mut seen: HashSet<String> = HashSet::new();

        let max_attempts = count.saturating_mul(3).max(3);
        let mut attempts = 0;

        while attempts < max_attempts {
            let open = count - questions.len();
            let math_short = math_needed.saturating_sub(math_count(&questions));

            if open == 0 && math_short == 0 {
                break;
            }
            if open == 0 {
                // full batch but under the math quota: give back reasoning
                // slots and let the remaining budget request math-only top-ups
                let before_swap = questions.len();
                remove_reasoning_tail(&mut questions, math_short);
                if questions.len() == before_swap {
                    break;
                }
                seen = questions.iter().map(|q| q.signature.clone()).collect();
                continue;
            }

            attempts += 1;
            let math_batch = math_short.min(open);
            let prompt =
                build_generation_prompt(&request.role, open, math_batch, request.difficulty);
            let Some(items) = self.fetch_candidates(prompt, attempts).await else {
                continue;
            };

            for value in &items {
                if questions.len() == count {
                    break;
                }
                absorb_llm_item(value, math_needed, count, &mut questions, &mut seen);
            }
        }

        let before = questions.len();
        questions.retain(|q| profile.allows(q.question_type));
        let removed = before - questions.len();
        if removed > 0 {
            warn!(
                removed,
                role = %request.role,
                "dropped questions outside the role's allowed types"
            );
            self.replace_disallowed(request, &profile, math_needed, before, &mut questions, &mut seen)
                .await;
        }

        self.backfill_with_stubs(request, &profile, math_needed, count, &mut questions, &mut seen);

        questions.truncate(count);
        let shortfall = count - questions.len();
        if shortfall > 0 {
            warn!(
                requested = count,
                produced = questions.len(),
                "generation under-delivered"
            );
        }

        Ok(GenerationResult {
            questions,
            shortfall,
        })
    }

    async fn fetch_candidates(&self, prompt: String, attempt: usize) -> Option<Vec<JsonValue>> {
        let request = CompletionRequest {
            prompt,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let raw = match self.client.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(attempt, error = %e, "question generation call failed");
                return None;
            }
        };
        match extract_json_array(&raw) {
            Ok(items) => Some(items),
            Err(e) => {
                warn!(attempt, error = %e, "unusable generation output");
                None
            }
        }
    }

    /// Targeted top-up after the allowed-type sweep removed items. Requests
    /// reasoning-only batches; anything still off-policy is dropped, never
    /// substituted.
    async fn replace_disallowed(
        &self,
        request: &GenerationRequest,
        profile: &RoleProfile,
        math_needed: usize,
        target: usize,
        questions: &mut Vec<QuestionSpec>,
        seen: &mut HashSet<String>,
    ) {
        let cap = (target - questions.len()).saturating_mul(3).max(2);
        let mut attempts = 0;

        while questions.len() < target && attempts < cap {
            attempts += 1;
            let need = target - questions.len();
            let prompt = build_replacement_prompt(&request.role, need, request.difficulty);
            let Some(items) = self.fetch_candidates(prompt, attempts).await else {
                continue;
            };

            for value in &items {
                if questions.len() == target {
                    break;
                }
                let Some(mut item) = sanitize_item(value) else {
                    continue;
                };
                let question_type = item
                    .declared
                    .unwrap_or_else(|| infer_question_type(&item.text));
                if !profile.allows(question_type) {
                    continue;
                }
                if question_type == QuestionType::Math {
                    if math_needed == 0 {
                        continue;
                    }
                    enrich_math_text(&mut item.text, &mut item.keywords);
                }
                let signature = signature_of_text(&item.text);
                if !seen.insert(signature.clone()) {
                    continue;
                }
                questions.push(QuestionSpec {
                    text: item.text,
                    keywords: item.keywords,
                    difficulty: item.difficulty,
                    question_type,
                    signature,
                    source: QuestionSource::Llm,
                });
            }
        }
    }

    fn backfill_with_stubs(
        &self,
        request: &GenerationRequest,
        profile: &RoleProfile,
        math_needed: usize,
        count: usize,
        questions: &mut Vec<QuestionSpec>,
        seen: &mut HashSet<String>,
    ) {
        let cap = count.saturating_mul(10).max(50);
        let mut attempts = 0;
        while questions.len() < count && attempts < cap {
            attempts += 1;
            let stub = StubService::stub(&request.role, request.difficulty);
            absorb_stub(stub, None, profile, math_needed, questions, seen);
        }

        if questions.len() < count && self.stub_variants {
            // development-only uniqueness suffix, applied after the template
            // pool has been exhausted
            let mut variant = 1usize;
            while questions.len() < count && variant <= cap {
                let stub = StubService::stub(&request.role, request.difficulty);
                absorb_stub(stub, Some(variant), profile, math_needed, questions, seen);
                variant += 1;
            }
        }
    }
}

struct SanitizedItem {
    text: String,
    keywords: String,
    difficulty: i32,
    declared: Option<QuestionType>,
}

fn sanitize_item(value: &JsonValue) -> Option<SanitizedItem> {
    let obj = value.as_object()?;
    let text = obj.get("text")?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }

    let declared = match obj
        .get("type")
        .and_then(|t| t.as_str())
        .map(|s| s.trim().to_lowercase())
        .as_deref()
    {
        Some("math") => Some(QuestionType::Math),
        Some("reasoning") => Some(QuestionType::Reasoning),
        _ => None,
    };

    Some(SanitizedItem {
        text: truncate_chars(text, 250),
        keywords: coerce_keywords(obj.get("keywords")),
        difficulty: coerce_difficulty(obj.get("difficulty")),
        declared,
    })
}

fn coerce_difficulty(value: Option<&JsonValue>) -> i32 {
    let parsed = match value {
        Some(JsonValue::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(JsonValue::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.map(|d| d.clamp(1, 5) as i32).unwrap_or(3)
}

fn coerce_keywords(value: Option<&JsonValue>) -> String {
    match value {
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                JsonValue::String(s) => {
                    let trimmed = s.trim();
                    (!trimmed.is_empty()).then(|| trimmed.to_string())
                }
                JsonValue::Null => None,
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(JsonValue::String(s)) => s.trim().to_string(),
        Some(JsonValue::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

static MATH_HINTS: OnceLock<Regex> = OnceLock::new();

fn math_hints_regex() -> &'static Regex {
    MATH_HINTS.get_or_init(|| {
        Regex::new(
            r"(?i)[0-9$€£₹%]|\b(?:calculate|compute|probability|percent|ratio|sum|difference|distance|speed|time|how many|series|mean|median|mode)\b",
        )
        .expect("math hint pattern is valid")
    })
}

fn infer_question_type(text: &str) -> QuestionType {
    if math_hints_regex().is_match(text) {
        QuestionType::Math
    } else {
        QuestionType::Reasoning
    }
}

fn has_numeral(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
}

/// Math questions must carry numeric content; pad the text with a canned
/// example when the model forgot to include numbers.
fn enrich_math_text(text: &mut String, keywords: &mut String) {
    if has_numeral(text) {
        return;
    }
    text.push_str(" For example, use the numbers 12 and 7.");
    if keywords.is_empty() {
        keywords.push_str("numbers");
    } else {
        keywords.push_str(",numbers");
    }
}

fn math_count(questions: &[QuestionSpec]) -> usize {
    questions
        .iter()
        .filter(|q| q.question_type == QuestionType::Math)
        .count()
}

fn remove_reasoning_tail(questions: &mut Vec<QuestionSpec>, mut excess: usize) {
    let mut i = questions.len();
    while i > 0 && excess > 0 {
        i -= 1;
        if questions[i].question_type == QuestionType::Reasoning {
            questions.remove(i);
            excess -= 1;
        }
    }
}

fn absorb_llm_item(
    value: &JsonValue,
    math_needed: usize,
    count: usize,
    questions: &mut Vec<QuestionSpec>,
    seen: &mut HashSet<String>,
) {
    let Some(mut item) = sanitize_item(value) else {
        return;
    };
    let question_type = item
        .declared
        .unwrap_or_else(|| infer_question_type(&item.text));

    if question_type == QuestionType::Math {
        // zero-quota batches reject math outright
        if math_needed == 0 {
            return;
        }
        enrich_math_text(&mut item.text, &mut item.keywords);
    }

    let signature = signature_of_text(&item.text);
    if seen.contains(&signature) {
        return;
    }
    if questions.len() == count {
        return;
    }

    seen.insert(signature.clone());
    questions.push(QuestionSpec {
        text: item.text,
        keywords: item.keywords,
        difficulty: item.difficulty,
        question_type,
        signature,
        source: QuestionSource::Llm,
    });
}

fn absorb_stub(
    stub: StubQuestion,
    variant: Option<usize>,
    profile: &RoleProfile,
    math_needed: usize,
    questions: &mut Vec<QuestionSpec>,
    seen: &mut HashSet<String>,
) {
    let mut text = stub.text;
    if let Some(v) = variant {
        text = format!("{} (variant {})", text, v);
    }
    let mut keywords = stub.keywords;

    let question_type = infer_question_type(&text);
    if !profile.allows(question_type) {
        return;
    }
    if question_type == QuestionType::Math {
        if math_needed == 0 {
            return;
        }
        enrich_math_text(&mut text, &mut keywords);
    }

    let signature = signature_of_text(&text);
    if !seen.insert(signature.clone()) {
        return;
    }
    questions.push(QuestionSpec {
        text,
        keywords,
        difficulty: stub.difficulty,
        question_type,
        signature,
        source: QuestionSource::Template,
    });
}

fn build_generation_prompt(role: &str, n: usize, math_n: usize, difficulty: i32) -> String {
    let quota_rule = if math_n == 0 {
        "Include zero math items: every question must have \"type\": \"reasoning\" and no calculations.".to_string()
    } else {
        format!(
            "Exactly {} of the {} questions must have \"type\": \"math\" and work with concrete numbers; the rest must be \"type\": \"reasoning\".",
            math_n, n
        )
    };

    format!(
        r#"You are an interview question generator.

Generate exactly {n} unique interview questions for role = "{role}" with difficulty level {difficulty}.
Return only a JSON array (and nothing else). Each array item must be an object with keys:
- "text": string - the question text (short, clear, <=250 chars)
- "keywords": string - comma-separated keywords the candidate should ideally include
- "difficulty": integer 1-5
- "type": either "math" or "reasoning"

Rules:
1) Return ONLY a JSON array (no commentary).
2) {quota_rule}
3) Avoid PII, names, or confidential info.
4) Ensure each question is unique.
5) Keep questions practical and answerable in 1-2 minutes.
6) Ensure safe/clean content.

Example:
[
  {{"text":"Explain the difference between process and thread with an example.","keywords":"process,thread,concurrency,context-switch","difficulty":3,"type":"reasoning"}},
  {{"text":"A cache serves 120 requests per second. How many requests does it serve in 5 minutes?","keywords":"rate,multiplication,requests","difficulty":2,"type":"math"}}
]"#
    )
}

fn build_replacement_prompt(role: &str, n: usize, difficulty: i32) -> String {
    format!(
        r#"You are an interview question generator.

Generate exactly {n} unique reasoning interview questions for role = "{role}" with difficulty level {difficulty}.
Every question must have "type": "reasoning" - do not include math or calculation questions.
Return only a JSON array (and nothing else). Each array item must be an object with keys:
- "text": string - the question text (short, clear, <=250 chars)
- "keywords": string - comma-separated keywords the candidate should ideally include
- "difficulty": integer 1-5
- "type": must be "reasoning"

Rules:
1) Return ONLY a JSON array (no commentary).
2) Ensure each question is unique.
3) Keep questions practical and answerable in 1-2 minutes.
4) Ensure safe/clean content."#
    )
}
