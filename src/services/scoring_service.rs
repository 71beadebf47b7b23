use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::evaluation::{EvaluationResult, PassFail, QuestionEvaluation};
use crate::models::paper::Question;
use crate::storage::bootstrap::EXAM_CONTEXT;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;

/// Seam between the exam lifecycle and the external evaluator, so the
/// session controller can be driven against stubs.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn evaluate(
        &self,
        questions: &[Question],
        answers: &HashMap<String, String>,
    ) -> Result<EvaluationResult>;
}

/// Adapter over an OpenAI-style chat-completion endpoint. One request per
/// grading pass; the structured reply is validated and normalized rather
/// than trusted: totals and the pass verdict are always recomputed locally.
#[derive(Clone)]
pub struct EvaluationService {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl EvaluationService {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            api_url: config.scoring_api_url.clone(),
            api_key: config.scoring_api_key.clone(),
            model: config.scoring_model.clone(),
        }
    }

    async fn chat_completion(&self, payload: JsonValue) -> Result<String> {
        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(120))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Scoring(format!(
                "Scoring API error {}: {}",
                status, text
            )));
        }

        let body: JsonValue = res.json().await?;
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Scoring("Invalid scoring response format".to_string()))
    }
}

#[async_trait]
impl Scorer for EvaluationService {
    async fn evaluate(
        &self,
        questions: &[Question],
        answers: &HashMap<String, String>,
    ) -> Result<EvaluationResult> {
        if self.api_key.is_empty() {
            return Err(Error::Config("SCORING_API_KEY is not set".to_string()));
        }

        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt()},
                {"role": "user", "content": build_answer_sheet(questions, answers)}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.2
        });

        tracing::info!(questions = questions.len(), "Requesting evaluation");
        let content = self.chat_completion(payload).await?;
        let result = parse_evaluation(questions, &content)?;
        tracing::info!(
            total = result.total_score,
            max = result.max_score,
            verdict = ?result.pass_fail,
            "Evaluation received"
        );
        Ok(result)
    }
}

fn system_prompt() -> String {
    format!(
        "You are a Senior Technical Interviewer evaluating a React Developer candidate.\n\
        The context of the application is: {}\n\
        Evaluate the answers based on technical accuracy, conceptual understanding, and problem-solving approach.\n\
        IMPORTANT INSTRUCTIONS FOR GRADING:\n\
        1. The 'Context/Ideal Key' provided is a GUIDELINE for expected concepts, NOT a strict answer key. Do not require exact text matches.\n\
        2. If the candidate provides a valid alternative solution or uses different wording that demonstrates correct understanding, award appropriate marks.\n\
        3. For coding questions, focus on the logic, state management, and correct usage of hooks. Minor syntax errors should be penalized slightly, but not result in a zero score if the logic is sound.\n\
        4. For architectural/design questions, evaluate the feasibility and reasoning of their approach.\n\
        Return a single JSON object shaped exactly as:\n\
        {{\"summary\": string, \"passFail\": \"PASS\"|\"FAIL\", \"questionEvaluations\": {{<question id>: {{\"score\": number, \"feedback\": string}}}}}}\n\
        Score each question from 0 up to its stated maximum marks, with brief feedback (max 2 sentences).\n\
        Grant PASS when the total strictly exceeds 60% of the maximum possible score.",
        EXAM_CONTEXT
    )
}

fn build_answer_sheet(questions: &[Question], answers: &HashMap<String, String>) -> String {
    let mut parts = Vec::with_capacity(questions.len() * 5 + 1);
    parts.push("Here are the Question/Answer pairs:".to_string());
    for (index, question) in questions.iter().enumerate() {
        let answer = answers
            .get(&question.id)
            .map(String::as_str)
            .unwrap_or("NO ANSWER PROVIDED");
        parts.push(format!("Q{} ID: {}", index + 1, question.id));
        parts.push(format!("Question: {}", question.text));
        parts.push(format!("Context/Ideal Key: {}", question.ideal_answer_key));
        parts.push(format!("Max Marks: {}", question.marks()));
        parts.push(format!("Candidate Answer: {}", answer));
        parts.push("---".to_string());
    }
    parts.join("\n")
}

pub fn max_score(questions: &[Question]) -> f64 {
    questions.iter().map(|q| f64::from(q.marks())).sum()
}

/// Parses the raw reply text into a normalized result. Markdown code
/// fencing is tolerated; per-question entries that are missing or
/// malformed default to zero with a fixed feedback string; the total and
/// verdict are recomputed from the per-question scores.
pub fn parse_evaluation(questions: &[Question], raw: &str) -> Result<EvaluationResult> {
    let cleaned = strip_code_fences(raw);
    let parsed: JsonValue = serde_json::from_str(cleaned)
        .map_err(|e| Error::Scoring(format!("Unparseable evaluation reply: {}", e)))?;

    let entries = parsed.get("questionEvaluations");
    let mut total_score = 0.0;
    let mut question_evaluations = HashMap::with_capacity(questions.len());

    for question in questions {
        let entry = entries.and_then(|m| m.get(&question.id));
        let score = entry
            .and_then(|e| e.get("score"))
            .and_then(JsonValue::as_f64)
            .unwrap_or(0.0)
            .clamp(0.0, f64::from(question.marks()));
        let feedback = entry
            .and_then(|e| e.get("feedback"))
            .and_then(JsonValue::as_str)
            .unwrap_or("Could not evaluate")
            .to_string();
        total_score += score;
        question_evaluations.insert(question.id.clone(), QuestionEvaluation { score, feedback });
    }

    let max = max_score(questions);
    Ok(EvaluationResult {
        total_score,
        max_score: max,
        summary: parsed
            .get("summary")
            .and_then(JsonValue::as_str)
            .unwrap_or("Evaluation completed.")
            .to_string(),
        pass_fail: verdict(total_score, max),
        question_evaluations,
    })
}

/// Zero-score shape handed to callers when a grading pass fails outright.
/// Never persisted; the submission stays gradable.
pub fn fallback_result(questions: &[Question], reason: &str) -> EvaluationResult {
    EvaluationResult {
        total_score: 0.0,
        max_score: max_score(questions),
        summary: reason.to_string(),
        pass_fail: PassFail::Fail,
        question_evaluations: questions
            .iter()
            .map(|q| {
                (
                    q.id.clone(),
                    QuestionEvaluation {
                        score: 0.0,
                        feedback: "Evaluation failed".to_string(),
                    },
                )
            })
            .collect(),
    }
}

fn verdict(total: f64, max: f64) -> PassFail {
    if total > max * 0.6 {
        PassFail::Pass
    } else {
        PassFail::Fail
    }
}

fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
