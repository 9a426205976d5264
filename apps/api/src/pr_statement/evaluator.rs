//! Evaluator — asks the LLM to review a draft and parses the answer into an `Evaluation`.
//!
//! Parsing rule (strict, ACCEPT only on an explicit token):
//! 1. Strip code fences and parse JSON `{"grade", "feedback", "score"}`.
//! 2. Otherwise scan lines for `grade:` / `verdict:`, `feedback:` and `score:` prefixes.
//! 3. No recognisable verdict token → REFINE, with the raw text as feedback.
//!
//! `good`, `accept` and `accepted` are the only ACCEPT tokens. Everything else,
//! including `needs improvement` and unknown words, is REFINE.

use serde::Deserialize;
use tracing::debug;

use crate::llm_client::{strip_json_fences, Completion, LlmError};
use crate::pr_statement::prompts::build_evaluation_prompt;

const ACCEPT_TOKENS: &[&str] = &["good", "accept", "accepted"];
const MAX_SCORE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Refine,
}

/// One judgment over one draft. Never mutated once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub feedback: String,
    /// 0–10 when the reviewer supplied one.
    pub score: Option<f32>,
}

impl Evaluation {
    pub fn refine(feedback: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Refine,
            feedback: feedback.into(),
            score: None,
        }
    }
}

/// Shape the evaluation prompt asks for. Every field is optional so that a partial
/// answer still parses and falls through to REFINE rather than failing outright.
#[derive(Debug, Deserialize)]
struct RawEvaluation {
    #[serde(alias = "verdict")]
    grade: Option<String>,
    feedback: Option<String>,
    score: Option<f32>,
}

/// Reviews `draft_text` for `topic`. Adapter failures are returned, never swallowed.
pub async fn evaluate(
    llm: &dyn Completion,
    draft_text: &str,
    topic: &str,
) -> Result<Evaluation, LlmError> {
    let prompt = build_evaluation_prompt(topic, draft_text);
    let raw = llm.complete(&prompt).await?;

    let evaluation = parse_evaluation(&raw);
    debug!(
        "Evaluation parsed: verdict={:?}, score={:?}",
        evaluation.verdict, evaluation.score
    );
    Ok(evaluation)
}

/// Turns the reviewer's raw reply into an `Evaluation`.
pub fn parse_evaluation(raw: &str) -> Evaluation {
    let text = strip_json_fences(raw);

    if let Ok(parsed) = serde_json::from_str::<RawEvaluation>(text) {
        return Evaluation {
            verdict: parsed
                .grade
                .as_deref()
                .map(verdict_from_token)
                .unwrap_or(Verdict::Refine),
            feedback: parsed.feedback.unwrap_or_default().trim().to_string(),
            score: parsed.score.and_then(valid_score),
        };
    }

    parse_labelled_lines(text)
}

fn parse_labelled_lines(text: &str) -> Evaluation {
    let mut verdict = None;
    let mut feedback = None;
    let mut score = None;

    for line in text.lines() {
        let line = line.trim().trim_start_matches(['-', '*']).trim();
        if let Some(value) = labelled(line, &["grade", "verdict"]) {
            verdict.get_or_insert(verdict_from_token(value));
        } else if let Some(value) = labelled(line, &["feedback"]) {
            feedback.get_or_insert(value.to_string());
        } else if let Some(value) = labelled(line, &["score"]) {
            if score.is_none() {
                score = value
                    .split('/')
                    .next()
                    .and_then(|s| s.trim().parse::<f32>().ok())
                    .and_then(valid_score);
            }
        }
    }

    match verdict {
        Some(verdict) => Evaluation {
            verdict,
            feedback: feedback.unwrap_or_default(),
            score,
        },
        None => Evaluation {
            verdict: Verdict::Refine,
            feedback: feedback.unwrap_or_else(|| text.trim().to_string()),
            score,
        },
    }
}

/// Returns the value after `label:` when the line starts with one of `labels`.
fn labelled<'a>(line: &'a str, labels: &[&str]) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim().trim_matches('*').trim();
    labels
        .iter()
        .any(|l| key.eq_ignore_ascii_case(l))
        .then(|| value.trim())
}

fn verdict_from_token(token: &str) -> Verdict {
    let token = token
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '*')
        .to_ascii_lowercase();

    if ACCEPT_TOKENS.contains(&token.as_str()) {
        Verdict::Accept
    } else {
        Verdict::Refine
    }
}

fn valid_score(score: f32) -> Option<f32> {
    (score.is_finite() && (0.0..=MAX_SCORE).contains(&score)).then_some(score)
}
