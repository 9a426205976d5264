//! Prompt Builder — pure string assembly for the generation and evaluation calls.
//!
//! No hidden state: identical inputs always produce an identical `Prompt`.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_PLACEHOLDERS_INSTRUCTION};
use crate::llm_client::Prompt;

/// System prompt for drafting a statement.
pub const GENERATION_SYSTEM: &str = "You are an experienced public-relations writer. \
    You write polished, publication-ready PR statements. \
    Respond with the statement text only — no preamble, no commentary.";

/// Generation prompt template. Replace: {topic}, {no_placeholders}
pub const GENERATION_PROMPT_TEMPLATE: &str = r#"Generate a compelling PR statement for the topic: {topic}

- The statement should highlight key benefits, address any potential concerns, and capture the excitement and innovation surrounding the subject.
- Ensure that the tone is professional yet engaging, appealing to the target audience while maintaining clarity and impact.
- {no_placeholders}"#;

/// Appended to the generation prompt once an evaluation has asked for changes.
/// Replace: {latest}, {earlier}
pub const FEEDBACK_TEMPLATE: &str = r#"

A previous draft was reviewed and needs improvement. Take this feedback into account:
{latest}{earlier}"#;

/// System prompt for reviewing a draft — enforces JSON-only output.
pub fn evaluation_system() -> String {
    format!("You are a demanding senior communications editor. {JSON_ONLY_SYSTEM}")
}

/// Evaluation prompt template. Replace: {topic}, {draft}
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"Review the following PR statement written for the topic: {topic}

PR STATEMENT:
{draft}

Judge it against these criteria:
- Relevance: it is clearly about the topic.
- Clarity and engagement: key benefits are explained, potential concerns are addressed.
- Tone: professional yet engaging.
- Length: a complete statement, neither a single line nor padded filler.
- No placeholder text such as [Company Name] or lorem ipsum.

Decide whether the statement is well-formed ("good") or requires further refinement ("needs improvement").
If it needs improvement, give concise and actionable feedback on how to enhance it.

Return a JSON object with this EXACT schema:
{"grade": "good" | "needs improvement", "feedback": "...", "score": 0-10}"#;

/// Builds the drafting prompt. With no feedback this is a first-draft instruction;
/// otherwise the most recent feedback leads and earlier rounds follow, oldest first.
pub fn build_generation_prompt(topic: &str, feedback_history: &[String]) -> Prompt {
    let mut user = fill_template(
        GENERATION_PROMPT_TEMPLATE,
        &[
            ("topic", topic),
            ("no_placeholders", NO_PLACEHOLDERS_INSTRUCTION),
        ],
    );

    if let Some((latest, earlier)) = feedback_history.split_last() {
        let earlier = if earlier.is_empty() {
            String::new()
        } else {
            let lines = earlier
                .iter()
                .enumerate()
                .map(|(i, f)| format!("{}. {}", i + 1, f))
                .collect::<Vec<_>>()
                .join("\n");
            format!("\n\nEarlier feedback that should stay addressed:\n{lines}")
        };

        user.push_str(&fill_template(
            FEEDBACK_TEMPLATE,
            &[("latest", latest), ("earlier", &earlier)],
        ));
    }

    Prompt {
        system: GENERATION_SYSTEM.to_string(),
        user,
    }
}

/// Builds the review prompt for one draft.
pub fn build_evaluation_prompt(topic: &str, draft_text: &str) -> Prompt {
    Prompt {
        system: evaluation_system(),
        user: fill_template(
            EVALUATION_PROMPT_TEMPLATE,
            &[("topic", topic), ("draft", draft_text)],
        ),
    }
}

/// Substitutes `{key}` markers in one left-to-right pass.
///
/// Chained `.replace()` calls would rescan text inserted by an earlier call, so a topic
/// or draft containing `{draft}` or `{earlier}` would be expanded a second time. Here
/// inserted values are never rescanned. Unknown markers (like the JSON braces in the
/// schema line) are copied through.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });

        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
