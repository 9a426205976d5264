// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps generated copy free of fill-in-the-blank markers.
pub const NO_PLACEHOLDERS_INSTRUCTION: &str = "\
    Do NOT use placeholder text such as [Company Name], [Date], XXX or lorem ipsum. \
    Where a concrete detail is unknown, write around it instead of leaving a blank.";
