// PR statement generation: prompt building, LLM review, refinement loop, fallback.
// All LLM calls go through llm_client — no direct HTTP calls here.

pub mod evaluator;
pub mod fallback;
pub mod handlers;
pub mod prompts;
pub mod workflow;
