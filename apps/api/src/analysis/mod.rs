// Job signal analysis: one prompt, one model call, strict JSON report.
// All model calls go through llm_client::CompletionClient.

pub mod analyzer;
pub mod handlers;
pub mod prompts;
pub mod report;
pub mod validation;
