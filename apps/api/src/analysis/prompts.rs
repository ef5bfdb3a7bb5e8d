// Prompt constants and prompt construction for job signal analysis.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::llm_client::ChatMessage;

/// System prompt: recruiter persona plus hard output rules.
pub const JOB_SIGNAL_SYSTEM: &str = "
You are a senior technical recruiter and hiring engineer.
Analyze candidate–job alignment using real hiring signals.

Rules:
- Do NOT rewrite resumes.
- No conversational tone.
- Focus on gaps, risks, seniority, and fast improvements.
- Output VALID JSON ONLY matching the schema.
";

/// The reply shape requested from the model, in wire order.
pub fn job_signal_schema() -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("fit_score_0_100".to_string(), json!(0));
    schema.insert("strength_signals".to_string(), json!([]));
    schema.insert("missing_signals".to_string(), json!([]));
    schema.insert("rejection_risks".to_string(), json!([]));
    schema.insert("seniority_notes".to_string(), json!(""));
    schema.insert("fastest_wins_7_days".to_string(), json!([]));
    schema.insert("portfolio_upgrades_30_days".to_string(), json!([]));
    schema
}

/// Instruction text and reply schema injected into the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptSpec {
    pub system_prompt: String,
    pub schema: Map<String, Value>,
}

impl PromptSpec {
    pub fn job_signal() -> Self {
        Self {
            system_prompt: JOB_SIGNAL_SYSTEM.to_string(),
            schema: job_signal_schema(),
        }
    }

    /// Two-space pretty rendering of the schema, as embedded in the prompt.
    pub fn schema_json(&self) -> String {
        serde_json::to_string_pretty(&self.schema).unwrap_or_else(|_| "{}".to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessages {
    pub system: String,
    pub user: String,
}

impl PromptMessages {
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

/// Builds the system and user messages. The texts are embedded verbatim;
/// no escaping is applied.
pub fn build_prompt(job_text: &str, profile_text: &str, spec: &PromptSpec) -> PromptMessages {
    let user = format!(
        "\nJOB DESCRIPTION:\n{job_text}\n\nCANDIDATE PROFILE:\n{profile_text}\n\n\
         Return JSON ONLY using this schema (no extra keys):\n{}\n",
        spec.schema_json()
    );

    PromptMessages {
        system: spec.system_prompt.clone(),
        user,
    }
}
