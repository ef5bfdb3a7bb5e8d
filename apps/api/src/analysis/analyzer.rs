//! Signal Analyzer: runs one analysis per user trigger.
//!
//! Flow: Idle → Validating → (Failed | Calling) → Parsing →
//!       (Displaying | DisplayingFallback).
//!
//! Validation happens before any side effect. Transport failures are
//! surfaced, never retried here (the client's `RetryPolicy` owns that).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::prompts::{build_prompt, PromptSpec};
use crate::analysis::report::{parse_report, AnalysisReport, RawResponseFallback};
use crate::analysis::validation::{validate_inputs, ValidationError};
use crate::config::ModelSettings;
use crate::errors::AppError;
use crate::llm_client::CompletionClient;

/// The two pasted texts for one run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub job_text: String,
    #[serde(default)]
    pub profile_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStage {
    Idle,
    Validating,
    Failed,
    Calling,
    Parsing,
    Displaying,
    DisplayingFallback,
}

impl fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStage::Idle => "idle",
            AnalysisStage::Validating => "validating",
            AnalysisStage::Failed => "failed",
            AnalysisStage::Calling => "calling",
            AnalysisStage::Parsing => "parsing",
            AnalysisStage::Displaying => "displaying",
            AnalysisStage::DisplayingFallback => "displaying_fallback",
        };
        f.write_str(name)
    }
}

/// Terminal result of a run that reached the model.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Report {
        run_id: Uuid,
        report: AnalysisReport,
    },
    Fallback {
        run_id: Uuid,
        fallback: RawResponseFallback,
    },
}

impl AnalysisOutcome {
    pub fn stage(&self) -> AnalysisStage {
        match self {
            AnalysisOutcome::Report { .. } => AnalysisStage::Displaying,
            AnalysisOutcome::Fallback { .. } => AnalysisStage::DisplayingFallback,
        }
    }

    pub fn run_id(&self) -> Uuid {
        match self {
            AnalysisOutcome::Report { run_id, .. } | AnalysisOutcome::Fallback { run_id, .. } => {
                *run_id
            }
        }
    }
}

pub struct SignalAnalyzer {
    /// `None` when no credential was loaded at startup.
    client: Option<Arc<dyn CompletionClient>>,
    prompt_spec: PromptSpec,
    model: ModelSettings,
}

impl SignalAnalyzer {
    pub fn new(
        client: Option<Arc<dyn CompletionClient>>,
        prompt_spec: PromptSpec,
        model: ModelSettings,
    ) -> Self {
        Self {
            client,
            prompt_spec,
            model,
        }
    }

    pub fn credential_present(&self) -> bool {
        self.client.is_some()
    }

    pub fn prompt_spec(&self) -> &PromptSpec {
        &self.prompt_spec
    }

    pub fn model(&self) -> &ModelSettings {
        &self.model
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome, AppError> {
        let run_id = Uuid::new_v4();
        transition(run_id, AnalysisStage::Idle, AnalysisStage::Validating);

        let client = match self.checked_client(request) {
            Ok(client) => client,
            Err(e) => {
                transition(run_id, AnalysisStage::Validating, AnalysisStage::Failed);
                info!("Analysis {run_id} rejected: {}", e.code());
                return Err(AppError::Validation(e));
            }
        };

        transition(run_id, AnalysisStage::Validating, AnalysisStage::Calling);
        let prompt = build_prompt(&request.job_text, &request.profile_text, &self.prompt_spec);
        info!(
            "Analysis {run_id}: calling {} (job_chars={}, profile_chars={})",
            self.model.model,
            request.job_text.chars().count(),
            request.profile_text.chars().count()
        );

        let raw = client
            .send(
                &prompt.to_messages(),
                &self.model.model,
                self.model.temperature,
            )
            .await
            .map_err(|e| AppError::Llm(format!("Signal analysis call failed: {e}")))?;

        transition(run_id, AnalysisStage::Calling, AnalysisStage::Parsing);
        let outcome = match parse_report(&raw) {
            Ok(report) => AnalysisOutcome::Report { run_id, report },
            Err(fallback) => {
                warn!(
                    "Analysis {run_id}: model returned non-JSON output ({} chars), showing raw text",
                    fallback.raw_text.len()
                );
                AnalysisOutcome::Fallback { run_id, fallback }
            }
        };
        transition(run_id, AnalysisStage::Parsing, outcome.stage());

        Ok(outcome)
    }

    fn checked_client(
        &self,
        request: &AnalysisRequest,
    ) -> Result<&Arc<dyn CompletionClient>, ValidationError> {
        validate_inputs(
            &request.job_text,
            &request.profile_text,
            self.credential_present(),
        )?;
        self.client.as_ref().ok_or(ValidationError::MissingCredential)
    }
}

fn transition(run_id: Uuid, from: AnalysisStage, to: AnalysisStage) {
    debug!("Analysis {run_id}: {from} -> {to}");
}
