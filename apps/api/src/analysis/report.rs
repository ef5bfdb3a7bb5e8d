//! Analysis report: strict parsing of the model reply, the display view,
//! and the downloadable export.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

pub const EXPORT_FILE_NAME: &str = "job_signal_report.json";
pub const EXPORT_CONTENT_TYPE: &str = "application/json";

/// A model reply that decoded as a JSON object. The mapping is kept exactly
/// as decoded; schema defaults are applied only when building the view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnalysisReport(Map<String, Value>);

/// The raw model reply, kept verbatim when it is not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawResponseFallback {
    pub raw_text: String,
}

/// Display shape: always exactly the seven schema fields, each with its
/// schema type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub fit_score_0_100: u8,
    pub strength_signals: Vec<String>,
    pub missing_signals: Vec<String>,
    pub rejection_risks: Vec<String>,
    pub seniority_notes: String,
    pub fastest_wins_7_days: Vec<String>,
    pub portfolio_upgrades_30_days: Vec<String>,
}

/// Strict decode: the whole text must be one JSON object. Anything else,
/// including a valid JSON array or number, yields the fallback.
pub fn parse_report(raw_text: &str) -> Result<AnalysisReport, RawResponseFallback> {
    match serde_json::from_str::<Value>(raw_text) {
        Ok(Value::Object(map)) => Ok(AnalysisReport(map)),
        _ => Err(RawResponseFallback {
            raw_text: raw_text.to_string(),
        }),
    }
}

/// Pretty-printed JSON of the stored mapping, for download.
pub fn export_report(report: &AnalysisReport) -> Bytes {
    // A Map<String, Value> always serializes.
    Bytes::from(serde_json::to_vec_pretty(report.as_map()).unwrap_or_default())
}

impl AnalysisReport {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn view(&self) -> ReportView {
        ReportView {
            fit_score_0_100: self.fit_score(),
            strength_signals: self.string_list("strength_signals"),
            missing_signals: self.string_list("missing_signals"),
            rejection_risks: self.string_list("rejection_risks"),
            seniority_notes: self.text("seniority_notes"),
            fastest_wins_7_days: self.string_list("fastest_wins_7_days"),
            portfolio_upgrades_30_days: self.string_list("portfolio_upgrades_30_days"),
        }
    }

    /// Rounded and clamped to 0..=100; anything non-numeric reads as 0.
    fn fit_score(&self) -> u8 {
        self.0
            .get("fit_score_0_100")
            .and_then(Value::as_f64)
            .filter(|score| score.is_finite())
            .map(|score| score.round().clamp(0.0, 100.0) as u8)
            .unwrap_or(0)
    }

    /// Lists render element by element; non-string elements show as JSON text.
    fn string_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn text(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        }
    }
}
