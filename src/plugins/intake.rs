//! Intake adapter for externally detected decisions.
//!
//! Text analysis happens upstream; this adapter only types and ids the
//! records the detector hands over. Quality of the detection is not
//! re-validated here.

use crate::core::error::CovenantError;
use crate::core::state::{Confidence, DecisionRecord, DecisionStatus};
use serde::Deserialize;
use std::path::Path;
use ulid::Ulid;

/// Wire shape produced by the detector: summary plus suggested owner
/// and deadline, one JSON object per line.
#[derive(Debug, Deserialize)]
pub struct RawDecision {
    pub summary: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

pub fn typed(raw: RawDecision) -> DecisionRecord {
    DecisionRecord {
        id: Ulid::new().to_string(),
        summary: raw.summary,
        suggested_owner: raw.owner,
        suggested_deadline: raw.deadline,
        confidence: raw.confidence,
        status: DecisionStatus::Detected,
    }
}

/// Parse a JSONL batch of detector output. Blank lines are skipped;
/// a malformed line fails the whole batch with its line number.
pub fn parse_batch(text: &str) -> Result<Vec<DecisionRecord>, CovenantError> {
    let mut records = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawDecision = serde_json::from_str(line).map_err(|e| {
            CovenantError::ValidationError(format!(
                "decision record at line {}: {}",
                lineno + 1,
                e
            ))
        })?;
        records.push(typed(raw));
    }
    Ok(records)
}

pub fn load_batch(path: &Path) -> Result<Vec<DecisionRecord>, CovenantError> {
    let text = std::fs::read_to_string(path)?;
    parse_batch(&text)
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "intake",
        "version": "0.1.0",
        "description": "Typed ingestion of upstream decision records",
        "commands": [
            { "name": "parse", "description": "Parse a JSONL decision batch", "parameters": ["path"] }
        ],
        "storage": []
    })
}
