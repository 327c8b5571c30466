//! Failure-risk prediction over contracts and their owning agents.
//!
//! Parameters locked for steady-state governance; retuning requires
//! committee sign-off. The tier cutoffs here are load-bearing for the
//! constrained-GA safe-harbor gate.

use crate::core::state::{Agent, Contract};
use serde::{Deserialize, Serialize};

/// Literal deadline token treated as immediate-term pressure.
pub const TIGHT_DEADLINE: &str = "Tomorrow";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    LOW = 0,
    MEDIUM = 1,
    HIGH = 2,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::LOW => "LOW",
            RiskLevel::MEDIUM => "MEDIUM",
            RiskLevel::HIGH => "HIGH",
        }
    }
}

/// Ephemeral prediction output. Never persisted; recomputed on demand
/// from current contract and agent state.
///
/// `is_high_risk` mirrors the HIGH tier only. MEDIUM is still
/// escalation-eligible downstream, so gating callers must branch on
/// `risk_level`, not this flag.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Prediction {
    pub probability: f64,
    pub risk_level: RiskLevel,
    pub is_high_risk: bool,
    pub reasons: Vec<String>,
}

/// Tuned thresholds, grouped so experiments swap the whole set at once.
/// Earlier revisions shipped 0.5/0.6, 0.5/0.7, and 0.5/0.65 trust
/// cutoff pairs; keep these named, not inlined.
#[derive(Debug, Clone, Copy)]
pub struct RiskTuning {
    /// Below this the agent is treated as fundamentally unreliable.
    pub unreliable_trust: f64,
    /// Below this (and above the floor) the agent is borderline.
    /// Re-tightened from 0.7.
    pub borderline_trust: f64,
    pub unreliable_weight: f64,
    pub borderline_weight: f64,
    /// Trust cutoff for the deadline-pressure factor.
    pub tight_deadline_trust: f64,
    /// Title length above which the complexity proxy trips.
    pub complexity_chars: usize,
    pub deadline_weight: f64,
    pub high_cutoff: f64,
    pub medium_cutoff: f64,
}

impl Default for RiskTuning {
    fn default() -> Self {
        RiskTuning {
            unreliable_trust: 0.5,
            borderline_trust: 0.65,
            unreliable_weight: 0.4,
            borderline_weight: 0.2,
            tight_deadline_trust: 0.6,
            complexity_chars: 20,
            deadline_weight: 0.2,
            high_cutoff: 0.5,
            medium_cutoff: 0.2,
        }
    }
}

/// Predict failure probability with the locked production tuning.
pub fn predict(contract: &Contract, agent: Option<&Agent>) -> Prediction {
    predict_with(&RiskTuning::default(), contract, agent)
}

/// Pure and side-effect free; safe to call speculatively for display
/// without touching state.
pub fn predict_with(
    tuning: &RiskTuning,
    contract: &Contract,
    agent: Option<&Agent>,
) -> Prediction {
    // Unresolved owner: explicit uncertainty, not a zero-risk assumption.
    let Some(agent) = agent else {
        return Prediction {
            probability: 0.5,
            risk_level: RiskLevel::MEDIUM,
            is_high_risk: false,
            reasons: vec![
                "Owner not resolved to a known agent; default uncertainty applies".to_string(),
            ],
        };
    };

    let mut probability = 0.0;
    let mut reasons = Vec::new();

    // Factor 1: trust score.
    if agent.trust_score < tuning.unreliable_trust {
        probability += tuning.unreliable_weight;
        reasons.push(format!(
            "Trust score {:.2} below reliability floor {:.2}",
            agent.trust_score, tuning.unreliable_trust
        ));
    } else if agent.trust_score < tuning.borderline_trust {
        probability += tuning.borderline_weight;
        reasons.push(format!(
            "Trust score {:.2} in borderline band below {:.2}",
            agent.trust_score, tuning.borderline_trust
        ));
    }

    // Factor 2: complexity proxy. Title length stands in for task
    // difficulty; contributes no score itself, only gates factor 3.
    let complexity = contract.title.len();

    // Factor 3: deadline pressure. Conjunctive with trust: a tight
    // deadline alone is not penalized for already-trusted agents.
    if contract.deadline.as_deref() == Some(TIGHT_DEADLINE)
        && (complexity > tuning.complexity_chars
            || agent.trust_score < tuning.tight_deadline_trust)
    {
        probability += tuning.deadline_weight;
        reasons.push(format!(
            "Tight deadline '{}' with complexity {} or trust under {:.2}",
            TIGHT_DEADLINE, complexity, tuning.tight_deadline_trust
        ));
    }

    let risk_level = if probability >= tuning.high_cutoff {
        RiskLevel::HIGH
    } else if probability >= tuning.medium_cutoff {
        RiskLevel::MEDIUM
    } else {
        RiskLevel::LOW
    };

    Prediction {
        probability,
        risk_level,
        is_high_risk: risk_level == RiskLevel::HIGH,
        reasons,
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "risk",
        "version": "0.1.0",
        "description": "Failure-risk prediction over contracts and agents",
        "commands": [
            { "name": "eval", "description": "Speculative prediction for a draft contract", "parameters": ["title", "deadline", "trust", "streak"] }
        ],
        "storage": [],
        "notes": "Pure function; never mutates state"
    })
}
