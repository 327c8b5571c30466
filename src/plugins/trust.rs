//! Calibrated trust scoring for execution agents.
//!
//! Trust moves only on contract outcomes: completions nudge it up,
//! recorded failures pull it down. The calibrated model layers a
//! momentum bonus for struggling agents on a streak and a betrayal
//! penalty when a highly trusted agent fails.

/// Trust assigned to a newly discovered agent.
pub const SEED_TRUST: f64 = 0.5;
/// Base increment per completed contract.
pub const SUCCESS_INCREMENT: f64 = 0.05;
/// Extra increment for sustained recent improvement.
pub const MOMENTUM_BONUS: f64 = 0.02;
/// Streak length at which momentum starts paying out.
pub const MOMENTUM_STREAK: u32 = 3;
/// Momentum applies only below this score; already-trusted agents do
/// not compound streaks.
pub const MOMENTUM_TRUST_CEILING: f64 = 0.6;
/// Base penalty per recorded failure.
pub const FAILURE_PENALTY: f64 = 0.10;
/// Doubled penalty when prior trust sat above the betrayal floor.
pub const BETRAYAL_PENALTY: f64 = 0.20;
pub const BETRAYAL_TRUST_FLOOR: f64 = 0.9;

/// Success path: bump the streak, apply the base increment, and add the
/// momentum bonus while the agent is still below the trusted band.
/// Result is clamped to 1.0.
pub fn apply_success(score: f64, streak: u32) -> (f64, u32) {
    let streak = streak + 1;
    let mut increment = SUCCESS_INCREMENT;
    if streak >= MOMENTUM_STREAK && score < MOMENTUM_TRUST_CEILING {
        increment += MOMENTUM_BONUS;
    }
    ((score + increment).min(1.0), streak)
}

/// Failure path: the streak resets, and betrayal is penalized double
/// when prior trust sat above the high-trust floor. Result is clamped
/// to 0.0.
pub fn apply_failure(score: f64) -> (f64, u32) {
    let penalty = if score > BETRAYAL_TRUST_FLOOR {
        BETRAYAL_PENALTY
    } else {
        FAILURE_PENALTY
    };
    ((score - penalty).max(0.0), 0)
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "trust",
        "version": "0.1.0",
        "description": "Calibrated trust updates on contract outcomes",
        "commands": [
            { "name": "project", "description": "Project a score through one outcome", "parameters": ["score", "streak", "outcome"] }
        ],
        "storage": []
    })
}
