//! Calibration harness for the trust model.
//!
//! Replays synthetic agent histories against the baseline trust model
//! and the calibrated one (momentum bonus + betrayal penalty), then
//! reports predictive precision and recall. Deterministic: the same
//! seed yields the same report, and both models consume the same draw
//! sequence so the A/B comparison is fair.

use crate::plugins::trust;
use serde::Serialize;

/// Daily probability that an agent picks up a task.
const TASK_CHANCE: f64 = 0.3;
/// Risk threshold the baseline model alarms at.
const BASELINE_RISK_THRESHOLD: f64 = 0.7;
/// Calibrated threshold is lower: harsher penalties drop bad agents
/// faster, so the alarm can fire less eagerly without losing recall.
const CALIBRATED_RISK_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy)]
pub struct SimPersona {
    pub name: &'static str,
    pub reliability: f64,
}

/// Fixed persona roster spanning the reliability spectrum.
pub const ROSTER: [SimPersona; 3] = [
    SimPersona {
        name: "Reliable Rex",
        reliability: 0.95,
    },
    SimPersona {
        name: "Average Alice",
        reliability: 0.80,
    },
    SimPersona {
        name: "Chaos Carl",
        reliability: 0.50,
    },
];

#[derive(Debug, Serialize, Clone)]
pub struct ModelReport {
    pub model: String,
    pub precision: f64,
    pub recall: f64,
    pub true_positives: u32,
    pub false_positives: u32,
    pub failures: u32,
    pub final_trust: Vec<(String, f64)>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CalibrationReport {
    pub days: u32,
    pub seed: u64,
    pub baseline: ModelReport,
    pub calibrated: ModelReport,
}

/// xorshift64*: small, seedable, good enough for draw sequences. No
/// crypto claims.
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Rng(seed.max(1))
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Model {
    Baseline,
    Calibrated,
}

struct SimAgent {
    persona: SimPersona,
    trust: f64,
    streak: u32,
}

fn run_model(model: Model, days: u32, seed: u64) -> ModelReport {
    let mut rng = Rng::new(seed);
    let mut agents: Vec<SimAgent> = ROSTER
        .iter()
        .map(|p| SimAgent {
            persona: *p,
            trust: trust::SEED_TRUST,
            streak: 0,
        })
        .collect();

    let mut true_positives = 0u32;
    let mut false_positives = 0u32;
    let mut false_negatives = 0u32;
    let mut failures = 0u32;

    for _day in 0..days {
        for agent in agents.iter_mut() {
            if rng.next_f64() >= TASK_CHANCE {
                continue;
            }
            let success = rng.next_f64() < agent.persona.reliability;

            let predicted_risky = match model {
                Model::Baseline => agent.trust < BASELINE_RISK_THRESHOLD,
                Model::Calibrated => agent.trust < CALIBRATED_RISK_THRESHOLD,
            };

            match model {
                Model::Baseline => {
                    agent.trust = if success {
                        (agent.trust + trust::SUCCESS_INCREMENT).min(1.0)
                    } else {
                        (agent.trust - trust::FAILURE_PENALTY).max(0.0)
                    };
                }
                Model::Calibrated => {
                    if success {
                        let (score, streak) = trust::apply_success(agent.trust, agent.streak);
                        agent.trust = score;
                        agent.streak = streak;
                    } else {
                        let (score, streak) = trust::apply_failure(agent.trust);
                        agent.trust = score;
                        agent.streak = streak;
                    }
                }
            }

            if predicted_risky && !success {
                true_positives += 1;
            }
            if predicted_risky && success {
                false_positives += 1;
            }
            if !predicted_risky && !success {
                false_negatives += 1;
            }
            if !success {
                failures += 1;
            }
        }
    }

    let precision = ratio(true_positives, true_positives + false_positives);
    let recall = ratio(true_positives, true_positives + false_negatives);

    ModelReport {
        model: match model {
            Model::Baseline => "baseline".to_string(),
            Model::Calibrated => "calibrated".to_string(),
        },
        precision,
        recall,
        true_positives,
        false_positives,
        failures,
        final_trust: agents
            .iter()
            .map(|a| (a.persona.name.to_string(), a.trust))
            .collect(),
    }
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        f64::from(num) / f64::from(den)
    }
}

/// Run the A/B comparison. Both models see the identical draw sequence.
pub fn run(days: u32, seed: u64) -> CalibrationReport {
    CalibrationReport {
        days,
        seed,
        baseline: run_model(Model::Baseline, days, seed),
        calibrated: run_model(Model::Calibrated, days, seed),
    }
}

pub fn render_text(report: &CalibrationReport) -> String {
    let mut out = String::new();
    out.push_str("--- CALIBRATION A/B RESULTS ---\n");
    out.push_str(&format!(
        "days: {}  seed: {}\n\n",
        report.days, report.seed
    ));
    for model in [&report.baseline, &report.calibrated] {
        out.push_str(&format!("[{} model]\n", model.model.to_uppercase()));
        out.push_str(&format!("  precision: {:.1}%\n", model.precision * 100.0));
        out.push_str(&format!("  recall: {:.1}%\n", model.recall * 100.0));
        out.push_str(&format!("  false positives: {}\n", model.false_positives));
        out.push_str("  final trust:\n");
        for (name, score) in &model.final_trust {
            out.push_str(&format!("    {}: {:.0}%\n", name, score * 100.0));
        }
        out.push('\n');
    }
    out
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "simulate",
        "version": "0.1.0",
        "description": "Deterministic A/B calibration of the trust model",
        "commands": [
            { "name": "run", "description": "Replay synthetic histories against both models", "parameters": ["days", "seed"] }
        ],
        "storage": []
    })
}
