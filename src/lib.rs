//! Covenant: an execution governor for tracked commitments.
//!
//! **Covenant is an in-memory control plane for decision execution.**
//!
//! Upstream detectors find commitments in free text; Covenant turns
//! them into contracts, predicts which ones are likely to fail from
//! per-agent trust, and escalates the ones genuinely at risk.
//!
//! # Core Principles
//!
//! - **Governed**: every mutation flows through one command processor
//! - **Auditable**: each accepted mutation lands with exactly one event
//! - **Predictive**: escalation is gated on a pure risk model
//! - **Calibrated**: trust moves on outcomes, never on opinion
//! - **In-memory**: state lives for the process; replay a command log
//!   to reconstruct it
//!
//! # Architecture
//!
//! ## The Single Writer
//!
//! All state mutations route through [`core::broker::StateBroker`]:
//! one command fully applied before the next begins, reads served from
//! the latest committed snapshot.
//!
//! ## Subsystems (Plugins)
//!
//! - `risk`: failure prediction over contracts and agents
//! - `trust`: calibrated trust updates on contract outcomes
//! - `intake`: typed ingestion of detector output
//! - `simulate`: deterministic A/B calibration harness
//!
//! # Examples
//!
//! ```bash
//! # Replay a session command log
//! covenant run --commands session.jsonl --profile pilot.toml
//!
//! # Speculative risk evaluation (state untouched)
//! covenant govern risk --title "Ship the audit report" --deadline Tomorrow --trust 0.55
//!
//! # A/B the trust calibration
//! covenant qa simulate --days 60 --seed 7
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: state, audit trail, governor, broker, export, profile
//! - [`plugins`]: risk, trust, intake, simulate

pub mod core;
pub mod plugins;

use core::broker::StateBroker;
use core::error::CovenantError;
use core::governor::{self, Outcome};
use core::profile::Profile;
use core::state::{Actor, Agent, Contract, ContractLog, ContractStatus, ExecState, Role};
use core::{export, time};
use plugins::{intake, risk, simulate, trust};

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "covenant",
    version = env!("CARGO_PKG_VERSION"),
    about = "The Decision Execution Governor"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct RunCli {
    /// Path to the JSONL command log to replay.
    #[clap(long)]
    commands: PathBuf,
    /// Optional JSONL batch of detector output, ingested before the log.
    #[clap(long)]
    decisions: Option<PathBuf>,
    /// Optional TOML launch profile (tenant, actor, roster, config).
    #[clap(long)]
    profile: Option<PathBuf>,
    /// Tenant id when no profile is given.
    #[clap(long, default_value = "pilot-tenant-001")]
    tenant: String,
    /// Output format: 'text' or 'json'.
    #[clap(long, default_value = "text")]
    format: String,
    /// Write the final state snapshot (with checksum) to this path.
    #[clap(long)]
    export: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct GovernCli {
    #[clap(subcommand)]
    command: GovernCommand,
}

#[derive(Subcommand, Debug)]
enum GovernCommand {
    /// Speculative failure-risk evaluation; state is never touched.
    Risk {
        #[clap(long)]
        title: String,
        #[clap(long)]
        deadline: Option<String>,
        /// Owner trust score; omit to evaluate an unknown owner.
        #[clap(long)]
        trust: Option<f64>,
        #[clap(long, default_value = "0")]
        streak: u32,
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
    /// Project a trust score through one outcome.
    Trust {
        #[clap(long)]
        score: f64,
        #[clap(long, default_value = "0")]
        streak: u32,
        /// 'success' or 'failure'.
        #[clap(long)]
        outcome: String,
    },
}

#[derive(clap::Args, Debug)]
struct QaCli {
    #[clap(subcommand)]
    command: QaCommand,
}

#[derive(Subcommand, Debug)]
enum QaCommand {
    /// Run the deterministic trust-calibration A/B simulation.
    Simulate {
        #[clap(long, default_value = "60")]
        days: u32,
        #[clap(long, default_value = "7")]
        seed: u64,
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },
}

#[derive(clap::Args, Debug)]
struct SchemaCli {
    /// Format: json | md
    #[clap(long, default_value = "json")]
    format: String,
    /// Optional: filter by subsystem name
    #[clap(long)]
    subsystem: Option<String>,
    /// Force deterministic output (removes volatile timestamps)
    #[clap(long)]
    deterministic: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a command log against a fresh in-memory state
    #[clap(name = "run", visible_alias = "r")]
    Run(RunCli),

    /// Governance: risk evaluation and trust projection
    #[clap(name = "govern", visible_alias = "g")]
    Govern(GovernCli),

    /// Quality assurance: calibration simulation
    #[clap(name = "qa", visible_alias = "q")]
    Qa(QaCli),

    /// Subsystem schemas and discovery
    #[clap(name = "schema")]
    Schema(SchemaCli),

    /// Show version information
    #[clap(name = "version")]
    Version,
}

pub fn run() -> Result<(), CovenantError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(run_cli) => run_replay(run_cli),
        Command::Govern(govern_cli) => match govern_cli.command {
            GovernCommand::Risk {
                title,
                deadline,
                trust,
                streak,
                format,
            } => run_risk_eval(&title, deadline.as_deref(), trust, streak, &format),
            GovernCommand::Trust {
                score,
                streak,
                outcome,
            } => run_trust_projection(score, streak, &outcome),
        },
        Command::Qa(qa_cli) => match qa_cli.command {
            QaCommand::Simulate { days, seed, format } => {
                let report = simulate::run(days, seed);
                if format == "json" {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print!("{}", simulate::render_text(&report));
                }
                Ok(())
            }
        },
        Command::Schema(schema_cli) => run_schema(schema_cli),
        Command::Version => {
            println!("v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn initial_state(run_cli: &RunCli) -> Result<ExecState, CovenantError> {
    match &run_cli.profile {
        Some(path) => Ok(Profile::load(path)?.into_state()),
        None => Ok(ExecState::new(
            run_cli.tenant.clone(),
            Actor {
                id: "admin-1".to_string(),
                name: "Admin".to_string(),
                role: Role::Admin,
            },
        )),
    }
}

fn run_replay(run_cli: RunCli) -> Result<(), CovenantError> {
    let state = initial_state(&run_cli)?;
    let broker = StateBroker::new(state);
    let text = std::fs::read_to_string(&run_cli.commands)?;

    let mut applied = 0usize;
    let mut rejected = 0usize;
    let mut skipped = 0usize;
    let mut results = Vec::new();
    let json_output = run_cli.format == "json";

    if let Some(path) = &run_cli.decisions {
        let records = intake::load_batch(path)?;
        let count = records.len();
        match broker.submit(governor::Command::AddDecisions { records }) {
            Outcome::Applied(_) => {
                applied += 1;
                if json_output {
                    results.push(serde_json::json!({
                        "cmd": "add_decisions", "status": "applied", "records": count
                    }));
                } else {
                    println!("  {} add_decisions ({} records)", "✓".bright_green(), count);
                }
            }
            Outcome::Rejected(cause) => {
                rejected += 1;
                let detail = cause.describe();
                if json_output {
                    results.push(serde_json::json!({
                        "cmd": "add_decisions", "status": "rejected", "cause": detail
                    }));
                } else {
                    println!(
                        "  {} add_decisions {}",
                        "✗".bright_red(),
                        detail.bright_black()
                    );
                }
            }
        }
    }

    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
            CovenantError::ValidationError(format!("command at line {}: {}", lineno + 1, e))
        })?;

        let tag = value
            .get("cmd")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        if !governor::COMMAND_TAGS.contains(&tag.as_str()) {
            // Forward-compatible default: unknown commands are no-ops.
            skipped += 1;
            eprintln!(
                "{} line {}: unknown command '{}' skipped",
                "▸".bright_yellow(),
                lineno + 1,
                tag
            );
            continue;
        }

        let command: governor::Command = serde_json::from_value(value).map_err(|e| {
            CovenantError::ValidationError(format!("command at line {}: {}", lineno + 1, e))
        })?;
        let name = command.name();

        match broker.submit(command) {
            Outcome::Applied(_) => {
                applied += 1;
                if json_output {
                    results.push(serde_json::json!({
                        "line": lineno + 1, "cmd": name, "status": "applied"
                    }));
                } else {
                    println!("  {} {}", "✓".bright_green(), name.bright_white());
                }
            }
            Outcome::Rejected(cause) => {
                rejected += 1;
                let detail = cause.describe();
                if json_output {
                    results.push(serde_json::json!({
                        "line": lineno + 1, "cmd": name, "status": "rejected", "cause": detail
                    }));
                } else {
                    println!(
                        "  {} {} {}",
                        "✗".bright_red(),
                        name.bright_white(),
                        detail.bright_black()
                    );
                }
            }
        }
    }

    let snapshot = broker.snapshot();

    if json_output {
        let envelope = serde_json::json!({
            "ts": time::now_epoch_z(),
            "applied": applied,
            "rejected": rejected,
            "skipped": skipped,
            "contracts": snapshot.contracts.len(),
            "audit_events": snapshot.audit_log.len(),
            "agents": snapshot.agents.clone(),
            "results": results,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        println!();
        println!(
            "Replay complete: {} applied, {} rejected, {} skipped",
            applied.to_string().bright_green(),
            rejected.to_string().bright_red(),
            skipped
        );
        println!(
            "Contracts: {}  Audit events: {}",
            snapshot.contracts.len(),
            snapshot.audit_log.len()
        );
        if !snapshot.agents.is_empty() {
            println!();
            println!("{:<20} {:<10} {:<8}", "AGENT", "TRUST", "STREAK");
            for agent in &snapshot.agents {
                println!(
                    "{:<20} {:<10.2} {:<8}",
                    agent.name, agent.trust_score, agent.success_streak
                );
            }
        }
    }

    if let Some(path) = run_cli.export {
        let checksum = export::write_snapshot(&snapshot, &path)?;
        println!();
        println!("Snapshot written to: {} (sha256: {})", path.display(), checksum);
    }

    Ok(())
}

/// An unsigned contract, good enough for the predictor's inputs.
fn draft_contract(title: &str, deadline: Option<&str>) -> Contract {
    let now = time::now_epoch_z();
    Contract {
        id: "draft".to_string(),
        tenant_id: "draft".to_string(),
        title: title.to_string(),
        owner: None,
        deadline: deadline.map(String::from),
        proof_requirement: String::new(),
        declared_risk: None,
        status: ContractStatus::Open,
        logs: vec![ContractLog {
            ts: now.clone(),
            message: "Draft for speculative evaluation".to_string(),
        }],
        proof: None,
        decision_id: None,
        created_at: now,
    }
}

fn run_risk_eval(
    title: &str,
    deadline: Option<&str>,
    trust_score: Option<f64>,
    streak: u32,
    format: &str,
) -> Result<(), CovenantError> {
    let contract = draft_contract(title, deadline);
    let agent = trust_score.map(|score| Agent {
        name: "probe".to_string(),
        role: "Unknown".to_string(),
        trust_score: score,
        success_streak: streak,
    });

    let prediction = risk::predict(&contract, agent.as_ref());

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
        return Ok(());
    }

    let tier = match prediction.risk_level {
        risk::RiskLevel::LOW => "LOW".bright_green(),
        risk::RiskLevel::MEDIUM => "MEDIUM".bright_yellow(),
        risk::RiskLevel::HIGH => "HIGH".bright_red(),
    };
    println!("Probability: {:.2}", prediction.probability);
    println!("Risk tier: {}", tier.bold());
    if prediction.reasons.is_empty() {
        println!("Reasons: none (no factor triggered)");
    } else {
        println!("Reasons:");
        for reason in &prediction.reasons {
            println!("  - {}", reason);
        }
    }
    Ok(())
}

fn run_trust_projection(score: f64, streak: u32, outcome: &str) -> Result<(), CovenantError> {
    if !(0.0..=1.0).contains(&score) {
        return Err(CovenantError::ValidationError(format!(
            "score {} outside [0, 1]",
            score
        )));
    }
    let (new_score, new_streak) = match outcome {
        "success" => trust::apply_success(score, streak),
        "failure" => trust::apply_failure(score),
        other => {
            return Err(CovenantError::ValidationError(format!(
                "outcome must be 'success' or 'failure', got '{}'",
                other
            )));
        }
    };
    println!(
        "trust {:.2} (streak {}) --{}-> trust {:.2} (streak {})",
        score, streak, outcome, new_score, new_streak
    );
    Ok(())
}

fn run_schema(schema_cli: SchemaCli) -> Result<(), CovenantError> {
    let mut schemas = std::collections::BTreeMap::new();
    schemas.insert("broker", core::broker::schema());
    schemas.insert("intake", intake::schema());
    schemas.insert("risk", risk::schema());
    schemas.insert("simulate", simulate::schema());
    schemas.insert("trust", trust::schema());

    let output = if let Some(sub) = schema_cli.subsystem {
        schemas
            .get(sub.as_str())
            .cloned()
            .unwrap_or(serde_json::json!({ "error": "subsystem not found" }))
    } else {
        let mut envelope = serde_json::json!({
            "schema_version": "1.0.0",
            "subsystems": schemas
        });
        if !schema_cli.deterministic {
            if let Some(obj) = envelope.as_object_mut() {
                obj.insert(
                    "generated_at".to_string(),
                    serde_json::json!(time::now_epoch_z()),
                );
            }
        }
        envelope
    };

    if schema_cli.format == "json" {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Markdown schema format not yet implemented. Defaulting to JSON.");
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}
