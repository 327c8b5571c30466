//! The execution governor: a total command processor over the entity
//! graph.
//!
//! `apply` takes the current state and one command and yields either a
//! complete replacement snapshot or a rejection. No partial mutation is
//! ever observable; an accepted mutation and its audit event land in
//! the same snapshot. Rejections carry their cause but are not audited
//! and leave the input state untouched.

use crate::core::audit::{AuditEvent, AuditPayload, ResetKind, TargetRef};
use crate::core::state::{
    Agent, BaselineMetrics, ConfigKey, Contract, ContractLog, ContractStatus, DecisionRecord,
    DecisionStatus, ExecState, PilotMode, Role,
};
use crate::core::time;
use crate::plugins::risk::{self, Prediction, RiskLevel};
use crate::plugins::trust;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Recorded when a status change arrives without a caller reason.
pub const DEFAULT_STATUS_REASON: &str = "Manual Update";
/// Minimum justification length to override an escalation.
pub const MIN_OVERRIDE_JUSTIFICATION: usize = 5;

/// The full command catalog, serde-tagged so an ordered command log can
/// be replayed verbatim.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    AddDecisions {
        records: Vec<DecisionRecord>,
    },
    CreateContract {
        #[serde(default)]
        decision_id: Option<String>,
        title: String,
        #[serde(default)]
        owner: Option<String>,
        #[serde(default)]
        deadline: Option<String>,
        #[serde(default)]
        proof_requirement: String,
        #[serde(default)]
        declared_risk: Option<String>,
    },
    UpdateContractStatus {
        id: String,
        status: ContractStatus,
        #[serde(default)]
        reason: Option<String>,
        #[serde(default)]
        is_auto: bool,
    },
    AddProof {
        id: String,
        proof: String,
    },
    RecordFailure {
        id: String,
        #[serde(default)]
        reason: Option<String>,
    },
    ToggleSystemConfig {
        key: ConfigKey,
    },
    SetBaselineMetrics {
        metrics: BaselineMetrics,
    },
    ResetSystem,
    ExportData,
}

/// Known command tags, for forward-compatible log replay: a tag outside
/// this list is skipped with a diagnostic instead of failing the run.
pub const COMMAND_TAGS: &[&str] = &[
    "add_decisions",
    "create_contract",
    "update_contract_status",
    "add_proof",
    "record_failure",
    "toggle_system_config",
    "set_baseline_metrics",
    "reset_system",
    "export_data",
];

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddDecisions { .. } => "add_decisions",
            Command::CreateContract { .. } => "create_contract",
            Command::UpdateContractStatus { .. } => "update_contract_status",
            Command::AddProof { .. } => "add_proof",
            Command::RecordFailure { .. } => "record_failure",
            Command::ToggleSystemConfig { .. } => "toggle_system_config",
            Command::SetBaselineMetrics { .. } => "set_baseline_metrics",
            Command::ResetSystem => "reset_system",
            Command::ExportData => "export_data",
        }
    }
}

/// Why a command was declined. Rejections are diagnostic-channel
/// material only; they never enter the audit trail.
#[derive(Debug, Clone)]
pub enum RejectCause {
    ReadOnly,
    NotAdmin { role: Role },
    JustificationRequired { supplied: usize },
    SafeHarbor { contract_id: String, prediction: Prediction },
    AutoEscalationDisabled,
    UnknownContract { id: String },
}

impl RejectCause {
    pub fn describe(&self) -> String {
        match self {
            RejectCause::ReadOnly => "System is in read-only mode".to_string(),
            RejectCause::NotAdmin { role } => {
                format!("Requires ADMIN role; actor is {}", role.as_str())
            }
            RejectCause::JustificationRequired { supplied } => format!(
                "Override requires a justification of at least {} characters ({} supplied)",
                MIN_OVERRIDE_JUSTIFICATION, supplied
            ),
            RejectCause::SafeHarbor { contract_id, prediction } => format!(
                "Auto-escalation suppressed for {}: {} risk (safe harbor)",
                contract_id,
                prediction.risk_level.as_str()
            ),
            RejectCause::AutoEscalationDisabled => {
                "Auto-escalation is disabled by system config".to_string()
            }
            RejectCause::UnknownContract { id } => format!("No contract with id {}", id),
        }
    }
}

/// Discriminated result of applying one command: callers never have to
/// diff states to learn whether anything happened.
#[derive(Debug, Clone)]
pub enum Outcome {
    Applied(Box<ExecState>),
    Rejected(RejectCause),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<Box<ExecState>> {
        match self {
            Outcome::Applied(state) => Some(state),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn rejected(&self) -> Option<&RejectCause> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::Rejected(cause) => Some(cause),
        }
    }
}

/// Apply one command. Total: every command either yields a replacement
/// snapshot or a rejection; nothing panics, nothing blocks, nothing
/// does I/O.
pub fn apply(state: &ExecState, command: Command) -> Outcome {
    // Global kill-switch. Fires before any mutation logic and is itself
    // unaudited; config toggles and exports stay available for recovery.
    if state.system_config.read_only_mode
        && !matches!(
            command,
            Command::ToggleSystemConfig { .. } | Command::ExportData
        )
    {
        return Outcome::Rejected(RejectCause::ReadOnly);
    }

    match command {
        Command::AddDecisions { records } => add_decisions(state, records),
        Command::CreateContract {
            decision_id,
            title,
            owner,
            deadline,
            proof_requirement,
            declared_risk,
        } => create_contract(
            state,
            decision_id,
            title,
            owner,
            deadline,
            proof_requirement,
            declared_risk,
        ),
        Command::UpdateContractStatus {
            id,
            status,
            reason,
            is_auto,
        } => update_contract_status(state, id, status, reason, is_auto),
        Command::AddProof { id, proof } => add_proof(state, id, proof),
        Command::RecordFailure { id, reason } => record_failure(state, id, reason),
        Command::ToggleSystemConfig { key } => toggle_system_config(state, key),
        Command::SetBaselineMetrics { metrics } => set_baseline_metrics(state, metrics),
        Command::ResetSystem => reset_system(state),
        Command::ExportData => export_data(state),
    }
}

fn push_event(
    next: &mut ExecState,
    target: TargetRef,
    payload: AuditPayload,
    reason: Option<String>,
) {
    let event = AuditEvent::record(next, target, payload, reason);
    next.audit_log.push(event);
}

fn require_admin(state: &ExecState) -> Option<RejectCause> {
    if state.current_actor.role.is_admin() {
        None
    } else {
        Some(RejectCause::NotAdmin {
            role: state.current_actor.role,
        })
    }
}

fn add_decisions(state: &ExecState, records: Vec<DecisionRecord>) -> Outcome {
    let mut next = state.clone();
    let count = records.len();
    next.decisions.extend(records);
    push_event(
        &mut next,
        TargetRef::system("batch"),
        AuditPayload::DecisionDetected { count },
        None,
    );
    Outcome::Applied(Box::new(next))
}

fn create_contract(
    state: &ExecState,
    decision_id: Option<String>,
    title: String,
    owner: Option<String>,
    deadline: Option<String>,
    proof_requirement: String,
    declared_risk: Option<String>,
) -> Outcome {
    let mut next = state.clone();
    let now = time::now_epoch_z();

    let contract = Contract {
        id: Ulid::new().to_string(),
        tenant_id: next.tenant_id.clone(),
        title,
        owner: owner.clone(),
        deadline,
        proof_requirement,
        declared_risk,
        status: ContractStatus::Open,
        logs: vec![ContractLog {
            ts: now.clone(),
            message: "Contract created".to_string(),
        }],
        proof: None,
        decision_id: decision_id.clone(),
        created_at: now,
    };

    // First reference to an unknown owner discovers a new agent at seed
    // trust.
    if let Some(name) = owner.as_deref() {
        if !name.is_empty() && next.agent(name).is_none() {
            next.agents.push(Agent::discovered(name));
        }
    }

    if let Some(did) = decision_id.as_deref() {
        if let Some(decision) = next.decisions.iter_mut().find(|d| d.id == did) {
            decision.status = DecisionStatus::Contracted;
        }
    }

    let recorded = contract.clone();
    // Newest first, matching the execution feed ordering.
    next.contracts.insert(0, contract);
    push_event(
        &mut next,
        TargetRef::contract(&recorded.id),
        AuditPayload::ContractCreated {
            contract: Box::new(recorded),
        },
        None,
    );
    Outcome::Applied(Box::new(next))
}

fn update_contract_status(
    state: &ExecState,
    id: String,
    status: ContractStatus,
    reason: Option<String>,
    is_auto: bool,
) -> Outcome {
    let Some(current) = state.contract(&id) else {
        return Outcome::Rejected(RejectCause::UnknownContract { id });
    };

    if is_auto {
        if status == ContractStatus::Escalated {
            if state.system_config.disable_auto_escalation {
                return Outcome::Rejected(RejectCause::AutoEscalationDisabled);
            }
            // Constrained GA: only MEDIUM and HIGH predictions may
            // escalate automatically. LOW-tier requests fall into the
            // safe harbor; the system declines to escalate work it does
            // not believe is genuinely at risk.
            if state.pilot_mode == PilotMode::GaConstrained
                && !state.system_config.disable_predictions
            {
                let agent = current.owner.as_deref().and_then(|o| state.agent(o));
                let prediction = risk::predict(current, agent);
                if prediction.risk_level == RiskLevel::LOW {
                    return Outcome::Rejected(RejectCause::SafeHarbor {
                        contract_id: id,
                        prediction,
                    });
                }
            }
        }
    } else if current.status == ContractStatus::Escalated && status != ContractStatus::Escalated {
        // Manual de-escalation requires written justification.
        let supplied = reason.as_deref().map(|r| r.chars().count()).unwrap_or(0);
        if supplied < MIN_OVERRIDE_JUSTIFICATION {
            return Outcome::Rejected(RejectCause::JustificationRequired { supplied });
        }
    }

    let mut next = state.clone();
    let now = time::now_epoch_z();
    let Some(contract) = next.contracts.iter_mut().find(|c| c.id == id) else {
        return Outcome::Rejected(RejectCause::UnknownContract { id });
    };
    contract.status = status;
    contract.logs.push(ContractLog {
        ts: now,
        message: format!("Status changed to {}", status.as_str()),
    });

    let reason = reason.unwrap_or_else(|| DEFAULT_STATUS_REASON.to_string());
    push_event(
        &mut next,
        TargetRef::contract(&id),
        AuditPayload::StatusChange { status, reason },
        None,
    );
    Outcome::Applied(Box::new(next))
}

fn add_proof(state: &ExecState, id: String, proof: String) -> Outcome {
    if state.contract(&id).is_none() {
        return Outcome::Rejected(RejectCause::UnknownContract { id });
    }

    let mut next = state.clone();
    let now = time::now_epoch_z();
    let mut owner_name = None;
    if let Some(contract) = next.contracts.iter_mut().find(|c| c.id == id) {
        contract.status = ContractStatus::Completed;
        contract.proof = Some(proof.clone());
        contract.logs.push(ContractLog {
            ts: now,
            message: "Proof submitted & verified".to_string(),
        });
        owner_name = contract.owner.clone();
    }

    // Completion feeds the calibrated trust model.
    if let Some(name) = owner_name {
        if let Some(agent) = next.agents.iter_mut().find(|a| a.name == name) {
            let (score, streak) = trust::apply_success(agent.trust_score, agent.success_streak);
            agent.trust_score = score;
            agent.success_streak = streak;
        }
    }

    push_event(
        &mut next,
        TargetRef::contract(&id),
        AuditPayload::ProofSubmitted { proof },
        None,
    );
    Outcome::Applied(Box::new(next))
}

fn record_failure(state: &ExecState, id: String, reason: Option<String>) -> Outcome {
    if state.contract(&id).is_none() {
        return Outcome::Rejected(RejectCause::UnknownContract { id });
    }

    let mut next = state.clone();
    let now = time::now_epoch_z();
    let mut owner_name = None;
    if let Some(contract) = next.contracts.iter_mut().find(|c| c.id == id) {
        // A missed commitment does not close the contract; the status
        // stays wherever the state machine had it.
        contract.logs.push(ContractLog {
            ts: now,
            message: match reason.as_deref() {
                Some(text) => format!("Failure recorded: {}", text),
                None => "Failure recorded".to_string(),
            },
        });
        owner_name = contract.owner.clone();
    }

    let mut penalty = 0.0;
    if let Some(name) = owner_name {
        if let Some(agent) = next.agents.iter_mut().find(|a| a.name == name) {
            let (score, streak) = trust::apply_failure(agent.trust_score);
            penalty = agent.trust_score - score;
            agent.trust_score = score;
            agent.success_streak = streak;
        }
    }

    push_event(
        &mut next,
        TargetRef::contract(&id),
        AuditPayload::FailureRecorded { reason, penalty },
        None,
    );
    Outcome::Applied(Box::new(next))
}

fn toggle_system_config(state: &ExecState, key: ConfigKey) -> Outcome {
    if let Some(cause) = require_admin(state) {
        return Outcome::Rejected(cause);
    }

    let mut next = state.clone();
    let (old_value, new_value) = next.system_config.toggle(key);
    push_event(
        &mut next,
        TargetRef::system("config"),
        AuditPayload::ConfigChange {
            key,
            old_value,
            new_value,
        },
        None,
    );
    Outcome::Applied(Box::new(next))
}

fn set_baseline_metrics(state: &ExecState, metrics: BaselineMetrics) -> Outcome {
    if let Some(cause) = require_admin(state) {
        return Outcome::Rejected(cause);
    }

    let mut next = state.clone();
    next.baseline_metrics = BaselineMetrics {
        set_at: Some(time::now_epoch_z()),
        ..metrics
    };
    let recorded = next.baseline_metrics.clone();
    push_event(
        &mut next,
        TargetRef::system("baseline"),
        AuditPayload::BaselineSet { metrics: recorded },
        None,
    );
    Outcome::Applied(Box::new(next))
}

fn reset_system(state: &ExecState) -> Outcome {
    if let Some(cause) = require_admin(state) {
        return Outcome::Rejected(cause);
    }

    // Soft reset: collections and config return to defaults, tenant and
    // actor identity survive, and the append-only trail survives with
    // the reset itself as its next entry.
    let mut next = ExecState::new(state.tenant_id.clone(), state.current_actor.clone());
    next.audit_log = state.audit_log.clone();
    push_event(
        &mut next,
        TargetRef::system("reset"),
        AuditPayload::SystemReset {
            kind: ResetKind::Soft,
        },
        None,
    );
    Outcome::Applied(Box::new(next))
}

fn export_data(state: &ExecState) -> Outcome {
    let mut next = state.clone();
    let payload = AuditPayload::DataExport {
        contracts: next.contracts.len(),
        agents: next.agents.len(),
        events: next.audit_log.len(),
    };
    push_event(&mut next, TargetRef::system("export"), payload, None);
    Outcome::Applied(Box::new(next))
}
