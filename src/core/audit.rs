//! Append-only audit trail.
//!
//! Every accepted mutation lands in the same snapshot as exactly one
//! audit event; the two are never observable apart. Events are totally
//! ordered by insertion and immutable once written. Tenant isolation is
//! structural: the tenant id is copied from the generating state at log
//! time, never filtered at read time.

use crate::core::state::{
    BaselineMetrics, ConfigKey, Contract, ContractStatus, ExecState, Role,
};
use crate::core::time;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetKind {
    Contract,
    Agent,
    System,
}

/// What an event acted on.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TargetRef {
    pub kind: TargetKind,
    pub id: String,
}

impl TargetRef {
    pub fn contract(id: &str) -> Self {
        TargetRef {
            kind: TargetKind::Contract,
            id: id.to_string(),
        }
    }

    pub fn system(id: &str) -> Self {
        TargetRef {
            kind: TargetKind::System,
            id: id.to_string(),
        }
    }
}

/// Who an event was applied for. A deliberately thin projection of
/// `Actor`; names stay out of the trail.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ActorRef {
    pub id: String,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResetKind {
    /// Collections return to defaults; tenant, actor, and the audit
    /// trail itself survive. A hard reset is reserved and never issued
    /// by the governor.
    Soft,
}

/// One variant per event type, each with its own typed payload, so the
/// trail is exhaustively matchable.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "event_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditPayload {
    DecisionDetected {
        count: usize,
    },
    ContractCreated {
        contract: Box<Contract>,
    },
    StatusChange {
        status: ContractStatus,
        reason: String,
    },
    ProofSubmitted {
        proof: String,
    },
    FailureRecorded {
        reason: Option<String>,
        penalty: f64,
    },
    ConfigChange {
        key: ConfigKey,
        old_value: bool,
        new_value: bool,
    },
    BaselineSet {
        metrics: BaselineMetrics,
    },
    SystemReset {
        kind: ResetKind,
    },
    DataExport {
        contracts: usize,
        agents: usize,
        events: usize,
    },
}

impl AuditPayload {
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditPayload::DecisionDetected { .. } => "DECISION_DETECTED",
            AuditPayload::ContractCreated { .. } => "CONTRACT_CREATED",
            AuditPayload::StatusChange { .. } => "STATUS_CHANGE",
            AuditPayload::ProofSubmitted { .. } => "PROOF_SUBMITTED",
            AuditPayload::FailureRecorded { .. } => "FAILURE_RECORDED",
            AuditPayload::ConfigChange { .. } => "CONFIG_CHANGE",
            AuditPayload::BaselineSet { .. } => "BASELINE_SET",
            AuditPayload::SystemReset { .. } => "SYSTEM_RESET",
            AuditPayload::DataExport { .. } => "DATA_EXPORT",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditEvent {
    pub id: String,
    pub ts: String,
    pub tenant_id: String,
    pub actor: ActorRef,
    pub target: TargetRef,
    pub payload: AuditPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuditEvent {
    /// Stamp a new event from the generating state.
    pub fn record(
        state: &ExecState,
        target: TargetRef,
        payload: AuditPayload,
        reason: Option<String>,
    ) -> Self {
        AuditEvent {
            id: time::new_event_id(),
            ts: time::now_epoch_z(),
            tenant_id: state.tenant_id.clone(),
            actor: ActorRef {
                id: state.current_actor.id.clone(),
                role: state.current_actor.role,
            },
            target,
            payload,
            reason,
        }
    }
}
