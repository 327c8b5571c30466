//! Entity graph for the execution governor.
//!
//! One `ExecState` value is the complete world: decisions, contracts,
//! agents, audit trail, config, and the authenticated actor. Commands
//! never mutate in place; the governor derives a replacement snapshot
//! and the broker commits it. Entities are created and transitioned,
//! never deleted (a soft reset clears collections wholesale).

use crate::core::audit::AuditEvent;
use serde::{Deserialize, Serialize};

/// Actor roles as delivered by the upstream authorization gate.
///
/// The governor trusts this value as already authenticated; only `Admin`
/// may touch configuration, baselines, or resets.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Operator,
    Observer,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Operator => "OPERATOR",
            Role::Observer => "OBSERVER",
        }
    }
}

/// The authenticated actor on whose behalf commands are applied.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// Rollout stage of enforcement. Escalation gating applies only under
/// `GaConstrained`; earlier stages pass auto-escalations through ungated.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PilotMode {
    #[serde(rename = "ADVISORY")]
    Advisory,
    #[serde(rename = "ACTIVE")]
    Active,
    #[serde(rename = "GA_CONSTRAINED")]
    GaConstrained,
}

impl PilotMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PilotMode::Advisory => "ADVISORY",
            PilotMode::Active => "ACTIVE",
            PilotMode::GaConstrained => "GA_CONSTRAINED",
        }
    }
}

/// A tracked person. Trust moves only on contract outcomes; the streak
/// counts consecutive completions since the last recorded failure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Agent {
    pub name: String,
    pub role: String,
    pub trust_score: f64,
    pub success_streak: u32,
}

impl Agent {
    /// A previously unseen owner, discovered when a contract first names
    /// them. Seeded at neutral trust until outcomes say otherwise.
    pub fn discovered(name: &str) -> Self {
        Agent {
            name: name.to_string(),
            role: "Unknown".to_string(),
            trust_score: crate::plugins::trust::SEED_TRUST,
            success_streak: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Open,
    Escalated,
    Completed,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Open => "open",
            ContractStatus::Escalated => "escalated",
            ContractStatus::Completed => "completed",
        }
    }
}

/// One line of a contract's append-only history.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ContractLog {
    pub ts: String,
    pub message: String,
}

/// An execution contract: a commitment with an owner, a deadline
/// descriptor, and a required proof of completion.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Contract {
    pub id: String,
    pub tenant_id: String,
    pub title: String,
    /// Back-reference to an agent by name; not ownership of the record.
    pub owner: Option<String>,
    /// Free-form descriptor ("Tomorrow", "Next Week", a date token).
    pub deadline: Option<String>,
    /// What objective evidence closes this contract.
    pub proof_requirement: String,
    /// Risk label declared at signing time; informational only, the
    /// predictor computes its own tier.
    pub declared_risk: Option<String>,
    pub status: ContractStatus,
    pub logs: Vec<ContractLog>,
    pub proof: Option<String>,
    /// The detected decision this contract was signed from, if any.
    pub decision_id: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    Detected,
    Contracted,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
}

/// A candidate commitment handed over by the upstream detector.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DecisionRecord {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub suggested_owner: Option<String>,
    #[serde(default)]
    pub suggested_deadline: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
    pub status: DecisionStatus,
}

/// Named config flags, toggleable one at a time by an admin.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    DisablePredictions,
    DisableAutoEscalation,
    ReadOnlyMode,
    EnableNudges,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::DisablePredictions => "disable_predictions",
            ConfigKey::DisableAutoEscalation => "disable_auto_escalation",
            ConfigKey::ReadOnlyMode => "read_only_mode",
            ConfigKey::EnableNudges => "enable_nudges",
        }
    }
}

/// Process-wide governor toggles.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    pub disable_predictions: bool,
    pub disable_auto_escalation: bool,
    pub read_only_mode: bool,
    pub enable_nudges: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            disable_predictions: false,
            disable_auto_escalation: false,
            read_only_mode: false,
            enable_nudges: true,
        }
    }
}

impl SystemConfig {
    pub fn get(&self, key: ConfigKey) -> bool {
        match key {
            ConfigKey::DisablePredictions => self.disable_predictions,
            ConfigKey::DisableAutoEscalation => self.disable_auto_escalation,
            ConfigKey::ReadOnlyMode => self.read_only_mode,
            ConfigKey::EnableNudges => self.enable_nudges,
        }
    }

    /// Flip one flag; returns (old, new) for the audit payload.
    pub fn toggle(&mut self, key: ConfigKey) -> (bool, bool) {
        let old = self.get(key);
        let new = !old;
        match key {
            ConfigKey::DisablePredictions => self.disable_predictions = new,
            ConfigKey::DisableAutoEscalation => self.disable_auto_escalation = new,
            ConfigKey::ReadOnlyMode => self.read_only_mode = new,
            ConfigKey::EnableNudges => self.enable_nudges = new,
        }
        (old, new)
    }
}

/// Observability counters surfaced to the presentation layer. The core
/// records them; it does not compute lift itself.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Metrics {
    pub execution_lift: f64,
    pub alert_fatigue: f64,
    pub override_freq: f64,
    pub trust_drift: f64,
}

/// Pre-rollout reference point for later lift calculations.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct BaselineMetrics {
    pub avg_decisions_per_meeting: f64,
    pub task_completion_rate: f64,
    pub avg_time_to_close: f64,
    pub set_at: Option<String>,
}

/// The complete world state for one tenant.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExecState {
    pub tenant_id: String,
    pub pilot_mode: PilotMode,
    pub decisions: Vec<DecisionRecord>,
    pub contracts: Vec<Contract>,
    pub agents: Vec<Agent>,
    pub audit_log: Vec<AuditEvent>,
    pub system_config: SystemConfig,
    pub current_actor: Actor,
    pub metrics: Metrics,
    pub baseline_metrics: BaselineMetrics,
}

impl ExecState {
    pub fn new(tenant_id: String, actor: Actor) -> Self {
        ExecState {
            tenant_id,
            pilot_mode: PilotMode::GaConstrained,
            decisions: Vec::new(),
            contracts: Vec::new(),
            agents: Vec::new(),
            audit_log: Vec::new(),
            system_config: SystemConfig::default(),
            current_actor: actor,
            metrics: Metrics::default(),
            baseline_metrics: BaselineMetrics::default(),
        }
    }

    /// Owner resolution: a stable name lookup within the tenant.
    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name == name)
    }

    pub fn contract(&self, id: &str) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.id == id)
    }
}
