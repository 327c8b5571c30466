use covenant::core::governor::{Command, Outcome, RejectCause, apply};
use covenant::core::state::{
    Actor, Agent, BaselineMetrics, ConfigKey, ContractStatus, ExecState, PilotMode, Role,
};

fn actor(role: Role) -> Actor {
    Actor {
        id: "actor-1".to_string(),
        name: "Actor".to_string(),
        role,
    }
}

fn fresh() -> ExecState {
    ExecState::new("pilot-tenant-001".to_string(), actor(Role::Admin))
}

fn apply_ok(state: &ExecState, command: Command) -> ExecState {
    match apply(state, command) {
        Outcome::Applied(next) => *next,
        Outcome::Rejected(cause) => panic!("expected acceptance, got {:?}", cause),
    }
}

/// Fresh state holding one open contract for `owner` at `trust`.
fn with_contract(title: &str, deadline: Option<&str>, owner: &str, trust: f64) -> (ExecState, String) {
    let mut state = fresh();
    state.agents.push(Agent {
        name: owner.to_string(),
        role: "Engineering".to_string(),
        trust_score: trust,
        success_streak: 0,
    });
    let state = apply_ok(
        &state,
        Command::CreateContract {
            decision_id: None,
            title: title.to_string(),
            owner: Some(owner.to_string()),
            deadline: deadline.map(String::from),
            proof_requirement: String::new(),
            declared_risk: None,
        },
    );
    let id = state.contracts[0].id.clone();
    (state, id)
}

fn escalate(id: &str, is_auto: bool) -> Command {
    Command::UpdateContractStatus {
        id: id.to_string(),
        status: ContractStatus::Escalated,
        reason: None,
        is_auto,
    }
}

fn deescalate(id: &str, reason: Option<&str>) -> Command {
    Command::UpdateContractStatus {
        id: id.to_string(),
        status: ContractStatus::Open,
        reason: reason.map(String::from),
        is_auto: false,
    }
}

#[test]
fn manual_escalation_needs_no_justification() {
    let (state, id) = with_contract("Test Task", None, "John", 0.9);
    let state = apply_ok(&state, escalate(&id, false));
    assert_eq!(state.contract(&id).unwrap().status, ContractStatus::Escalated);
}

#[test]
fn override_without_justification_is_blocked() {
    let (state, id) = with_contract("Test Task", None, "John", 0.9);
    let state = apply_ok(&state, escalate(&id, false));
    let events = state.audit_log.len();

    for reason in [None, Some(""), Some("No"), Some("Nope")] {
        match apply(&state, deescalate(&id, reason)) {
            Outcome::Rejected(RejectCause::JustificationRequired { supplied }) => {
                assert!(supplied < 5);
            }
            other => panic!("expected JustificationRequired, got {:?}", other),
        }
    }
    // Nothing changed, nothing was audited.
    assert_eq!(state.contract(&id).unwrap().status, ContractStatus::Escalated);
    assert_eq!(state.audit_log.len(), events);
}

#[test]
fn override_with_justification_goes_through() {
    let (state, id) = with_contract("Test Task", None, "John", 0.9);
    let state = apply_ok(&state, escalate(&id, false));
    let state = apply_ok(&state, deescalate(&id, Some("Client delayed input")));
    assert_eq!(state.contract(&id).unwrap().status, ContractStatus::Open);

    match &state.audit_log.last().unwrap().payload {
        covenant::core::audit::AuditPayload::StatusChange { status, reason } => {
            assert_eq!(*status, ContractStatus::Open);
            assert_eq!(reason, "Client delayed input");
        }
        other => panic!("unexpected payload {:?}", other),
    }
}

#[test]
fn override_to_completed_is_gated_too() {
    let (state, id) = with_contract("Test Task", None, "John", 0.9);
    let state = apply_ok(&state, escalate(&id, false));
    let attempt = Command::UpdateContractStatus {
        id: id.clone(),
        status: ContractStatus::Completed,
        reason: Some("done".to_string()),
        is_auto: false,
    };
    assert!(matches!(
        apply(&state, attempt),
        Outcome::Rejected(RejectCause::JustificationRequired { .. })
    ));
}

#[test]
fn proof_completion_bypasses_override_gate() {
    // System-initiated completion via proof needs no justification.
    let (state, id) = with_contract("Test Task", None, "John", 0.9);
    let state = apply_ok(&state, escalate(&id, false));
    let state = apply_ok(
        &state,
        Command::AddProof {
            id: id.clone(),
            proof: "evidence".to_string(),
        },
    );
    assert_eq!(state.contract(&id).unwrap().status, ContractStatus::Completed);
}

#[test]
fn safe_harbor_suppresses_low_risk_auto_escalation() {
    let (state, id) = with_contract("Test Task", None, "John", 0.9);
    let events = state.audit_log.len();

    match apply(&state, escalate(&id, true)) {
        Outcome::Rejected(RejectCause::SafeHarbor { prediction, .. }) => {
            assert_eq!(
                prediction.risk_level,
                covenant::plugins::risk::RiskLevel::LOW
            );
        }
        other => panic!("expected SafeHarbor, got {:?}", other),
    }
    assert_eq!(state.contract(&id).unwrap().status, ContractStatus::Open);
    assert_eq!(state.audit_log.len(), events);
}

#[test]
fn medium_risk_auto_escalation_goes_through() {
    // Borderline trust alone puts the prediction at MEDIUM, which is
    // escalation-eligible even though is_high_risk is false.
    let (state, id) = with_contract("Test Task", Some("Tomorrow"), "Bob", 0.6);
    let state = apply_ok(&state, escalate(&id, true));
    assert_eq!(state.contract(&id).unwrap().status, ContractStatus::Escalated);
}

#[test]
fn high_risk_auto_escalation_goes_through() {
    let (state, id) = with_contract("Test Task", Some("Tomorrow"), "Carl", 0.4);
    let state = apply_ok(&state, escalate(&id, true));
    assert_eq!(state.contract(&id).unwrap().status, ContractStatus::Escalated);
}

#[test]
fn unresolved_owner_defaults_to_escalatable_uncertainty() {
    let state = apply_ok(
        &fresh(),
        Command::CreateContract {
            decision_id: None,
            title: "Test Task".to_string(),
            owner: None,
            deadline: None,
            proof_requirement: String::new(),
            declared_risk: None,
        },
    );
    let id = state.contracts[0].id.clone();
    let state = apply_ok(&state, escalate(&id, true));
    assert_eq!(state.contract(&id).unwrap().status, ContractStatus::Escalated);
}

#[test]
fn disabled_predictions_lift_the_gate() {
    let (state, id) = with_contract("Test Task", None, "John", 0.9);
    let state = apply_ok(
        &state,
        Command::ToggleSystemConfig {
            key: ConfigKey::DisablePredictions,
        },
    );
    let state = apply_ok(&state, escalate(&id, true));
    assert_eq!(state.contract(&id).unwrap().status, ContractStatus::Escalated);
}

#[test]
fn disabled_auto_escalation_rejects_even_high_risk() {
    let (state, id) = with_contract("Test Task", Some("Tomorrow"), "Carl", 0.4);
    let state = apply_ok(
        &state,
        Command::ToggleSystemConfig {
            key: ConfigKey::DisableAutoEscalation,
        },
    );
    assert!(matches!(
        apply(&state, escalate(&id, true)),
        Outcome::Rejected(RejectCause::AutoEscalationDisabled)
    ));
}

#[test]
fn advisory_mode_passes_auto_escalations_ungated() {
    let (mut state, id) = with_contract("Test Task", None, "John", 0.9);
    state.pilot_mode = PilotMode::Advisory;
    let state = apply_ok(&state, escalate(&id, true));
    assert_eq!(state.contract(&id).unwrap().status, ContractStatus::Escalated);
}

#[test]
fn read_only_mode_blocks_everything_but_toggle_and_export() {
    let state = apply_ok(
        &fresh(),
        Command::ToggleSystemConfig {
            key: ConfigKey::ReadOnlyMode,
        },
    );
    let events = state.audit_log.len();

    let blocked = vec![
        Command::AddDecisions { records: vec![] },
        Command::CreateContract {
            decision_id: None,
            title: "Test Task".to_string(),
            owner: None,
            deadline: None,
            proof_requirement: String::new(),
            declared_risk: None,
        },
        Command::ResetSystem,
        Command::SetBaselineMetrics {
            metrics: BaselineMetrics::default(),
        },
    ];
    for command in blocked {
        assert!(matches!(
            apply(&state, command),
            Outcome::Rejected(RejectCause::ReadOnly)
        ));
    }
    assert_eq!(state.audit_log.len(), events);

    // The two recovery surfaces stay open.
    let state = apply_ok(&state, Command::ExportData);
    let state = apply_ok(
        &state,
        Command::ToggleSystemConfig {
            key: ConfigKey::ReadOnlyMode,
        },
    );
    assert!(!state.system_config.read_only_mode);
}

#[test]
fn privileged_commands_require_admin() {
    let mut state = fresh();
    state.current_actor = actor(Role::Operator);
    let commands = vec![
        Command::ToggleSystemConfig {
            key: ConfigKey::EnableNudges,
        },
        Command::SetBaselineMetrics {
            metrics: BaselineMetrics::default(),
        },
        Command::ResetSystem,
    ];

    for command in commands {
        match apply(&state, command) {
            Outcome::Rejected(RejectCause::NotAdmin { role }) => {
                assert_eq!(role, Role::Operator);
            }
            other => panic!("expected NotAdmin, got {:?}", other),
        }
    }
    // Unauthorized attempts leave no audit trace.
    assert!(state.audit_log.is_empty());
}

#[test]
fn non_admins_still_run_the_execution_flow() {
    let mut state = fresh();
    state.current_actor = actor(Role::Operator);
    let state = apply_ok(
        &state,
        Command::CreateContract {
            decision_id: None,
            title: "Test Task".to_string(),
            owner: Some("Dana".to_string()),
            deadline: None,
            proof_requirement: String::new(),
            declared_risk: None,
        },
    );
    assert_eq!(state.contracts.len(), 1);
}
