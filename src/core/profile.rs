//! TOML launch profile: tenant, actor, seed roster, config overrides.
//!
//! The profile is the CLI's configuration surface. Everything in it has
//! a default except the tenant and the actor; a session without a
//! profile runs with an empty roster under the stock config.

use crate::core::error::CovenantError;
use crate::core::state::{Actor, Agent, ExecState, PilotMode, SystemConfig};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub tenant_id: String,
    #[serde(default)]
    pub mode: Option<PilotMode>,
    pub actor: Actor,
    #[serde(default)]
    pub agents: Vec<SeedAgent>,
    #[serde(default)]
    pub config: ConfigOverrides,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedAgent {
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_trust")]
    pub trust_score: f64,
    #[serde(default)]
    pub success_streak: u32,
}

fn default_role() -> String {
    "Unknown".to_string()
}

fn default_trust() -> f64 {
    crate::plugins::trust::SEED_TRUST
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub disable_predictions: Option<bool>,
    pub disable_auto_escalation: Option<bool>,
    pub read_only_mode: Option<bool>,
    pub enable_nudges: Option<bool>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self, CovenantError> {
        let text = std::fs::read_to_string(path)?;
        let profile: Profile = toml::from_str(&text)?;
        profile.validate()?;
        Ok(profile)
    }

    fn validate(&self) -> Result<(), CovenantError> {
        for agent in &self.agents {
            if !(0.0..=1.0).contains(&agent.trust_score) {
                return Err(CovenantError::ValidationError(format!(
                    "agent '{}': trust_score {} outside [0, 1]",
                    agent.name, agent.trust_score
                )));
            }
        }
        let mut names: Vec<&str> = self.agents.iter().map(|a| a.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.agents.len() {
            return Err(CovenantError::ValidationError(
                "duplicate agent names in roster".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_state(self) -> ExecState {
        let mut state = ExecState::new(self.tenant_id, self.actor);
        if let Some(mode) = self.mode {
            state.pilot_mode = mode;
        }
        state.agents = self
            .agents
            .into_iter()
            .map(|seed| Agent {
                name: seed.name,
                role: seed.role,
                trust_score: seed.trust_score,
                success_streak: seed.success_streak,
            })
            .collect();

        let defaults = SystemConfig::default();
        state.system_config = SystemConfig {
            disable_predictions: self
                .config
                .disable_predictions
                .unwrap_or(defaults.disable_predictions),
            disable_auto_escalation: self
                .config
                .disable_auto_escalation
                .unwrap_or(defaults.disable_auto_escalation),
            read_only_mode: self.config.read_only_mode.unwrap_or(defaults.read_only_mode),
            enable_nudges: self.config.enable_nudges.unwrap_or(defaults.enable_nudges),
        };
        state
    }
}
