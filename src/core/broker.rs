//! Single-writer hosting layer for the governor.
//!
//! The broker owns the canonical state. Commands serialize through an
//! in-process lock: one command is fully applied (or rejected) before
//! the next is examined, and reads are served from the latest committed
//! snapshot. This is the only place a snapshot is replaced.

use crate::core::governor::{self, Command, Outcome};
use crate::core::state::ExecState;
use std::sync::Mutex;

pub struct StateBroker {
    state: Mutex<ExecState>,
}

impl StateBroker {
    pub fn new(initial: ExecState) -> Self {
        StateBroker {
            state: Mutex::new(initial),
        }
    }

    /// Apply one command against the canonical state. The replacement
    /// snapshot is committed only on acceptance; rejections leave the
    /// canonical state untouched.
    pub fn submit(&self, command: Command) -> Outcome {
        let mut guard = self.state.lock().unwrap();
        let outcome = governor::apply(&guard, command);
        if let Outcome::Applied(next) = &outcome {
            *guard = (**next).clone();
        }
        outcome
    }

    /// Latest committed snapshot.
    pub fn snapshot(&self) -> ExecState {
        self.state.lock().unwrap().clone()
    }
}

pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "broker",
        "version": "0.1.0",
        "description": "Single-writer command serialization over the canonical state",
        "commands": [
            { "name": "submit", "description": "Apply one command", "parameters": ["command"] },
            { "name": "snapshot", "description": "Read the latest committed state" }
        ],
        "storage": ["in-memory only; process lifetime"]
    })
}
