use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::audit::AuditId;
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    Idle,
    Aggregating,
    Scoring,
    Summarizing,
    Persisting,
    Done,
    Failed,
}

impl AnalysisState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Aggregating => "aggregating",
            Self::Scoring => "scoring",
            Self::Summarizing => "summarizing",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTransition {
    pub from: AnalysisState,
    pub to: AnalysisState,
    pub at: DateTime<Utc>,
}

/// Lifecycle of a single `analyze` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRun {
    pub audit_id: AuditId,
    pub state: AnalysisState,
    pub history: Vec<StateTransition>,
}

impl AnalysisRun {
    pub fn new(audit_id: AuditId) -> Self {
        Self { audit_id, state: AnalysisState::Idle, history: Vec::new() }
    }

    pub fn can_transition_to(&self, next: AnalysisState) -> bool {
        matches!(
            (self.state, next),
            (AnalysisState::Idle, AnalysisState::Aggregating)
                | (AnalysisState::Aggregating, AnalysisState::Scoring)
                | (AnalysisState::Scoring, AnalysisState::Summarizing)
                | (AnalysisState::Summarizing, AnalysisState::Persisting)
                | (AnalysisState::Persisting, AnalysisState::Done)
        ) || (next == AnalysisState::Failed && !self.state.is_terminal())
    }

    pub fn transition_to(&mut self, next: AnalysisState) -> Result<(), DomainError> {
        if !self.can_transition_to(next) {
            return Err(DomainError::InvalidRunTransition { from: self.state, to: next });
        }

        self.history.push(StateTransition { from: self.state, to: next, at: Utc::now() });
        self.state = next;
        Ok(())
    }

    /// States visited so far, starting with `Idle`.
    pub fn visited(&self) -> Vec<AnalysisState> {
        std::iter::once(AnalysisState::Idle)
            .chain(self.history.iter().map(|transition| transition.to))
            .collect()
    }
}
