use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::EvaluationStatus;

/// Intent applied to an evaluation's approval lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    SubmitForReview,
    Approve,
    Reject,
}

impl WorkflowAction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SubmitForReview => "submit for review",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    /// States the action may start from. A rejected evaluation is re-edited in place and
    /// then resubmitted, so submission accepts both editable states.
    pub const fn allowed_sources(self) -> &'static [EvaluationStatus] {
        match self {
            Self::SubmitForReview => &[EvaluationStatus::Draft, EvaluationStatus::Rejected],
            Self::Approve | Self::Reject => &[EvaluationStatus::PendingReview],
        }
    }

    pub const fn target(self) -> EvaluationStatus {
        match self {
            Self::SubmitForReview => EvaluationStatus::PendingReview,
            Self::Approve => EvaluationStatus::Confirmed,
            Self::Reject => EvaluationStatus::Rejected,
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Workflow violation raised when an intent does not fit the current state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error(
        "cannot {action} an evaluation in {current} status (requires {})",
        join_labels(.required)
    )]
    IllegalTransition {
        action: WorkflowAction,
        current: EvaluationStatus,
        required: &'static [EvaluationStatus],
    },
    #[error("evaluation in {current} status is locked for editing (requires draft or rejected)")]
    NotEditable { current: EvaluationStatus },
    #[error("rejecting an evaluation requires a reason")]
    MissingRejectionReason,
    #[error("weights total {total:.2}% instead of 100%; fix the item weights before submitting")]
    InconsistentWeights { total: f64 },
}

fn join_labels(statuses: &[EvaluationStatus]) -> String {
    statuses
        .iter()
        .map(|status| status.label())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Resolve the state an action leads to from `current`.
pub fn transition(
    current: EvaluationStatus,
    action: WorkflowAction,
) -> Result<EvaluationStatus, WorkflowError> {
    let required = action.allowed_sources();
    if required.contains(&current) {
        Ok(action.target())
    } else {
        Err(WorkflowError::IllegalTransition {
            action,
            current,
            required,
        })
    }
}

/// Guard used before any content edit (items, recorded score, grade).
pub fn ensure_editable(current: EvaluationStatus) -> Result<(), WorkflowError> {
    if current.is_editable() {
        Ok(())
    } else {
        Err(WorkflowError::NotEditable { current })
    }
}

/// Audit entry for a committed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub action: WorkflowAction,
    pub from: EvaluationStatus,
    pub to: EvaluationStatus,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub at: DateTime<Utc>,
}
