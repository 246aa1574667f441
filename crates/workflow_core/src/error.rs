use shared::domain::SlotId;
use thiserror::Error;

use crate::{
    intake::IntakeError,
    state::{Operation, Step},
};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow is busy with {0}")]
    Busy(Operation),
    #[error("{action} is not available during the {step} step")]
    InvalidStep { action: &'static str, step: Step },
    #[error("category name must not be empty")]
    EmptyCategoryName,
    #[error("missing source file for slot(s) {}", format_slots(.missing))]
    SlotsNotReady { missing: Vec<SlotId> },
    #[error("no unified records to show")]
    NoRecords,
    #[error("completion for {settled} does not match in-flight operation {in_flight:?}")]
    UnexpectedCompletion {
        settled: Operation,
        in_flight: Option<Operation>,
    },
    #[error("{0} was abandoned by a reset before it settled")]
    Abandoned(Operation),
    #[error("failed to read source file for slot {slot}: {source}")]
    Intake {
        slot: SlotId,
        #[source]
        source: IntakeError,
    },
    #[error("merge failed: {0}")]
    Merge(String),
    #[error("category publish failed: {0}")]
    Publish(String),
}

fn format_slots(slots: &[SlotId]) -> String {
    slots
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl WorkflowError {
    /// Collaborator failures leave the workflow retryable; everything else is
    /// a rejected request that changed nothing.
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            WorkflowError::Intake { .. } | WorkflowError::Merge(_) | WorkflowError::Publish(_)
        )
    }
}
