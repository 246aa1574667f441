//! Pure state transitions of the category workflow.
//!
//! Every asynchronous operation is split into a begin action, which claims the
//! busy guard and may return an [`Effect`] for the caller to run, and a settle
//! action, which releases the guard and writes the outcome in one step.
//! `Reset` is the one action accepted while busy: it abandons the in-flight
//! operation, whose late settle is then rejected as unexpected.

use shared::domain::{SlotId, UnifiedRecord};

use crate::{
    error::WorkflowError,
    state::{Operation, SourceFile, Stage, Step, UploadSlot, WorkflowState},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetCategoryName(String),
    AdvanceToUpload,
    BeginIntake(SlotId),
    IntakeSucceeded { slot: SlotId, upload: UploadSlot },
    IntakeFailed(SlotId),
    ClearFile(SlotId),
    BeginMerge,
    MergeSucceeded(Vec<UnifiedRecord>),
    MergeFailed,
    BeginPublish,
    PublishSucceeded,
    PublishFailed,
    Reset,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::SetCategoryName(_) => "set_category_name",
            Action::AdvanceToUpload => "advance_to_upload",
            Action::BeginIntake(_) => "select_file",
            Action::IntakeSucceeded { .. } | Action::IntakeFailed(_) => "settle_intake",
            Action::ClearFile(_) => "clear_file",
            Action::BeginMerge => "invoke_merge",
            Action::MergeSucceeded(_) | Action::MergeFailed => "settle_merge",
            Action::BeginPublish => "publish_category",
            Action::PublishSucceeded | Action::PublishFailed => "settle_publish",
            Action::Reset => "reset",
        }
    }

    fn settles(&self) -> Option<Operation> {
        match self {
            Action::IntakeSucceeded { slot, .. } | Action::IntakeFailed(slot) => {
                Some(Operation::Intake(*slot))
            }
            Action::MergeSucceeded(_) | Action::MergeFailed => Some(Operation::Merge),
            Action::PublishSucceeded | Action::PublishFailed => Some(Operation::Publish),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    pub category_name: String,
    pub file_a: SourceFile,
    pub file_b: SourceFile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub category_name: String,
    pub records: Vec<UnifiedRecord>,
}

/// Work the caller must perform after a begin action was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Merge(MergeRequest),
    Publish(PublishRequest),
}

fn ensure_idle(state: &WorkflowState) -> Result<(), WorkflowError> {
    match state.in_flight {
        Some(operation) => Err(WorkflowError::Busy(operation)),
        None => Ok(()),
    }
}

/// `BeginMerge` with its request returned directly.
pub fn begin_merge(state: &mut WorkflowState) -> Result<MergeRequest, WorkflowError> {
    ensure_idle(state)?;
    let step = state.step();
    if step != Step::Upload {
        return Err(WorkflowError::InvalidStep {
            action: Action::BeginMerge.name(),
            step,
        });
    }
    if state.category_name.is_empty() {
        return Err(WorkflowError::EmptyCategoryName);
    }
    let (Some(a), Some(b)) = (ready(&state.slot_a), ready(&state.slot_b)) else {
        return Err(WorkflowError::SlotsNotReady {
            missing: state.missing_slots(),
        });
    };
    let request = MergeRequest {
        category_name: state.category_name.clone(),
        file_a: SourceFile::from_slot(SlotId::A, a),
        file_b: SourceFile::from_slot(SlotId::B, b),
    };
    state.stage = Stage::Merging;
    state.in_flight = Some(Operation::Merge);
    Ok(request)
}

/// `BeginPublish` with its request returned directly.
pub fn begin_publish(state: &mut WorkflowState) -> Result<PublishRequest, WorkflowError> {
    ensure_idle(state)?;
    let Stage::Preview { records } = &state.stage else {
        return Err(WorkflowError::InvalidStep {
            action: Action::BeginPublish.name(),
            step: state.step(),
        });
    };
    let request = PublishRequest {
        category_name: state.category_name.clone(),
        records: records.clone(),
    };
    state.in_flight = Some(Operation::Publish);
    Ok(request)
}

/// Applies `action` to `state`. A rejected action leaves `state` untouched.
pub fn reduce(state: &mut WorkflowState, action: Action) -> Result<Effect, WorkflowError> {
    if let Some(settled) = action.settles() {
        if state.in_flight != Some(settled) {
            return Err(WorkflowError::UnexpectedCompletion {
                settled,
                in_flight: state.in_flight,
            });
        }
        state.in_flight = None;
    } else if !matches!(action, Action::Reset) {
        ensure_idle(state)?;
    }

    let step = state.step();
    let name = action.name();
    let require = |expected: Step| {
        if step == expected {
            Ok(())
        } else {
            Err(WorkflowError::InvalidStep { action: name, step })
        }
    };

    match action {
        Action::SetCategoryName(value) => {
            require(Step::Setup)?;
            state.category_name = value.trim().to_string();
            Ok(Effect::None)
        }
        Action::AdvanceToUpload => {
            require(Step::Setup)?;
            if state.category_name.is_empty() {
                return Err(WorkflowError::EmptyCategoryName);
            }
            state.stage = Stage::Upload;
            Ok(Effect::None)
        }
        Action::BeginIntake(slot) => {
            require(Step::Upload)?;
            state.in_flight = Some(Operation::Intake(slot));
            Ok(Effect::None)
        }
        Action::IntakeSucceeded { slot, upload } => {
            *state.slot_mut(slot) = Some(upload);
            Ok(Effect::None)
        }
        Action::IntakeFailed(slot) => {
            *state.slot_mut(slot) = None;
            Ok(Effect::None)
        }
        Action::ClearFile(slot) => {
            require(Step::Upload)?;
            *state.slot_mut(slot) = None;
            Ok(Effect::None)
        }
        Action::BeginMerge => begin_merge(state).map(Effect::Merge),
        Action::MergeSucceeded(records) => {
            state.stage = Stage::Preview { records };
            Ok(Effect::None)
        }
        Action::MergeFailed => {
            // Slots and category name survive so the merge can be retried as is.
            state.stage = Stage::Upload;
            Ok(Effect::None)
        }
        Action::BeginPublish => begin_publish(state).map(Effect::Publish),
        Action::PublishSucceeded => {
            *state = WorkflowState::default();
            Ok(Effect::None)
        }
        Action::PublishFailed => Ok(Effect::None),
        Action::Reset => {
            *state = WorkflowState::default();
            Ok(Effect::None)
        }
    }
}

fn ready(slot: &Option<UploadSlot>) -> Option<&UploadSlot> {
    slot.as_ref().filter(|upload| upload.ready)
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
