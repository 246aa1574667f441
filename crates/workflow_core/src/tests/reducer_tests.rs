use super::*;
use crate::intake::{derive_slot, RawFile};
use shared::domain::{RecordId, UnificationStatus};

fn upload(name: &str) -> UploadSlot {
    derive_slot(RawFile::new(name, "nombre,email\nAna,ana@e.edu\n")).expect("slot")
}

fn record(id: &str, status: UnificationStatus) -> UnifiedRecord {
    UnifiedRecord {
        id: RecordId(id.into()),
        full_name: format!("Estudiante {id}"),
        email: format!("e{id}@estudiante.edu"),
        course: None,
        platform_a: "Presente".into(),
        platform_b: "Activo".into(),
        status,
    }
}

fn upload_step(name: &str) -> WorkflowState {
    let mut state = WorkflowState::default();
    reduce(&mut state, Action::SetCategoryName(name.into())).expect("name");
    reduce(&mut state, Action::AdvanceToUpload).expect("advance");
    state
}

fn with_slot(state: &mut WorkflowState, slot: SlotId) {
    reduce(state, Action::BeginIntake(slot)).expect("begin intake");
    reduce(
        state,
        Action::IntakeSucceeded {
            slot,
            upload: upload(&format!("plataforma_{slot}.csv")),
        },
    )
    .expect("settle intake");
}

fn merge_ready(name: &str) -> WorkflowState {
    let mut state = upload_step(name);
    with_slot(&mut state, SlotId::A);
    with_slot(&mut state, SlotId::B);
    state
}

fn preview(records: Vec<UnifiedRecord>) -> WorkflowState {
    let mut state = merge_ready("Software 2024");
    reduce(&mut state, Action::BeginMerge).expect("begin merge");
    reduce(&mut state, Action::MergeSucceeded(records)).expect("settle merge");
    state
}

#[test]
fn empty_name_blocks_upload_step() {
    let mut state = WorkflowState::default();
    reduce(&mut state, Action::SetCategoryName("".into())).expect("set");
    let err = reduce(&mut state, Action::AdvanceToUpload).expect_err("rejected");
    assert!(matches!(err, WorkflowError::EmptyCategoryName));
    assert_eq!(state.step(), Step::Setup);

    reduce(&mut state, Action::SetCategoryName("   ".into())).expect("set");
    assert!(reduce(&mut state, Action::AdvanceToUpload).is_err());

    reduce(&mut state, Action::SetCategoryName("  Matemáticas ".into())).expect("set");
    reduce(&mut state, Action::AdvanceToUpload).expect("advance");
    assert_eq!(state.step(), Step::Upload);
    assert_eq!(state.category_name(), "Matemáticas");
}

#[test]
fn category_name_is_frozen_after_setup() {
    let mut state = upload_step("Física");
    let err = reduce(&mut state, Action::SetCategoryName("Química".into())).expect_err("frozen");
    assert!(matches!(
        err,
        WorkflowError::InvalidStep {
            step: Step::Upload,
            ..
        }
    ));
    assert_eq!(state.category_name(), "Física");
}

#[test]
fn files_cannot_be_selected_during_setup() {
    let mut state = WorkflowState::default();
    let err = reduce(&mut state, Action::BeginIntake(SlotId::A)).expect_err("setup");
    assert!(matches!(err, WorkflowError::InvalidStep { .. }));
    assert!(!state.is_busy());
}

#[test]
fn intake_holds_busy_until_settled() {
    let mut state = upload_step("Historia");
    reduce(&mut state, Action::BeginIntake(SlotId::A)).expect("begin");
    assert_eq!(state.in_flight(), Some(Operation::Intake(SlotId::A)));

    let before = state.clone();
    let err = reduce(&mut state, Action::BeginIntake(SlotId::B)).expect_err("busy");
    assert!(matches!(err, WorkflowError::Busy(Operation::Intake(SlotId::A))));
    assert!(reduce(&mut state, Action::ClearFile(SlotId::A)).is_err());
    assert_eq!(state, before);

    reduce(
        &mut state,
        Action::IntakeSucceeded {
            slot: SlotId::A,
            upload: upload("a.csv"),
        },
    )
    .expect("settle");
    assert!(!state.is_busy());
    assert!(state.slot(SlotId::A).is_some());
}

#[test]
fn both_slots_ready_does_not_leave_upload() {
    let state = merge_ready("Arte");
    assert_eq!(state.step(), Step::Upload);
    assert!(state.is_merge_ready());
    assert_eq!(state.progress_percent(), 50);
    assert!(state.records().is_none());
}

#[test]
fn failed_intake_leaves_slot_empty() {
    let mut state = upload_step("Arte");
    with_slot(&mut state, SlotId::B);

    reduce(&mut state, Action::BeginIntake(SlotId::B)).expect("reselect");
    reduce(&mut state, Action::IntakeFailed(SlotId::B)).expect("settle");
    assert!(state.slot(SlotId::B).is_none());
    assert_eq!(state.step(), Step::Upload);
    assert!(!state.is_busy());
}

#[test]
fn settle_for_other_operation_is_rejected() {
    let mut state = upload_step("Arte");
    reduce(&mut state, Action::BeginIntake(SlotId::A)).expect("begin");
    let before = state.clone();

    let err = reduce(&mut state, Action::IntakeFailed(SlotId::B)).expect_err("wrong slot");
    assert!(matches!(err, WorkflowError::UnexpectedCompletion { .. }));
    assert!(reduce(&mut state, Action::MergeFailed).is_err());
    assert_eq!(state, before);
}

#[test]
fn merge_requires_both_slots() {
    let mut state = upload_step("Biología");
    with_slot(&mut state, SlotId::A);
    let before = state.clone();

    let err = reduce(&mut state, Action::BeginMerge).expect_err("slot b missing");
    match err {
        WorkflowError::SlotsNotReady { missing } => assert_eq!(missing, vec![SlotId::B]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(state, before);
    assert_eq!(state.step(), Step::Upload);
}

#[test]
fn begin_merge_hands_slots_in_order() {
    let mut state = merge_ready("Software 2024");
    let effect = reduce(&mut state, Action::BeginMerge).expect("begin");
    match effect {
        Effect::Merge(MergeRequest {
            category_name,
            file_a,
            file_b,
        }) => {
            assert_eq!(category_name, "Software 2024");
            assert_eq!(file_a.slot, SlotId::A);
            assert_eq!(file_a.name, "plataforma_A.csv");
            assert_eq!(file_b.slot, SlotId::B);
        }
        other => panic!("unexpected effect: {other:?}"),
    }
    assert_eq!(state.step(), Step::Merging);
    assert_eq!(state.progress_percent(), 75);
    assert!(state.records().is_none());
    assert_eq!(state.in_flight(), Some(Operation::Merge));
}

#[test]
fn failed_merge_returns_to_upload_with_inputs_intact() {
    let mut state = merge_ready("Software 2024");
    let slot_a = state.slot(SlotId::A).cloned();
    let slot_b = state.slot(SlotId::B).cloned();

    reduce(&mut state, Action::BeginMerge).expect("begin");
    reduce(&mut state, Action::MergeFailed).expect("settle");

    assert_eq!(state.step(), Step::Upload);
    assert_eq!(state.category_name(), "Software 2024");
    assert_eq!(state.slot(SlotId::A).cloned(), slot_a);
    assert_eq!(state.slot(SlotId::B).cloned(), slot_b);
    assert!(!state.is_busy());
    assert!(state.is_merge_ready());
}

#[test]
fn successful_merge_enters_preview_with_stats() {
    let state = preview(vec![
        record("1", UnificationStatus::Unified),
        record("2", UnificationStatus::Pending),
        record("3", UnificationStatus::Conflict),
    ]);
    assert_eq!(state.step(), Step::Preview);
    assert_eq!(state.progress_percent(), 100);

    let stats = state.stats().expect("stats");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.unified, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.conflict, 1);
}

#[test]
fn clear_file_is_ignored_after_merge() {
    let mut state = preview(vec![record("1", UnificationStatus::Unified)]);
    let before = state.clone();
    assert!(reduce(&mut state, Action::ClearFile(SlotId::A)).is_err());
    assert_eq!(state, before);
}

#[test]
fn publish_success_restores_initial_state() {
    let mut state = preview(vec![record("1", UnificationStatus::Unified)]);
    let effect = reduce(&mut state, Action::BeginPublish).expect("begin");
    assert!(matches!(effect, Effect::Publish(PublishRequest { ref records, .. }) if records.len() == 1));
    assert!(state.is_busy());
    assert_eq!(state.step(), Step::Preview);

    reduce(&mut state, Action::PublishSucceeded).expect("settle");
    assert!(state.is_initial());
    assert_eq!(state, WorkflowState::default());
}

#[test]
fn publish_failure_keeps_preview() {
    let mut state = preview(vec![record("1", UnificationStatus::Pending)]);
    let before = state.clone();
    reduce(&mut state, Action::BeginPublish).expect("begin");
    reduce(&mut state, Action::PublishFailed).expect("settle");
    assert_eq!(state, before);
}

#[test]
fn publish_outside_preview_is_rejected() {
    let mut state = merge_ready("Arte");
    assert!(matches!(
        reduce(&mut state, Action::BeginPublish),
        Err(WorkflowError::InvalidStep { .. })
    ));
}

#[test]
fn reset_from_any_idle_step() {
    let mut state = merge_ready("Arte");
    reduce(&mut state, Action::Reset).expect("reset");
    assert!(state.is_initial());
    assert_eq!(state.progress_percent(), 25);
}

#[test]
fn reset_abandons_in_flight_operation() {
    let mut state = merge_ready("Arte");
    reduce(&mut state, Action::BeginMerge).expect("begin");
    assert!(state.is_busy());

    reduce(&mut state, Action::Reset).expect("reset while busy");
    assert!(state.is_initial());

    let err = reduce(&mut state, Action::MergeSucceeded(Vec::new())).expect_err("late settle");
    assert!(matches!(
        err,
        WorkflowError::UnexpectedCompletion {
            settled: Operation::Merge,
            in_flight: None
        }
    ));
    assert!(state.is_initial());
}

#[test]
fn begin_functions_return_typed_requests() {
    let mut state = merge_ready("Software 2024");
    let request = begin_merge(&mut state).expect("begin merge");
    assert_eq!(request.category_name, "Software 2024");
    assert_eq!(request.file_a.slot, SlotId::A);
    assert_eq!(request.file_b.slot, SlotId::B);
    assert!(matches!(
        begin_merge(&mut state),
        Err(WorkflowError::Busy(Operation::Merge))
    ));

    reduce(
        &mut state,
        Action::MergeSucceeded(vec![record("1", UnificationStatus::Unified)]),
    )
    .expect("settle");
    let request = begin_publish(&mut state).expect("begin publish");
    assert_eq!(request.category_name, "Software 2024");
    assert_eq!(request.records.len(), 1);
    assert_eq!(state.in_flight(), Some(Operation::Publish));
}

#[test]
fn begin_publish_outside_preview_leaves_state_alone() {
    let mut state = merge_ready("Arte");
    let before = state.clone();
    assert!(matches!(
        begin_publish(&mut state),
        Err(WorkflowError::InvalidStep { step: Step::Upload, .. })
    ));
    assert_eq!(state, before);
}
