use super::*;
use crate::{
    intake::{derive_slot, RawFile},
    reducer::{reduce, Action},
};
use shared::domain::{RecordId, SlotId, UnificationStatus};

fn ana() -> UnifiedRecord {
    UnifiedRecord {
        id: RecordId("1".into()),
        full_name: "Ana García López".into(),
        email: "ana.garcia@estudiante.edu".into(),
        course: Some("Ingeniería de Software".into()),
        platform_a: "Presente".into(),
        platform_b: "Activo".into(),
        status: UnificationStatus::Unified,
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 5).expect("date")
}

fn preview_state(category: &str, records: Vec<UnifiedRecord>) -> WorkflowState {
    let mut state = WorkflowState::default();
    reduce(&mut state, Action::SetCategoryName(category.into())).expect("name");
    reduce(&mut state, Action::AdvanceToUpload).expect("advance");
    for slot in SlotId::ALL {
        reduce(&mut state, Action::BeginIntake(slot)).expect("begin intake");
        let upload = derive_slot(RawFile::new("lista.csv", "h\nr\n")).expect("slot");
        reduce(&mut state, Action::IntakeSucceeded { slot, upload }).expect("intake");
    }
    reduce(&mut state, Action::BeginMerge).expect("begin merge");
    reduce(&mut state, Action::MergeSucceeded(records)).expect("merge");
    state
}

#[test]
fn renders_header_and_quoted_row() {
    let state = preview_state("Software 2024", vec![ana()]);
    let export = export_state(&state, day()).expect("export");

    let lines: Vec<&str> = export.content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(
        lines[1],
        "\"Ana García López\",\"ana.garcia@estudiante.edu\",\"Software 2024\",\"Presente\",\"Activo\",\"Unificado\",\"5/3/2024\""
    );
    assert_eq!(export.rows, 1);
}

#[test]
fn filename_is_lowercase_with_underscores_and_iso_date() {
    assert_eq!(
        export_filename("Software 2024", day()),
        "software_2024_estudiantes_2024-03-05.csv"
    );
    assert_eq!(
        export_filename("Matemáticas   Avanzadas\t2024-1", day()),
        "matemáticas_avanzadas_2024-1_estudiantes_2024-03-05.csv"
    );
}

#[test]
fn embedded_quotes_are_doubled() {
    let mut record = ana();
    record.full_name = "Ana \"Anita\" García".into();
    let content = render_csv("Arte", &[record], day());
    assert!(content.contains("\"Ana \"\"Anita\"\" García\""));
}

#[test]
fn empty_result_is_reported_as_no_records() {
    let state = preview_state("Arte", Vec::new());
    assert!(matches!(
        export_state(&state, day()),
        Err(WorkflowError::NoRecords)
    ));
}

#[test]
fn export_outside_preview_is_rejected() {
    let state = WorkflowState::default();
    assert!(matches!(
        export_state(&state, day()),
        Err(WorkflowError::InvalidStep { .. })
    ));
}

#[test]
fn export_does_not_change_state() {
    let state = preview_state("Software 2024", vec![ana()]);
    let before = state.clone();
    export_state(&state, day()).expect("export");
    assert_eq!(state, before);
}
