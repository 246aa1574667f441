//! CSV rendering of a merge result.

use chrono::NaiveDate;
use shared::domain::UnifiedRecord;

use crate::{error::WorkflowError, state::WorkflowState};

pub const CSV_HEADER: &str = "Nombre Completo,Email Institucional,Categoría,Estado Plataforma A,Estado Plataforma B,Estado Unificación,Fecha Procesamiento";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
    pub rows: usize,
}

/// Renders the preview records of `state`. Never touches the state itself.
pub fn export_state(state: &WorkflowState, today: NaiveDate) -> Result<CsvExport, WorkflowError> {
    let Some(records) = state.records() else {
        return Err(WorkflowError::InvalidStep {
            action: "export_csv",
            step: state.step(),
        });
    };
    if records.is_empty() {
        return Err(WorkflowError::NoRecords);
    }
    Ok(CsvExport {
        filename: export_filename(state.category_name(), today),
        content: render_csv(state.category_name(), records, today),
        rows: records.len(),
    })
}

pub fn render_csv(category_name: &str, records: &[UnifiedRecord], today: NaiveDate) -> String {
    let processed_on = today.format("%-d/%-m/%Y").to_string();
    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(CSV_HEADER.to_string());
    lines.extend(records.iter().map(|record| {
        [
            record.full_name.as_str(),
            record.email.as_str(),
            category_name,
            record.platform_a.as_str(),
            record.platform_b.as_str(),
            record.status.as_str(),
            processed_on.as_str(),
        ]
        .iter()
        .map(|field| quote(field))
        .collect::<Vec<_>>()
        .join(",")
    }));
    lines.join("\n")
}

/// `Software 2024` on 2024-03-05 becomes `software_2024_estudiantes_2024-03-05.csv`.
pub fn export_filename(category_name: &str, today: NaiveDate) -> String {
    let stem = category_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase();
    format!("{stem}_estudiantes_{}.csv", today.format("%Y-%m-%d"))
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
#[path = "tests/export_tests.rs"]
mod tests;
