//! Upload → merge → review workflow for building a student category out of
//! two platform exports.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{domain::UnifiedRecord, protocol::PublishReceipt};

mod controller;
pub mod error;
pub mod export;
pub mod intake;
pub mod reducer;
pub mod state;
pub mod transport;

pub use controller::WorkflowController;
pub use error::WorkflowError;
pub use export::CsvExport;
pub use intake::{IntakeError, RawFile};
pub use state::{Operation, SourceFile, Step, UploadSlot, WorkflowState};
pub use transport::{HttpCategoryPublisher, HttpMergeService};

/// Unifies the two platform exports into one record list.
///
/// Implementations own matching and parsing; the workflow never interprets
/// error subtypes beyond "failed".
#[async_trait]
pub trait MergeService: Send + Sync {
    async fn merge(
        &self,
        category_name: &str,
        file_a: &SourceFile,
        file_b: &SourceFile,
    ) -> Result<Vec<UnifiedRecord>>;
}

/// Materializes a category in the external mail/calendar system.
#[async_trait]
pub trait CategoryPublisher: Send + Sync {
    async fn publish(
        &self,
        category_name: &str,
        records: &[UnifiedRecord],
    ) -> Result<PublishReceipt>;
}

pub struct MissingMergeService;

#[async_trait]
impl MergeService for MissingMergeService {
    async fn merge(
        &self,
        category_name: &str,
        _file_a: &SourceFile,
        _file_b: &SourceFile,
    ) -> Result<Vec<UnifiedRecord>> {
        Err(anyhow!(
            "merge service not configured; cannot merge category '{category_name}'"
        ))
    }
}

pub struct MissingCategoryPublisher;

#[async_trait]
impl CategoryPublisher for MissingCategoryPublisher {
    async fn publish(
        &self,
        category_name: &str,
        _records: &[UnifiedRecord],
    ) -> Result<PublishReceipt> {
        Err(anyhow!(
            "category publisher not configured; cannot publish '{category_name}'"
        ))
    }
}
