use std::{path::Path, sync::Arc};

use chrono::{Local, NaiveDate};
use shared::{
    domain::{RecordStats, SlotId},
    protocol::PublishReceipt,
};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::{
    error::WorkflowError,
    export::{export_state, CsvExport},
    intake::{derive_slot, IntakeError, RawFile},
    reducer::{begin_merge, begin_publish, reduce, Action, MergeRequest, PublishRequest},
    state::{Operation, UploadSlot, WorkflowState},
    CategoryPublisher, MergeService,
};

/// Drives the category workflow against its two collaborators.
///
/// The state lock is never held across a collaborator call. Each operation
/// claims the busy guard under the lock, awaits its collaborator unlocked, and
/// settles under the lock again, so a snapshot is always either before or
/// after a whole transition.
pub struct WorkflowController {
    merge_service: Arc<dyn MergeService>,
    publisher: Arc<dyn CategoryPublisher>,
    state: Mutex<Tracked>,
}

#[derive(Default)]
struct Tracked {
    workflow: WorkflowState,
    /// Bumped by every accepted begin action and by reset. A settle only
    /// lands if the ticket it began with is still current.
    ticket: u64,
}

impl WorkflowController {
    pub fn new(merge_service: Arc<dyn MergeService>, publisher: Arc<dyn CategoryPublisher>) -> Self {
        Self {
            merge_service,
            publisher,
            state: Mutex::new(Tracked::default()),
        }
    }

    async fn dispatch(&self, action: Action) -> Result<(), WorkflowError> {
        let mut tracked = self.state.lock().await;
        reduce(&mut tracked.workflow, action).map(|_| ())
    }

    async fn begin<T>(
        &self,
        begin: impl FnOnce(&mut WorkflowState) -> Result<T, WorkflowError>,
    ) -> Result<(T, u64), WorkflowError> {
        let mut tracked = self.state.lock().await;
        let started = begin(&mut tracked.workflow)?;
        tracked.ticket += 1;
        Ok((started, tracked.ticket))
    }

    /// Applies a settle action if `ticket` is still current and returns the
    /// held lock so the caller can log against the settled state.
    async fn settle(
        &self,
        ticket: u64,
        operation: Operation,
        action: Action,
    ) -> Result<MutexGuard<'_, Tracked>, WorkflowError> {
        let mut tracked = self.state.lock().await;
        if tracked.ticket != ticket {
            warn!(%operation, "operation was abandoned by a reset; dropping its outcome");
            return Err(WorkflowError::Abandoned(operation));
        }
        reduce(&mut tracked.workflow, action)?;
        Ok(tracked)
    }

    pub async fn snapshot(&self) -> WorkflowState {
        self.state.lock().await.workflow.clone()
    }

    pub async fn progress_percent(&self) -> u8 {
        self.state.lock().await.workflow.progress_percent()
    }

    pub async fn set_category_name(&self, name: &str) -> Result<(), WorkflowError> {
        self.dispatch(Action::SetCategoryName(name.to_string())).await
    }

    pub async fn advance_to_upload(&self) -> Result<(), WorkflowError> {
        self.dispatch(Action::AdvanceToUpload).await?;
        info!("category named; waiting for source files");
        Ok(())
    }

    pub async fn select_file(&self, slot: SlotId, raw: RawFile) -> Result<UploadSlot, WorkflowError> {
        let ticket = self.begin_intake(slot).await?;
        self.settle_intake(ticket, slot, derive_slot(raw)).await
    }

    /// Like [`Self::select_file`], reading the payload from disk while busy.
    pub async fn select_path(&self, slot: SlotId, path: &Path) -> Result<UploadSlot, WorkflowError> {
        let ticket = self.begin_intake(slot).await?;
        let derived = RawFile::read(path).await.and_then(derive_slot);
        self.settle_intake(ticket, slot, derived).await
    }

    async fn begin_intake(&self, slot: SlotId) -> Result<u64, WorkflowError> {
        let (_, ticket) = self
            .begin(|state| reduce(state, Action::BeginIntake(slot)))
            .await?;
        Ok(ticket)
    }

    async fn settle_intake(
        &self,
        ticket: u64,
        slot: SlotId,
        derived: Result<UploadSlot, IntakeError>,
    ) -> Result<UploadSlot, WorkflowError> {
        let operation = Operation::Intake(slot);
        match derived {
            Ok(upload) => {
                let tracked = self
                    .settle(
                        ticket,
                        operation,
                        Action::IntakeSucceeded {
                            slot,
                            upload: upload.clone(),
                        },
                    )
                    .await?;
                info!(
                    %slot,
                    file = %upload.name,
                    size = %upload.size_label,
                    estimated_records = upload.estimated_records,
                    merge_ready = tracked.workflow.is_merge_ready(),
                    "source file accepted"
                );
                Ok(upload)
            }
            Err(source) => {
                drop(self.settle(ticket, operation, Action::IntakeFailed(slot)).await?);
                warn!(%slot, error = %source, "source file rejected");
                Err(WorkflowError::Intake { slot, source })
            }
        }
    }

    pub async fn clear_file(&self, slot: SlotId) -> Result<(), WorkflowError> {
        self.dispatch(Action::ClearFile(slot)).await?;
        info!(%slot, "source file cleared");
        Ok(())
    }

    pub async fn invoke_merge(&self) -> Result<RecordStats, WorkflowError> {
        let (request, ticket) = self.begin(begin_merge).await?;
        let MergeRequest {
            category_name,
            file_a,
            file_b,
        } = request;

        info!(%category_name, file_a = %file_a.name, file_b = %file_b.name, "merging source files");
        let outcome = self
            .merge_service
            .merge(&category_name, &file_a, &file_b)
            .await;

        match outcome {
            Ok(records) => {
                let stats = RecordStats::from_records(&records);
                drop(self.settle(ticket, Operation::Merge, Action::MergeSucceeded(records)).await?);
                if stats.total == 0 {
                    info!(%category_name, "merge finished without records");
                } else {
                    info!(
                        %category_name,
                        total = stats.total,
                        unified = stats.unified,
                        pending = stats.pending,
                        conflict = stats.conflict,
                        "merge finished"
                    );
                }
                Ok(stats)
            }
            Err(err) => {
                drop(self.settle(ticket, Operation::Merge, Action::MergeFailed).await?);
                let message = format!("{err:#}");
                warn!(%category_name, error = %message, "merge failed; back to upload");
                Err(WorkflowError::Merge(message))
            }
        }
    }

    pub async fn export_csv(&self) -> Result<CsvExport, WorkflowError> {
        self.export_csv_on(Local::now().date_naive()).await
    }

    pub async fn export_csv_on(&self, today: NaiveDate) -> Result<CsvExport, WorkflowError> {
        let tracked = self.state.lock().await;
        let export = export_state(&tracked.workflow, today)?;
        info!(
            category_name = %tracked.workflow.category_name(),
            filename = %export.filename,
            rows = export.rows,
            "csv exported"
        );
        Ok(export)
    }

    pub async fn publish_category(&self) -> Result<PublishReceipt, WorkflowError> {
        let (request, ticket) = self.begin(begin_publish).await?;
        let PublishRequest {
            category_name,
            records,
        } = request;

        info!(%category_name, records = records.len(), "publishing category");
        let outcome = self.publisher.publish(&category_name, &records).await;

        match outcome {
            Ok(receipt) => {
                drop(self.settle(ticket, Operation::Publish, Action::PublishSucceeded).await?);
                info!(%category_name, receipt = %receipt.message, "category published; workflow reset");
                Ok(receipt)
            }
            Err(err) => {
                drop(self.settle(ticket, Operation::Publish, Action::PublishFailed).await?);
                let message = format!("{err:#}");
                warn!(%category_name, error = %message, "category publish failed");
                Err(WorkflowError::Publish(message))
            }
        }
    }

    /// Accepted even while busy. The abandoned operation's outcome is dropped
    /// when it arrives.
    pub async fn reset(&self) -> Result<(), WorkflowError> {
        let mut tracked = self.state.lock().await;
        let abandoned = tracked.workflow.in_flight();
        reduce(&mut tracked.workflow, Action::Reset)?;
        tracked.ticket += 1;
        match abandoned {
            Some(operation) => warn!(%operation, "workflow reset while busy"),
            None => info!("workflow reset"),
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
