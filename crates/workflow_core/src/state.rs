use std::{fmt, sync::Arc};

use shared::domain::{RecordStats, SlotId, UnifiedRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Setup,
    Upload,
    Merging,
    Preview,
}

impl Step {
    /// Display-only progress; never consulted for control flow.
    pub fn progress_percent(self) -> u8 {
        match self {
            Step::Setup => 25,
            Step::Upload => 50,
            Step::Merging => 75,
            Step::Preview => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Setup => "Configuración",
            Step::Upload => "Carga de archivos",
            Step::Merging => "Unificación",
            Step::Preview => "Resultado",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Setup => "setup",
            Step::Upload => "upload",
            Step::Merging => "merging",
            Step::Preview => "preview",
        };
        f.write_str(name)
    }
}

/// The asynchronous operation currently holding the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Intake(SlotId),
    Merge,
    Publish,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Intake(slot) => write!(f, "intake of slot {slot}"),
            Operation::Merge => f.write_str("merge"),
            Operation::Publish => f.write_str("publish"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Stage {
    Setup,
    Upload,
    Merging,
    Preview { records: Vec<UnifiedRecord> },
}

impl Stage {
    fn step(&self) -> Step {
        match self {
            Stage::Setup => Step::Setup,
            Stage::Upload => Step::Upload,
            Stage::Merging => Step::Merging,
            Stage::Preview { .. } => Step::Preview,
        }
    }
}

/// A source file accepted into one of the two slots.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadSlot {
    pub name: String,
    pub size_bytes: u64,
    pub size_label: String,
    /// Client-side guess for display; the merge service never sees it.
    pub estimated_records: usize,
    pub ready: bool,
    pub(crate) payload: Arc<[u8]>,
}

impl UploadSlot {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl fmt::Debug for UploadSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSlot")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .field("size_label", &self.size_label)
            .field("estimated_records", &self.estimated_records)
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

/// What the merge service receives for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub slot: SlotId,
    pub name: String,
    pub payload: Arc<[u8]>,
}

impl SourceFile {
    pub(crate) fn from_slot(slot: SlotId, upload: &UploadSlot) -> Self {
        Self {
            slot,
            name: upload.name.clone(),
            payload: Arc::clone(&upload.payload),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowState {
    pub(crate) category_name: String,
    pub(crate) slot_a: Option<UploadSlot>,
    pub(crate) slot_b: Option<UploadSlot>,
    pub(crate) stage: Stage,
    pub(crate) in_flight: Option<Operation>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            category_name: String::new(),
            slot_a: None,
            slot_b: None,
            stage: Stage::Setup,
            in_flight: None,
        }
    }
}

impl WorkflowState {
    pub fn step(&self) -> Step {
        self.stage.step()
    }

    pub fn category_name(&self) -> &str {
        &self.category_name
    }

    pub fn slot(&self, slot: SlotId) -> Option<&UploadSlot> {
        match slot {
            SlotId::A => self.slot_a.as_ref(),
            SlotId::B => self.slot_b.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: SlotId) -> &mut Option<UploadSlot> {
        match slot {
            SlotId::A => &mut self.slot_a,
            SlotId::B => &mut self.slot_b,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<Operation> {
        self.in_flight
    }

    /// Present exactly while the step is `Preview`.
    pub fn records(&self) -> Option<&[UnifiedRecord]> {
        match &self.stage {
            Stage::Preview { records } => Some(records),
            _ => None,
        }
    }

    pub fn stats(&self) -> Option<RecordStats> {
        self.records().map(RecordStats::from_records)
    }

    pub fn progress_percent(&self) -> u8 {
        self.step().progress_percent()
    }

    pub fn missing_slots(&self) -> Vec<SlotId> {
        SlotId::ALL
            .into_iter()
            .filter(|slot| !self.slot(*slot).is_some_and(|upload| upload.ready))
            .collect()
    }

    pub fn slots_ready(&self) -> bool {
        self.missing_slots().is_empty()
    }

    /// Both slots filled while still in `Upload`. The step does not move on
    /// its own; the merge still has to be requested.
    pub fn is_merge_ready(&self) -> bool {
        self.step() == Step::Upload && !self.is_busy() && self.slots_ready()
    }

    /// Sum of both slots' estimates, shown before merging.
    pub fn estimated_total_records(&self) -> usize {
        SlotId::ALL
            .into_iter()
            .filter_map(|slot| self.slot(slot))
            .map(|upload| upload.estimated_records)
            .sum()
    }

    pub fn is_initial(&self) -> bool {
        *self == Self::default()
    }
}
