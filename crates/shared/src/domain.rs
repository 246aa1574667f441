use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(RecordId);

/// One of the two fixed upload positions, one per source platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    pub const ALL: [SlotId; 2] = [SlotId::A, SlotId::B];

    /// Multipart field name the merge service expects for this slot.
    pub fn form_field(self) -> &'static str {
        match self {
            SlotId::A => "file1",
            SlotId::B => "file2",
        }
    }

    pub fn platform_label(self) -> &'static str {
        match self {
            SlotId::A => "Plataforma Universitaria A",
            SlotId::B => "Plataforma Universitaria B",
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::A => f.write_str("A"),
            SlotId::B => f.write_str("B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnificationStatus {
    #[serde(rename = "Unificado")]
    Unified,
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "Conflicto")]
    Conflict,
}

impl UnificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UnificationStatus::Unified => "Unificado",
            UnificationStatus::Pending => "Pendiente",
            UnificationStatus::Conflict => "Conflicto",
        }
    }
}

impl fmt::Display for UnificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student row as returned by the merge service. Read-only on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub full_name: String,
    pub email: String,
    #[serde(rename = "curso", default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    #[serde(rename = "plataforma_a")]
    pub platform_a: String,
    #[serde(rename = "plataforma_b")]
    pub platform_b: String,
    pub status: UnificationStatus,
}

impl UnifiedRecord {
    pub fn platform_status(&self, slot: SlotId) -> &str {
        match slot {
            SlotId::A => &self.platform_a,
            SlotId::B => &self.platform_b,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStats {
    pub total: usize,
    pub unified: usize,
    pub pending: usize,
    pub conflict: usize,
}

impl RecordStats {
    pub fn from_records(records: &[UnifiedRecord]) -> Self {
        records.iter().fold(
            Self {
                total: records.len(),
                ..Self::default()
            },
            |mut stats, record| {
                match record.status {
                    UnificationStatus::Unified => stats.unified += 1,
                    UnificationStatus::Pending => stats.pending += 1,
                    UnificationStatus::Conflict => stats.conflict += 1,
                }
                stats
            },
        )
    }
}
