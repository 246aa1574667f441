//! Wire envelopes exchanged with the merge service and the category publisher.

use serde::{Deserialize, Serialize};

use crate::{
    domain::UnifiedRecord,
    error::{ApiError, ErrorCode},
};

/// Multipart text field carrying the category name on merge requests.
pub const CATEGORY_NAME_FIELD: &str = "categoryName";

const MERGE_FALLBACK_ERROR: &str = "unknown error while merging files";
const PUBLISH_FALLBACK_ERROR: &str = "unknown error while creating category";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeFilesResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<UnifiedRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MergeFilesResponse {
    pub fn ok(data: Vec<UnifiedRecord>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// A successful envelope without `data` is an empty merge, not a failure.
    pub fn into_result(self) -> Result<Vec<UnifiedRecord>, ApiError> {
        if self.success {
            Ok(self.data.unwrap_or_default())
        } else {
            Err(ApiError::new(
                ErrorCode::Rejected,
                non_blank(self.error).unwrap_or_else(|| MERGE_FALLBACK_ERROR.to_string()),
            ))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub category_name: String,
    pub student_data: Vec<UnifiedRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub message: String,
}

impl CreateCategoryResponse {
    pub fn into_result(self) -> Result<PublishReceipt, ApiError> {
        if self.success {
            Ok(PublishReceipt {
                message: self.message.unwrap_or_default(),
            })
        } else {
            Err(ApiError::new(
                ErrorCode::Rejected,
                non_blank(self.error).unwrap_or_else(|| PUBLISH_FALLBACK_ERROR.to_string()),
            ))
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
