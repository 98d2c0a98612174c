//! Uniform result carrier for mutating asset operations.
//!
//! Every folder and file operation that can end in an *expected* outcome
//! (including a filename conflict that needs a user decision) returns an
//! [`OperationResult`] instead of an error. Results are built with consuming
//! builder methods and are not mutated once handed back to a caller.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;
use crate::types::id::{AssetId, FolderId};

/// Data item key carrying the id of the affected (or conflicting) file.
pub const FILE_ID: &str = "fileId";
/// Data item key carrying the affected filename.
pub const FILENAME: &str = "filename";
/// Data item key carrying the filename a file ended up with.
pub const NEW_FILENAME: &str = "newFilename";
/// Data item key carrying the id of the affected folder.
pub const FOLDER_ID: &str = "folderId";
/// Data item key carrying per-item results of a batch.
pub const RESULTS: &str = "results";

/// Outcome category of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// The operation completed.
    Success,
    /// The operation failed; see [`OperationResult::error`].
    Error,
    /// A filename collision needs a follow-up resolution call.
    Conflict,
}

/// Success flag, error message, conflict prompt, and named data items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
    #[serde(default)]
    data: BTreeMap<String, Value>,
}

impl OperationResult {
    /// A successful result with no data items.
    pub fn success() -> Self {
        Self {
            status: OperationStatus::Success,
            error: None,
            prompt: None,
            data: BTreeMap::new(),
        }
    }

    /// A failed result.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Error,
            error: Some(message.into()),
            prompt: None,
            data: BTreeMap::new(),
        }
    }

    /// A conflict result asking the caller for a resolution.
    pub fn conflict(prompt: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Conflict,
            error: None,
            prompt: Some(prompt.into()),
            data: BTreeMap::new(),
        }
    }

    /// Attach a named data item. Values that fail to serialize are stored as `null`.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.data.insert(key.into(), value);
        self
    }

    /// Outcome category.
    pub fn status(&self) -> OperationStatus {
        self.status
    }

    /// Whether the operation completed.
    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Success
    }

    /// Whether the operation failed.
    pub fn is_error(&self) -> bool {
        self.status == OperationStatus::Error
    }

    /// Whether the operation stopped at a filename collision.
    pub fn is_conflict(&self) -> bool {
        self.status == OperationStatus::Conflict
    }

    /// The error message of a failed result.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The prompt of a conflict result.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// Raw data item lookup.
    pub fn data_item(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Typed data item lookup.
    pub fn data_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// All data items.
    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    /// The `fileId` data item.
    pub fn file_id(&self) -> Option<AssetId> {
        self.data_as(FILE_ID)
    }

    /// The `folderId` data item.
    pub fn folder_id(&self) -> Option<FolderId> {
        self.data_as(FOLDER_ID)
    }

    /// The `filename` data item.
    pub fn filename(&self) -> Option<String> {
        self.data_as(FILENAME)
    }

    /// The `newFilename` data item.
    pub fn new_filename(&self) -> Option<String> {
        self.data_as(NEW_FILENAME)
    }
}

impl From<AppError> for OperationResult {
    fn from(err: AppError) -> Self {
        Self::error(err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_not_error() {
        let file_id = AssetId::new();
        let result = OperationResult::conflict("A file with the name “a.jpg” already exists.")
            .with_data(FILE_ID, file_id)
            .with_data(FILENAME, "a.jpg");

        assert!(result.is_conflict());
        assert!(!result.is_error());
        assert!(!result.is_success());
        assert_eq!(result.file_id(), Some(file_id));
        assert_eq!(result.filename().as_deref(), Some("a.jpg"));
        assert!(result.prompt().is_some());
    }

    #[test]
    fn test_error_from_app_error_keeps_message() {
        let result: OperationResult = AppError::not_found("Can’t find the folder!").into();
        assert!(result.is_error());
        assert_eq!(result.error_message(), Some("Can’t find the folder!"));
    }

    #[test]
    fn test_missing_item_is_none() {
        let result = OperationResult::success();
        assert!(result.file_id().is_none());
        assert!(result.data().is_empty());
    }
}
