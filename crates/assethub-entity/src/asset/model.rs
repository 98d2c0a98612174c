//! Asset entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use assethub_core::events::AssetRef;
use assethub_core::types::{AssetId, BackendId, FolderId};

use super::kind::AssetKind;
use crate::naming;

/// An indexed file stored on a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
pub struct Asset {
    /// Asset identifier, absent until the asset is stored.
    pub id: Option<AssetId>,
    /// The backend where the bytes live.
    pub backend_id: BackendId,
    /// The folder containing this asset.
    pub folder_id: FolderId,
    /// The filename (including extension).
    #[validate(length(min = 1, max = 255, message = "Filename must be 1-255 characters"))]
    pub filename: String,
    /// Kind derived from the extension.
    pub kind: AssetKind,
    /// Size in bytes.
    #[validate(range(min = 0, message = "Size cannot be negative"))]
    pub size: i64,
    /// Pixel width, images only.
    #[validate(range(min = 1, message = "Width must be positive"))]
    pub width: Option<i32>,
    /// Pixel height, images only.
    #[validate(range(min = 1, message = "Height must be positive"))]
    pub height: Option<i32>,
    /// When the bytes were last modified.
    pub date_modified: Option<DateTime<Utc>>,
    /// Display title.
    #[validate(length(max = 255, message = "Title cannot exceed 255 characters"))]
    pub title: Option<String>,
}

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// The offending field.
    pub field: String,
    /// Human-readable message.
    pub message: String,
}

impl Asset {
    /// A not-yet-stored asset with its kind derived from `filename`.
    pub fn new(backend_id: BackendId, folder_id: FolderId, filename: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            id: None,
            backend_id,
            folder_id,
            kind: AssetKind::from_filename(&filename),
            filename,
            size: 0,
            width: None,
            height: None,
            date_modified: None,
            title: None,
        }
    }

    /// The lowercase extension, if any.
    pub fn extension(&self) -> Option<String> {
        naming::extension(&self.filename).map(str::to_lowercase)
    }

    /// Whether the asset is an image.
    pub fn is_image(&self) -> bool {
        self.kind == AssetKind::Image
    }

    /// Title derived from the filename stem with underscores read as spaces.
    pub fn default_title(&self) -> String {
        naming::stem(&self.filename).replace('_', " ")
    }

    /// Check field-level constraints, collecting every failure.
    pub fn field_errors(&self) -> Vec<FieldError> {
        let Err(errors) = self.validate() else {
            return Vec::new();
        };

        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        fields
    }

    /// Event snapshot of this asset.
    pub fn as_ref_event(&self) -> AssetRef {
        AssetRef {
            asset_id: self.id,
            backend_id: self.backend_id,
            folder_id: self.folder_id,
            filename: self.filename.clone(),
        }
    }

    /// Return the stored id or a not-found error.
    pub fn require_id(&self) -> assethub_core::AppResult<AssetId> {
        self.id.ok_or_else(|| {
            assethub_core::AppError::not_found(format!("File '{}' is not indexed", self.filename))
        })
    }
}
