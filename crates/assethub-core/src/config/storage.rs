//! Storage backend and upload configuration.

use serde::{Deserialize, Serialize};

use crate::types::BackendId;

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for scratch copies made during cross-backend transfers.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: String,
    /// Maximum upload size in bytes (default 512 MB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
    /// Lowercase extensions accepted by uploads. Empty allows every extension.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
    /// Replacement for whitespace runs in sanitized filenames.
    #[serde(default = "default_word_separator")]
    pub filename_word_separator: String,
    /// Transliterate filenames to ASCII while sanitizing.
    #[serde(default)]
    pub convert_filenames_to_ascii: bool,
    /// How many `name_N.ext` candidates to try when a filename is taken.
    #[serde(default = "default_replacement_attempts")]
    pub max_name_replacement_attempts: u32,
    /// Configured backends.
    #[serde(default)]
    pub backends: Vec<BackendConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            max_upload_size_bytes: default_max_upload(),
            allowed_extensions: Vec::new(),
            filename_word_separator: default_word_separator(),
            convert_filenames_to_ascii: false,
            max_name_replacement_attempts: default_replacement_attempts(),
            backends: Vec::new(),
        }
    }
}

impl StorageConfig {
    /// Whether an extension (without the dot) may be stored.
    pub fn is_extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions.is_empty()
            || self
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(extension))
    }
}

/// The storage medium a backend writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// A directory on the local filesystem.
    Local,
    /// A remote object store (S3-compatible).
    Object,
    /// Local staging area for per-user temporary uploads.
    Staging,
}

/// Configuration of a single backend instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Stable backend identifier referenced by folder and file rows.
    pub id: BackendId,
    /// Display name, also used as the name of the backend's top folder.
    pub name: String,
    /// Storage medium.
    pub kind: BackendKind,
    /// Position of this backend's tree among all trees.
    #[serde(default)]
    pub sort_order: i32,
    /// Root directory for `local` and `staging` backends.
    #[serde(default)]
    pub root_path: Option<String>,
    /// Bucket name for `object` backends.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Endpoint URL for non-AWS object stores.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Region for `object` backends.
    #[serde(default)]
    pub region: Option<String>,
    /// Public URL prefix. Files of backends without one have no public URL.
    #[serde(default)]
    pub url_base: Option<String>,
}

fn default_scratch_dir() -> String {
    "./data/scratch".to_string()
}

fn default_max_upload() -> u64 {
    536_870_912 // 512 MB
}

fn default_word_separator() -> String {
    "-".to_string()
}

fn default_replacement_attempts() -> u32 {
    50
}
