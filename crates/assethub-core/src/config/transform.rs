//! Image transform configuration.

use serde::{Deserialize, Serialize};

/// Settings for transform URL resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Generate missing transforms synchronously instead of queueing them.
    #[serde(default)]
    pub generate_before_page_load: bool,
    /// Base URL that serves pending transforms.
    #[serde(default = "default_resource_base_url")]
    pub resource_base_url: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            generate_before_page_load: false,
            resource_base_url: default_resource_base_url(),
        }
    }
}

fn default_resource_base_url() -> String {
    "/resources".to_string()
}
