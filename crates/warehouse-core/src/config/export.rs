//! Audit export configuration.

use serde::{Deserialize, Serialize};

/// Bounds for bulk audit exports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Maximum number of audit rows a single export may contain.
    #[serde(default = "default_max_rows")]
    pub max_rows: i64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
        }
    }
}

fn default_max_rows() -> i64 {
    10_000
}
