//! Page-size bounds for list endpoints.

use serde::{Deserialize, Serialize};

/// Page-size bounds applied by pagination normalization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when the request omits one or asks for an invalid one.
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    /// Largest page size a caller may request.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_page_size() -> i64 {
    20
}

fn default_max_page_size() -> i64 {
    100
}
