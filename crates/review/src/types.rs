//! Review result returned to callers

use serde::{Deserialize, Serialize};

/// Structured verdict for one snippet.
///
/// Every field is required when parsing. `quality_score` is meant to be 0-100
/// but is not range-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub optimized_code: String,
    pub quality_score: i64,
    pub errors: Vec<String>,
    pub inefficiencies: Vec<String>,
    pub security: Vec<String>,
}

impl ReviewResult {
    /// Total number of findings across all categories.
    pub fn finding_count(&self) -> usize {
        self.errors.len() + self.inefficiencies.len() + self.security.len()
    }
}
