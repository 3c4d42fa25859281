use serde::{Deserialize, Serialize};

/// Result of one bulk import call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Per-row and transaction errors, in the order they happened
    pub errors: Vec<String>,
    /// Ids that were actually committed
    pub imported_ids: Vec<String>,
}

impl ImportOutcome {
    pub fn new(processed: usize, imported_ids: Vec<String>, errors: Vec<String>) -> Self {
        let succeeded = imported_ids.len();
        Self {
            processed,
            succeeded,
            failed: processed.saturating_sub(succeeded),
            errors,
            imported_ids,
        }
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }
}
