//! Status of a finished task.

use serde::{Deserialize, Serialize};

/// Final status of a task after all of its attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Last attempt exited with code 0.
    Succeeded,
    /// Every attempt exited non-zero or could not be spawned.
    Failed,
    /// Terminated because a sibling task triggered the kill policy.
    Killed,
}

impl TaskStatus {
    /// Returns true if the task succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}
