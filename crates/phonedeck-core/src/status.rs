//! Run state machine for streamed task runs.

use serde::{Deserialize, Serialize};

/// State of a streamed task run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// Run created but the stream has not opened yet.
    #[default]
    Idle,
    /// Stream open, events arriving.
    Running,
    /// Run finished with a `done` event.
    Completed,
    /// Stream closed by a terminal transport failure.
    Failed,
}

impl RunState {
    /// Returns true if the run is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the run is still active (not terminal).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(RunState::Running.is_active());
    }
}
