use std::fmt;

/// Lifecycle of a single run. Failures jump straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Validating,
    PreparingOutput,
    Locating,
    Launching,
    Running,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunState::Idle => "Idle",
            RunState::Validating => "Validating",
            RunState::PreparingOutput => "Preparing output",
            RunState::Locating => "Locating ffmpeg",
            RunState::Launching => "Launching",
            RunState::Running => "Running",
            RunState::Succeeded => "Finished",
            RunState::Failed => "Failed",
        };
        f.write_str(label)
    }
}
