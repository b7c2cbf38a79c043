use std::fmt;

/// The state of one supervised child process. See `Task::supervise` for the
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    NeverStarted,
    Starting,
    Running,
    Backoff,
    Stopping,
    Stopped,
    Exited,
    Fatal,
    Unknown,
}

impl TaskState {
    /// No live process is associated with the Task; it owns no stdio and no
    /// PID (invariant I2).
    pub fn is_stopped_like(self) -> bool {
        matches!(
            self,
            TaskState::Stopped
                | TaskState::Exited
                | TaskState::Fatal
                | TaskState::Unknown
                | TaskState::NeverStarted
        )
    }

    /// A child is expected to be absent; operations requiring no live
    /// process reject these.
    pub fn is_running_like(self) -> bool {
        matches!(
            self,
            TaskState::Starting | TaskState::Running | TaskState::Backoff
        )
    }

    /// States from which a signal may meaningfully be delivered to the
    /// child (adopted from the original implementation's `SIGNALLABLE_STATES`).
    pub fn is_signallable(self) -> bool {
        matches!(
            self,
            TaskState::Running | TaskState::Starting | TaskState::Stopping
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::NeverStarted => "NEVER_STARTED",
            TaskState::Starting => "STARTING",
            TaskState::Running => "RUNNING",
            TaskState::Backoff => "BACKOFF",
            TaskState::Stopping => "STOPPING",
            TaskState::Stopped => "STOPPED",
            TaskState::Exited => "EXITED",
            TaskState::Fatal => "FATAL",
            TaskState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_like_and_running_like_are_disjoint() {
        for state in [
            TaskState::NeverStarted,
            TaskState::Starting,
            TaskState::Running,
            TaskState::Backoff,
            TaskState::Stopping,
            TaskState::Stopped,
            TaskState::Exited,
            TaskState::Fatal,
            TaskState::Unknown,
        ] {
            assert!(!(state.is_stopped_like() && state.is_running_like()));
        }
    }
}
