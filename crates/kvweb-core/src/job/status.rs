//! Job status and its transition rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a job. `Created` exists only locally, before the
/// server has assigned an id; every other value mirrors the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Queued,
    Running,
    Completed,
    TimedOut,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::TimedOut => "timed_out",
            JobStatus::Failed => "failed",
        }
    }

    /// No further polling happens once a job is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::TimedOut | JobStatus::Failed)
    }

    /// Statuses that carry a result (cavity, report, log).
    pub fn has_output(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::TimedOut)
    }

    /// Forward-only transitions; `Queued` and `Running` may alternate.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (_, JobStatus::Created) => false,
            (JobStatus::Created, _) => true,
            (JobStatus::Queued | JobStatus::Running, _) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::TimedOut.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Created.is_terminal());
        assert!(!JobStatus::Failed.has_output());
        assert!(JobStatus::TimedOut.has_output());
    }

    #[test]
    fn queued_and_running_oscillate() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Queued));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Completed));
    }

    #[test]
    fn terminal_is_final() {
        for t in [JobStatus::Completed, JobStatus::TimedOut, JobStatus::Failed] {
            assert!(!t.can_transition_to(JobStatus::Queued));
            assert!(!t.can_transition_to(JobStatus::Running));
            assert!(!t.can_transition_to(JobStatus::Completed));
        }
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Created));
    }

    #[test]
    fn serde_uses_server_names() {
        let s = serde_json::to_string(&JobStatus::TimedOut).unwrap();
        assert_eq!(s, "\"timed_out\"");
        let parsed: JobStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(parsed, JobStatus::Running);
        assert_eq!(JobStatus::Queued.to_string(), "queued");
    }
}
