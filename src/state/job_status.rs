/// Job status definitions for tracking crawl progress
///
/// A job moves `queued -> running -> {completed | error | stopped}`. Any job can be
/// reset to `queued` by a re-run.
use serde::Serialize;
use std::fmt;

/// Represents the current state of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    // ===== Active States =====
    /// Job has been created (or reset) and is waiting to be started
    Queued,

    /// Job is currently being crawled
    Running,

    // ===== Terminal States =====
    /// Crawl finished and the page profile was written
    Completed,

    /// Fetch or parse failed; `error_message` holds the reason
    Error,

    /// Crawl was cancelled by a stop request
    Stopped,
}

impl JobStatus {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Stopped)
    }

    /// Returns true if a crawl may be started from this state
    ///
    /// Only queued jobs and jobs that previously failed can be started directly;
    /// completed and stopped jobs must be re-run first.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Queued | Self::Error)
    }

    /// Returns true if a stop request makes sense in this state
    pub fn can_stop(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Stopped => "stopped",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "error" => Some(Self::Error),
            "stopped" => Some(Self::Stopped),
            _ => None,
        }
    }

    /// Returns all possible job statuses
    pub fn all() -> [Self; 5] {
        [
            Self::Queued,
            Self::Running,
            Self::Completed,
            Self::Error,
            Self::Stopped,
        ]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
