use std::fmt;

use serde::{Deserialize, Serialize};

mod debug_log;

pub use debug_log::DebugLog;

/// Identifiers an adapter derives from the current page for the report query.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AdapterMetadata {
    pub project_id: String,
    pub issue_id: String,
}

impl AdapterMetadata {
    /// Returns `None` unless both identifiers are non-empty.
    pub fn new(project_id: impl Into<String>, issue_id: impl Into<String>) -> Option<Self> {
        let project_id = project_id.into();
        let issue_id = issue_id.into();
        if project_id.is_empty() || issue_id.is_empty() {
            return None;
        }
        Some(Self {
            project_id,
            issue_id,
        })
    }
}

impl fmt::Display for AdapterMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project={} issue={}", self.project_id, self.issue_id)
    }
}

/// One user's tracked time, in minutes.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub time_spent: u64,
}

impl TimeEntry {
    pub fn new(user: impl Into<String>, time_spent: u64) -> Self {
        Self {
            user: user.into(),
            time_spent,
        }
    }
}

/// Report body returned by the time-tracking API. Rendered as received.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    #[serde(default)]
    pub tracked_time: Vec<TimeEntry>,
    #[serde(default)]
    pub total_sum: u64,
}

impl ReportPayload {
    pub fn new(tracked_time: Vec<TimeEntry>, total_sum: u64) -> Self {
        Self {
            tracked_time,
            total_sum,
        }
    }

    /// No named entries and nothing tracked in aggregate.
    pub fn is_empty(&self) -> bool {
        self.tracked_time.is_empty() && self.total_sum == 0
    }
}
