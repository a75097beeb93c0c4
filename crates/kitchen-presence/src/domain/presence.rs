//! Presence records and the activity window.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use kitchen_core::error::DomainError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How long after its last heartbeat a participant still counts as active.
pub const ACTIVE_WINDOW_SECS: i64 = 60;

/// A participant's self-reported involvement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    /// Watching only.
    #[default]
    NotParticipating,
    /// Actively contributing.
    Participating,
    /// Done for this session.
    Completed,
}

impl PresenceStatus {
    /// Wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotParticipating => "not_participating",
            Self::Participating => "participating",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresenceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_participating" => Ok(Self::NotParticipating),
            "participating" => Ok(Self::Participating),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::Validation(format!(
                "unknown presence status: {other}"
            ))),
        }
    }
}

/// The single presence row of a (project, user) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRecord {
    /// The project.
    pub project_id: Uuid,
    /// The participant.
    pub user_id: String,
    /// Last reported status.
    pub status: PresenceStatus,
    /// Display name sent with the latest named heartbeat.
    pub display_name: Option<String>,
    /// Time of the last heartbeat.
    pub last_seen_at: DateTime<Utc>,
}

impl PresenceRecord {
    /// Active iff the last heartbeat is at most [`ACTIVE_WINDOW_SECS`] old
    /// at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now - self.last_seen_at <= Duration::seconds(ACTIVE_WINDOW_SECS)
    }
}
