//! Per-project change feed.
//!
//! Every successful mutation publishes a `ProjectDelta` on the project's
//! broadcast channel. Clients subscribe over Server-Sent Events and re-fetch
//! whatever the delta names; polling the read endpoints keeps working.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// Deltas buffered per project before slow subscribers start lagging.
const CHANNEL_CAPACITY: usize = 64;

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaKind {
    /// Project created or deleted.
    Project,
    /// Phase changed.
    Phase,
    /// Section sequence or content changed.
    Section,
    /// A proposal was submitted or reviewed.
    Proposal,
    /// An image was added, selected, commented or deleted.
    Image,
    /// A participant's presence changed.
    Presence,
}

impl DeltaKind {
    /// SSE event name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Phase => "phase",
            Self::Section => "section",
            Self::Proposal => "proposal",
            Self::Image => "image",
            Self::Presence => "presence",
        }
    }
}

/// A change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDelta {
    /// What changed.
    pub kind: DeltaKind,
    /// The project it changed in.
    pub project_id: Uuid,
    /// The entity that changed, when there is a single one.
    pub entity_id: Option<Uuid>,
}

/// Broadcast channels keyed by project.
#[derive(Debug, Default)]
pub struct ChangeFeed {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<ProjectDelta>>>,
}

impl ChangeFeed {
    /// Creates an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the deltas of `project_id`.
    pub fn subscribe(&self, project_id: Uuid) -> broadcast::Receiver<ProjectDelta> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(project_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publishes a delta. Returns how many subscribers received it. A
    /// project nobody listens to has its channel dropped.
    pub fn publish(&self, kind: DeltaKind, project_id: Uuid, entity_id: Option<Uuid>) -> usize {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = channels.get(&project_id) else {
            return 0;
        };
        let delta = ProjectDelta {
            kind,
            project_id,
            entity_id,
        };
        if let Ok(receivers) = sender.send(delta) {
            debug!(%project_id, kind = kind.as_str(), receivers, "delta published");
            receivers
        } else {
            channels.remove(&project_id);
            0
        }
    }
}
