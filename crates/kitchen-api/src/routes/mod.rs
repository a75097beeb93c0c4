//! Route modules organized by bounded context.

use axum::Router;
use kitchen_core::repository::StoredEvent;
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;

pub mod events;
pub mod export;
pub mod health;
pub mod images;
pub mod presence;
pub mod projects;
pub mod proposals;
pub mod sections;

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The stream the events were appended to.
    pub aggregate_id: Uuid,
    /// IDs of the domain events produced and persisted. Empty when the
    /// command changed nothing.
    pub event_ids: Vec<Uuid>,
}

impl CommandResponse {
    pub(crate) fn new(aggregate_id: Uuid, stored_events: &[StoredEvent]) -> Self {
        Self {
            aggregate_id,
            event_ids: stored_events.iter().map(|e| e.event_id).collect(),
        }
    }
}

/// Every route, without middleware.
pub fn build_router(state: AppState) -> Router {
    let projects = projects::router()
        .merge(sections::router())
        .merge(proposals::router())
        .merge(images::router())
        .merge(presence::router())
        .merge(export::router())
        .merge(events::router());

    Router::new()
        .merge(health::router())
        .nest("/api/v1/projects", projects)
        .with_state(state)
}
