//! Routes for the Presence context.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use kitchen_presence::application::command_handlers;
use kitchen_presence::application::query_handlers::{self, ParticipantView};
use kitchen_presence::domain::commands;
use kitchen_presence::domain::presence::PresenceStatus;

use crate::error::ApiError;
use crate::feed::DeltaKind;
use crate::identity::Caller;
use crate::state::AppState;

/// Request body for POST /{project_id}/presence. Without a status the
/// stored one is kept.
#[derive(Debug, Default, Deserialize)]
pub struct HeartbeatRequest {
    /// New participation status.
    #[serde(default)]
    pub status: Option<PresenceStatus>,
}

/// Response body for POST /{project_id}/presence.
#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    /// The reporting user.
    pub user_id: String,
    /// Their stored status.
    pub status: PresenceStatus,
    /// When the heartbeat was recorded.
    pub last_seen_at: DateTime<Utc>,
}

/// POST /{project_id}/presence
#[instrument(skip_all, fields(project_id = %project_id))]
async fn heartbeat(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    request: Option<Json<HeartbeatRequest>>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let Json(request) = request.unwrap_or_default();
    let command = commands::Heartbeat {
        correlation_id: Uuid::new_v4(),
        project_id,
        status: request.status,
        display_name: caller.session.map(|session| session.display_name),
        actor: caller.actor,
    };

    debug!(correlation_id = %command.correlation_id, "handling heartbeat command");

    let record = command_handlers::handle_heartbeat(
        &command,
        state.clock.as_ref(),
        &*state.presence_repository,
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    if command.status.is_some() {
        state.feed.publish(DeltaKind::Presence, project_id, None);
    }
    Ok(Json(HeartbeatResponse {
        user_id: record.user_id,
        status: record.status,
        last_seen_at: record.last_seen_at,
    }))
}

/// GET /{project_id}/presence
#[instrument(skip_all, fields(project_id = %project_id))]
async fn active_participants(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<ParticipantView>>, ApiError> {
    let participants = query_handlers::active_participants(
        project_id,
        state.clock.as_ref(),
        &*state.presence_repository,
        &*state.event_repository,
        &*state.display_names,
    )
    .await?;
    Ok(Json(participants))
}

/// Returns the router for the presence context.
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{project_id}/presence",
        post(heartbeat).get(active_participants),
    )
}
