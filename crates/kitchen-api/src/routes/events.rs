//! Server-Sent Events stream of project changes.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Router, routing::get};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use kitchen_project::application::query_handlers;

use crate::error::ApiError;
use crate::state::AppState;

const KEEP_ALIVE_SECS: u64 = 15;

/// GET /{project_id}/events
#[instrument(skip_all, fields(project_id = %project_id))]
async fn project_events(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    query_handlers::get_project_by_id(project_id, &*state.event_repository).await?;

    debug!("change feed subscriber connected");

    let stream = BroadcastStream::new(state.feed.subscribe(project_id)).filter_map(
        |result| async move {
            match result {
                Ok(delta) => match Event::default().event(delta.kind.as_str()).json_data(&delta) {
                    Ok(event) => Some(Ok(event)),
                    Err(e) => {
                        warn!(error = %e, "failed to encode change delta");
                        None
                    }
                },
                Err(e) => {
                    warn!(error = ?e, "change feed subscriber lagged");
                    None
                }
            }
        },
    );

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    ))
}

/// Returns the router for the change feed.
pub fn router() -> Router<AppState> {
    Router::new().route("/{project_id}/events", get(project_events))
}
