//! Routes for script and image downloads.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use kitchen_export::application::query_handlers;
use kitchen_export::domain::bundle::ImageBundle;

use crate::error::ApiError;
use crate::identity::Caller;
use crate::state::AppState;

/// Comma-separated ids of selected images left out of a bundle.
pub const EXPORT_FAILURES_HEADER: &str = "x-export-failures";

/// Query string for GET /{project_id}/export/script.
#[derive(Debug, Deserialize)]
pub struct ScriptQuery {
    /// Detailed form with headings; defaults to true.
    #[serde(default)]
    pub headings: Option<bool>,
}

fn attachment(content_type: &'static str, disposition: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static(disposition));
    headers
}

fn bundle_response(
    bundle: ImageBundle,
    content_type: &'static str,
    disposition: &'static str,
) -> Response {
    let mut headers = attachment(content_type, disposition);
    if bundle.is_partial() {
        let failed = bundle
            .failures
            .iter()
            .map(|f| f.image_id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        if let Ok(value) = HeaderValue::from_str(&failed) {
            headers.insert(HeaderName::from_static(EXPORT_FAILURES_HEADER), value);
        }
    }
    (headers, bundle.archive).into_response()
}

/// GET /{project_id}/export/script
#[instrument(skip_all, fields(project_id = %project_id))]
async fn export_script(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    Query(query): Query<ScriptQuery>,
) -> Result<Response, ApiError> {
    let with_headings = query.headings.unwrap_or(true);
    let script = query_handlers::build_script(
        project_id,
        with_headings,
        &caller.actor,
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&caller.actor))?;

    info!(with_headings, bytes = script.len(), "script exported");

    let headers = attachment(
        "text/plain; charset=utf-8",
        "attachment; filename=\"script.txt\"",
    );
    Ok((headers, script).into_response())
}

/// GET /{project_id}/export/images
#[instrument(skip_all, fields(project_id = %project_id))]
async fn export_images(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let bundle =
        query_handlers::build_image_bundle(project_id, &caller.actor, state.bundle_sources())
            .await
            .map_err(ApiError::for_actor(&caller.actor))?;

    Ok(bundle_response(
        bundle,
        state.archive_writer.content_type(),
        "attachment; filename=\"images.zip\"",
    ))
}

/// GET /{project_id}/export/bundle
#[instrument(skip_all, fields(project_id = %project_id))]
async fn export_bundle(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let bundle =
        query_handlers::build_full_bundle(project_id, &caller.actor, state.bundle_sources())
            .await
            .map_err(ApiError::for_actor(&caller.actor))?;

    Ok(bundle_response(
        bundle,
        state.archive_writer.content_type(),
        "attachment; filename=\"bundle.zip\"",
    ))
}

/// Returns the router for downloads.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{project_id}/export/script", get(export_script))
        .route("/{project_id}/export/images", get(export_images))
        .route("/{project_id}/export/bundle", get(export_bundle))
}
