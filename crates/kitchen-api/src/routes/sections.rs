//! Routes for the script and its sections.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::patch, routing::put};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use kitchen_script::application::command_handlers;
use kitchen_script::application::query_handlers::{self, SectionView};
use kitchen_script::domain::commands;

use crate::error::ApiError;
use crate::feed::DeltaKind;
use crate::identity::Caller;
use crate::routes::CommandResponse;
use crate::state::AppState;

/// Request body for PUT /{project_id}/script.
#[derive(Debug, Deserialize)]
pub struct ImportScriptRequest {
    /// Raw script; blank-line separated blocks become sections.
    pub raw_text: String,
}

/// Request body for POST /{project_id}/sections.
#[derive(Debug, Deserialize)]
pub struct InsertSectionRequest {
    /// Position of the new section, `0..=N`.
    pub index: usize,
    /// Initial body text.
    #[serde(default)]
    pub content: String,
}

/// Response body for POST /{project_id}/sections.
#[derive(Debug, Serialize)]
pub struct InsertSectionResponse {
    /// The new section's id.
    pub section_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// Request body for PUT /{project_id}/sections/order.
#[derive(Debug, Deserialize)]
pub struct ReorderSectionsRequest {
    /// Every section id of the project, in the new order.
    pub section_ids: Vec<Uuid>,
}

/// Request body for PATCH /{project_id}/sections/{section_id}. Absent
/// fields stay unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateSectionRequest {
    /// New body text.
    #[serde(default)]
    pub content: Option<String>,
    /// New guidance for image contributors.
    #[serde(default)]
    pub image_instruction: Option<String>,
    /// Opens or closes image submission.
    #[serde(default)]
    pub allow_image_submission: Option<bool>,
    /// New reference image URLs.
    #[serde(default)]
    pub reference_image_urls: Option<Vec<String>>,
}

/// PUT /{project_id}/script
#[instrument(skip_all, fields(project_id = %project_id))]
async fn import_script(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    Json(request): Json<ImportScriptRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ImportScript {
        correlation_id: Uuid::new_v4(),
        project_id,
        raw_text: request.raw_text,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling import_script command");

    let result = command_handlers::handle_import_script(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state.feed.publish(DeltaKind::Section, project_id, None);
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// GET /{project_id}/sections
#[instrument(skip_all, fields(project_id = %project_id))]
async fn list_sections(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<SectionView>>, ApiError> {
    let sections = query_handlers::list_ordered(project_id, &*state.event_repository).await?;
    Ok(Json(sections))
}

/// GET /{project_id}/sections/{section_id}
#[instrument(skip_all, fields(project_id = %project_id, section_id = %section_id))]
async fn get_section(
    State(state): State<AppState>,
    Path((project_id, section_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SectionView>, ApiError> {
    let section =
        query_handlers::get_section(project_id, section_id, &*state.event_repository).await?;
    Ok(Json(section))
}

/// POST /{project_id}/sections
#[instrument(skip_all, fields(project_id = %project_id, index = request.index))]
async fn insert_section(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    Json(request): Json<InsertSectionRequest>,
) -> Result<(StatusCode, Json<InsertSectionResponse>), ApiError> {
    let command = commands::InsertSection {
        correlation_id: Uuid::new_v4(),
        project_id,
        section_id: Uuid::new_v4(),
        index: request.index,
        content: request.content,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling insert_section command");

    let result = command_handlers::handle_insert_section(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state
        .feed
        .publish(DeltaKind::Section, project_id, Some(command.section_id));
    Ok((
        StatusCode::CREATED,
        Json(InsertSectionResponse {
            section_id: command.section_id,
            event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
        }),
    ))
}

/// PUT /{project_id}/sections/order
#[instrument(skip_all, fields(project_id = %project_id))]
async fn reorder_sections(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    Json(request): Json<ReorderSectionsRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ReorderSections {
        correlation_id: Uuid::new_v4(),
        project_id,
        section_ids: request.section_ids,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling reorder_sections command");

    let result = command_handlers::handle_reorder_sections(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state.feed.publish(DeltaKind::Section, project_id, None);
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// PATCH /{project_id}/sections/{section_id}
#[instrument(skip_all, fields(project_id = %project_id, section_id = %section_id))]
async fn update_section(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, section_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateSectionRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::UpdateSection {
        correlation_id: Uuid::new_v4(),
        project_id,
        section_id,
        content: request.content,
        image_instruction: request.image_instruction,
        allow_image_submission: request.allow_image_submission,
        reference_image_urls: request.reference_image_urls,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling update_section command");

    let result = command_handlers::handle_update_section(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state
        .feed
        .publish(DeltaKind::Section, project_id, Some(section_id));
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// DELETE /{project_id}/sections/{section_id}
#[instrument(skip_all, fields(project_id = %project_id, section_id = %section_id))]
async fn delete_section(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, section_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::DeleteSection {
        correlation_id: Uuid::new_v4(),
        project_id,
        section_id,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_section command");

    let result = command_handlers::handle_delete_section(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state
        .feed
        .publish(DeltaKind::Section, project_id, Some(section_id));
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// Returns the router for the script context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{project_id}/script", put(import_script))
        .route(
            "/{project_id}/sections",
            get(list_sections).post(insert_section),
        )
        .route("/{project_id}/sections/order", put(reorder_sections))
        .route(
            "/{project_id}/sections/{section_id}",
            patch(update_section).get(get_section).delete(delete_section),
        )
}
