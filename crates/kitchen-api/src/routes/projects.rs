//! Routes for projects and their phase.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use kitchen_project::application::command_handlers;
use kitchen_project::application::query_handlers::{self, ProjectView};
use kitchen_project::domain::commands;
use kitchen_project::domain::phase::{Navigation, Phase};
use kitchen_script::application::command_handlers::handle_create_project_with_script;
use kitchen_script::application::query_handlers::list_ordered;

use crate::error::ApiError;
use crate::feed::DeltaKind;
use crate::identity::Caller;
use crate::routes::CommandResponse;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    /// Project title.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Raw script to seed the sections from.
    #[serde(default)]
    pub script: Option<String>,
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct CreateProjectResponse {
    /// The new project's id.
    pub project_id: Uuid,
    /// Number of sections seeded from the script.
    pub section_count: usize,
    /// IDs of every event persisted.
    pub event_ids: Vec<Uuid>,
}

/// Request body for POST /{project_id}/phase.
#[derive(Debug, Deserialize)]
pub struct TransitionPhaseRequest {
    /// Requested phase.
    pub phase: Phase,
}

/// POST /
#[instrument(skip_all)]
async fn create_project(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<CreateProjectResponse>), ApiError> {
    let command = commands::CreateProject {
        correlation_id: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        title: request.title,
        description: request.description,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling create_project command");

    let (event_ids, section_count) = match request.script.as_deref() {
        Some(script) => {
            let (project, script) = handle_create_project_with_script(
                &command,
                script,
                state.clock.as_ref(),
                &*state.event_repository,
            )
            .await?;
            let sections = list_ordered(command.project_id, &*state.event_repository).await?;
            let event_ids = project
                .stored_events
                .iter()
                .chain(&script.stored_events)
                .map(|e| e.event_id)
                .collect();
            (event_ids, sections.len())
        }
        None => {
            let project = command_handlers::handle_create_project(
                &command,
                state.clock.as_ref(),
                &*state.event_repository,
            )
            .await?;
            (
                CommandResponse::new(project.aggregate_id, &project.stored_events).event_ids,
                0,
            )
        }
    };

    state
        .feed
        .publish(DeltaKind::Project, command.project_id, Some(command.project_id));

    Ok((
        StatusCode::CREATED,
        Json(CreateProjectResponse {
            project_id: command.project_id,
            section_count,
            event_ids,
        }),
    ))
}

/// GET /
#[instrument(skip_all)]
async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectView>>, ApiError> {
    let projects = query_handlers::list_projects(&*state.event_repository).await?;
    Ok(Json(projects))
}

/// GET /{project_id}
#[instrument(skip_all, fields(project_id = %project_id))]
async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectView>, ApiError> {
    let view = query_handlers::get_project_by_id(project_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// DELETE /{project_id}
#[instrument(skip_all, fields(project_id = %project_id))]
async fn delete_project(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::DeleteProject {
        correlation_id: Uuid::new_v4(),
        project_id,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_project command");

    let result = command_handlers::handle_delete_project(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state.feed.publish(DeltaKind::Project, project_id, Some(project_id));
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// POST /{project_id}/phase
#[instrument(skip_all, fields(project_id = %project_id, phase = %request.phase))]
async fn transition_phase(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    Json(request): Json<TransitionPhaseRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::TransitionPhase {
        correlation_id: Uuid::new_v4(),
        project_id,
        target: request.phase,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling transition_phase command");

    let result = command_handlers::handle_transition_phase(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    if !result.stored_events.is_empty() {
        state.feed.publish(DeltaKind::Phase, project_id, None);
    }
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// GET /{project_id}/navigation
#[instrument(skip_all, fields(project_id = %project_id))]
async fn navigation(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Navigation>, ApiError> {
    let navigation =
        query_handlers::get_navigation(project_id, &caller.actor, &*state.event_repository)
            .await?;
    Ok(Json(navigation))
}

/// Returns the router for projects.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_project).get(list_projects))
        .route("/{project_id}", get(get_project).delete(delete_project))
        .route("/{project_id}/phase", post(transition_phase))
        .route("/{project_id}/navigation", get(navigation))
}
