//! Routes for the Proposal context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post, routing::put};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use kitchen_proposal::application::command_handlers;
use kitchen_proposal::application::query_handlers::{self, ProposalView};
use kitchen_proposal::domain::commands;
use kitchen_proposal::domain::events::ProposalStatus;

use crate::error::ApiError;
use crate::feed::DeltaKind;
use crate::identity::Caller;
use crate::routes::CommandResponse;
use crate::state::AppState;

/// Request body for POST /{project_id}/sections/{section_id}/proposals.
#[derive(Debug, Deserialize)]
pub struct SubmitProposalRequest {
    /// Replacement text for the section.
    pub proposed_content: String,
}

/// Response body for a submitted proposal.
#[derive(Debug, Serialize)]
pub struct SubmitProposalResponse {
    /// The new proposal's id.
    pub proposal_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// Request body for PUT /{project_id}/proposals/{proposal_id}/status.
#[derive(Debug, Deserialize)]
pub struct SetProposalStatusRequest {
    /// The new status.
    pub status: ProposalStatus,
}

/// GET /{project_id}/sections/{section_id}/proposals
#[instrument(skip_all, fields(project_id = %project_id, section_id = %section_id))]
async fn list_section_proposals(
    State(state): State<AppState>,
    Path((project_id, section_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<ProposalView>>, ApiError> {
    let proposals =
        query_handlers::list_for_section(project_id, section_id, &*state.event_repository)
            .await?;
    Ok(Json(proposals))
}

/// GET /{project_id}/proposals
#[instrument(skip_all, fields(project_id = %project_id))]
async fn list_project_proposals(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<ProposalView>>, ApiError> {
    let proposals = query_handlers::list_for_project(project_id, &*state.event_repository).await?;
    Ok(Json(proposals))
}

/// POST /{project_id}/sections/{section_id}/proposals
#[instrument(skip_all, fields(project_id = %project_id, section_id = %section_id))]
async fn submit_proposal(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, section_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SubmitProposalRequest>,
) -> Result<(StatusCode, Json<SubmitProposalResponse>), ApiError> {
    let command = commands::SubmitProposal {
        correlation_id: Uuid::new_v4(),
        project_id,
        proposal_id: Uuid::new_v4(),
        section_id,
        proposed_content: request.proposed_content,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_proposal command");

    let result = command_handlers::handle_submit_proposal(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state
        .feed
        .publish(DeltaKind::Proposal, project_id, Some(command.proposal_id));
    Ok((
        StatusCode::CREATED,
        Json(SubmitProposalResponse {
            proposal_id: command.proposal_id,
            event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
        }),
    ))
}

/// POST /{project_id}/proposals/{proposal_id}/apply
#[instrument(skip_all, fields(project_id = %project_id, proposal_id = %proposal_id))]
async fn apply_proposal(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, proposal_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ApplyProposal {
        correlation_id: Uuid::new_v4(),
        project_id,
        proposal_id,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling apply_proposal command");

    let result = command_handlers::handle_apply_proposal(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state.feed.publish(DeltaKind::Section, project_id, None);
    state
        .feed
        .publish(DeltaKind::Proposal, project_id, Some(proposal_id));
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// PUT /{project_id}/proposals/{proposal_id}/status
#[instrument(skip_all, fields(project_id = %project_id, proposal_id = %proposal_id))]
async fn set_proposal_status(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, proposal_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SetProposalStatusRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::SetProposalStatus {
        correlation_id: Uuid::new_v4(),
        project_id,
        proposal_id,
        status: request.status,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling set_proposal_status command");

    let result = command_handlers::handle_set_proposal_status(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state
        .feed
        .publish(DeltaKind::Proposal, project_id, Some(proposal_id));
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// Returns the router for the proposal context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{project_id}/sections/{section_id}/proposals",
            get(list_section_proposals).post(submit_proposal),
        )
        .route("/{project_id}/proposals", get(list_project_proposals))
        .route(
            "/{project_id}/proposals/{proposal_id}/apply",
            post(apply_proposal),
        )
        .route(
            "/{project_id}/proposals/{proposal_id}/status",
            put(set_proposal_status),
        )
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use kitchen_project::domain::phase::Phase;
    use serde_json::json;

    use super::*;
    use crate::routes::test_helpers::{seed_project, send_json};
    use crate::state::testing::{CHAIR, MEMBER, test_state};

    async fn submit(state: &AppState, project_id: Uuid, section_id: Uuid, text: &str) -> Uuid {
        let (status, json) = send_json(
            router().with_state(state.clone()),
            "POST",
            &format!("/{project_id}/sections/{section_id}/proposals"),
            Some(MEMBER),
            Some(json!({ "proposed_content": text })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        json["proposal_id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_member_proposes_during_cooking() {
        // Arrange
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A\n\nB", Phase::Cooking).await;

        // Act
        let proposal_id = submit(&state, project_id, ids[1], "Better B").await;

        // Assert
        let (status, proposals) = send_json(
            router().with_state(state),
            "GET",
            &format!("/{project_id}/sections/{}/proposals", ids[1]),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(proposals[0]["proposal_id"], proposal_id.to_string());
        assert_eq!(proposals[0]["status"], "pending");
        assert_eq!(proposals[0]["proposed_by"], MEMBER);
    }

    #[tokio::test]
    async fn test_proposals_close_after_cooking() {
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A", Phase::ImageUpload).await;

        let (status, _) = send_json(
            router().with_state(state),
            "POST",
            &format!("/{project_id}/sections/{}/proposals", ids[0]),
            Some(MEMBER),
            Some(json!({ "proposed_content": "late" })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_apply_writes_the_text_into_the_section() {
        // Arrange
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A\n\nB", Phase::Cooking).await;
        let proposal_id = submit(&state, project_id, ids[0], "Better A").await;

        // Act
        let (status, _) = send_json(
            router().with_state(state.clone()),
            "POST",
            &format!("/{project_id}/proposals/{proposal_id}/apply"),
            Some(CHAIR),
            None,
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        let (_, proposals) = send_json(
            router().with_state(state.clone()),
            "GET",
            &format!("/{project_id}/proposals"),
            None,
            None,
        )
        .await;
        assert_eq!(proposals[0]["status"], "approved");
        let section = kitchen_script::application::query_handlers::get_section(
            project_id,
            ids[0],
            &*state.event_repository,
        )
        .await
        .unwrap();
        assert_eq!(section.content, "Better A");
    }

    #[tokio::test]
    async fn test_applying_twice_returns_400() {
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A", Phase::Cooking).await;
        let proposal_id = submit(&state, project_id, ids[0], "Better A").await;
        let uri = format!("/{project_id}/proposals/{proposal_id}/apply");

        send_json(router().with_state(state.clone()), "POST", &uri, Some(CHAIR), None).await;
        let (status, _) =
            send_json(router().with_state(state), "POST", &uri, Some(CHAIR), None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_member_cannot_review() {
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A", Phase::Cooking).await;
        let proposal_id = submit(&state, project_id, ids[0], "Better A").await;

        let (status, _) = send_json(
            router().with_state(state),
            "POST",
            &format!("/{project_id}/proposals/{proposal_id}/apply"),
            Some(MEMBER),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_reject_leaves_the_section_alone() {
        // Arrange
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A", Phase::Cooking).await;
        let proposal_id = submit(&state, project_id, ids[0], "Better A").await;

        // Act
        let (status, _) = send_json(
            router().with_state(state.clone()),
            "PUT",
            &format!("/{project_id}/proposals/{proposal_id}/status"),
            Some(CHAIR),
            Some(json!({ "status": "rejected" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        let (_, proposals) = send_json(
            router().with_state(state),
            "GET",
            &format!("/{project_id}/sections/{}/proposals", ids[0]),
            None,
            None,
        )
        .await;
        assert_eq!(proposals[0]["status"], "rejected");
    }

    #[tokio::test]
    async fn test_unknown_proposal_returns_404() {
        let state = test_state();
        let (project_id, _) = seed_project(&state, "A", Phase::Cooking).await;

        let (status, _) = send_json(
            router().with_state(state),
            "POST",
            &format!("/{project_id}/proposals/{}/apply", Uuid::new_v4()),
            Some(CHAIR),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
