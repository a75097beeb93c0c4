//! Routes for the Image Curation context.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post, routing::put};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use kitchen_curation::application::command_handlers;
use kitchen_curation::application::query_handlers::{self, ImageView, SelectedImageView};
use kitchen_curation::domain::commands;

use crate::error::ApiError;
use crate::feed::DeltaKind;
use crate::identity::Caller;
use crate::routes::CommandResponse;
use crate::state::AppState;

/// Request body for POST /{project_id}/images/upload-slot.
#[derive(Debug, Deserialize)]
pub struct UploadSlotRequest {
    /// Client-side file name; only its extension is kept.
    pub filename: String,
    /// MIME type the client will upload.
    pub content_type: String,
}

/// Response body for POST /{project_id}/images/upload-slot.
#[derive(Debug, Serialize)]
pub struct UploadSlotResponse {
    /// Where to PUT the bytes.
    pub upload_url: String,
    /// Key to confirm once the upload finished.
    pub storage_key: String,
    /// Where the image will be served from.
    pub public_url: String,
}

/// Request body for POST /{project_id}/images.
#[derive(Debug, Deserialize)]
pub struct ConfirmUploadRequest {
    /// Key returned by the upload slot.
    pub storage_key: String,
    /// Section the image is submitted for.
    #[serde(default)]
    pub section_id: Option<Uuid>,
}

/// Response body for POST /{project_id}/images.
#[derive(Debug, Serialize)]
pub struct ConfirmUploadResponse {
    /// The new image's id.
    pub image_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// Request body for PUT /{project_id}/images/{image_id}/selection.
#[derive(Debug, Deserialize)]
pub struct SetSelectionRequest {
    /// Section to adopt the image for; required when selecting.
    #[serde(default)]
    pub section_id: Option<Uuid>,
    /// Adopt or drop the image.
    pub is_selected: bool,
}

/// Request body for PUT /{project_id}/images/{image_id}/comment.
#[derive(Debug, Deserialize)]
pub struct SetCommentRequest {
    /// The new comment; empty clears it.
    pub comment: String,
}

/// POST /{project_id}/images/upload-slot
#[instrument(skip_all, fields(project_id = %project_id))]
async fn request_upload_slot(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    Json(request): Json<UploadSlotRequest>,
) -> Result<Json<UploadSlotResponse>, ApiError> {
    let command = commands::RequestUploadSlot {
        correlation_id: Uuid::new_v4(),
        project_id,
        filename: request.filename,
        content_type: request.content_type,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling request_upload_slot command");

    let target = command_handlers::handle_request_upload_slot(
        &command,
        &*state.object_storage,
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    Ok(Json(UploadSlotResponse {
        upload_url: target.upload_url,
        storage_key: target.key,
        public_url: target.public_url,
    }))
}

/// POST /{project_id}/images
#[instrument(skip_all, fields(project_id = %project_id))]
async fn confirm_upload(
    State(state): State<AppState>,
    caller: Caller,
    Path(project_id): Path<Uuid>,
    Json(request): Json<ConfirmUploadRequest>,
) -> Result<(StatusCode, Json<ConfirmUploadResponse>), ApiError> {
    let command = commands::ConfirmUpload {
        correlation_id: Uuid::new_v4(),
        project_id,
        image_id: Uuid::new_v4(),
        storage_key: request.storage_key,
        section_id: request.section_id,
        uploader_name: caller.session.map(|session| session.display_name),
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling confirm_upload command");

    let result = command_handlers::handle_confirm_upload(
        &command,
        &*state.object_storage,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state
        .feed
        .publish(DeltaKind::Image, project_id, Some(command.image_id));
    Ok((
        StatusCode::CREATED,
        Json(ConfirmUploadResponse {
            image_id: command.image_id,
            event_ids: result.stored_events.iter().map(|e| e.event_id).collect(),
        }),
    ))
}

/// GET /{project_id}/images
#[instrument(skip_all, fields(project_id = %project_id))]
async fn list_images(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<ImageView>>, ApiError> {
    let images = query_handlers::list_images(project_id, &*state.event_repository).await?;
    Ok(Json(images))
}

/// GET /{project_id}/images/selected
#[instrument(skip_all, fields(project_id = %project_id))]
async fn list_selected(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<SelectedImageView>>, ApiError> {
    let images = query_handlers::list_selected(
        project_id,
        &*state.event_repository,
        &*state.display_names,
    )
    .await?;
    Ok(Json(images))
}

/// GET /{project_id}/images/{image_id}
#[instrument(skip_all, fields(project_id = %project_id, image_id = %image_id))]
async fn get_image(
    State(state): State<AppState>,
    Path((project_id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ImageView>, ApiError> {
    let image = query_handlers::get_image(project_id, image_id, &*state.event_repository).await?;
    Ok(Json(image))
}

/// PUT /{project_id}/images/{image_id}/selection
#[instrument(skip_all, fields(project_id = %project_id, image_id = %image_id))]
async fn set_selection(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, image_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SetSelectionRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::SetImageSelection {
        correlation_id: Uuid::new_v4(),
        project_id,
        image_id,
        section_id: request.section_id,
        is_selected: request.is_selected,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling set_image_selection command");

    let result = command_handlers::handle_set_image_selection(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state.feed.publish(DeltaKind::Image, project_id, Some(image_id));
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// PUT /{project_id}/images/{image_id}/comment
#[instrument(skip_all, fields(project_id = %project_id, image_id = %image_id))]
async fn set_comment(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, image_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<SetCommentRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::SetImageComment {
        correlation_id: Uuid::new_v4(),
        project_id,
        image_id,
        comment: request.comment,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling set_image_comment command");

    let result = command_handlers::handle_set_image_comment(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state.feed.publish(DeltaKind::Image, project_id, Some(image_id));
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// DELETE /{project_id}/images/{image_id}
#[instrument(skip_all, fields(project_id = %project_id, image_id = %image_id))]
async fn delete_image(
    State(state): State<AppState>,
    caller: Caller,
    Path((project_id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::DeleteImage {
        correlation_id: Uuid::new_v4(),
        project_id,
        image_id,
        actor: caller.actor,
    };

    info!(correlation_id = %command.correlation_id, "handling delete_image command");

    let result = command_handlers::handle_delete_image(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await
    .map_err(ApiError::for_actor(&command.actor))?;

    state.feed.publish(DeltaKind::Image, project_id, Some(image_id));
    Ok(Json(CommandResponse::new(result.aggregate_id, &result.stored_events)))
}

/// Returns the router for the image curation context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{project_id}/images/upload-slot",
            post(request_upload_slot),
        )
        .route(
            "/{project_id}/images",
            get(list_images).post(confirm_upload),
        )
        .route("/{project_id}/images/selected", get(list_selected))
        .route(
            "/{project_id}/images/{image_id}",
            get(get_image).delete(delete_image),
        )
        .route("/{project_id}/images/{image_id}/selection", put(set_selection))
        .route("/{project_id}/images/{image_id}/comment", put(set_comment))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use kitchen_project::domain::phase::Phase;
    use serde_json::{Value, json};

    use super::*;
    use crate::routes::test_helpers::{seed_project, send_json};
    use crate::state::testing::{CHAIR, MEMBER, test_state};

    async fn upload(
        state: &AppState,
        project_id: Uuid,
        section_id: Option<Uuid>,
        user: &str,
    ) -> Uuid {
        let (status, slot) = send_json(
            router().with_state(state.clone()),
            "POST",
            &format!("/{project_id}/images/upload-slot"),
            Some(user),
            Some(json!({ "filename": "dish.PNG", "content_type": "image/png" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, confirmed) = send_json(
            router().with_state(state.clone()),
            "POST",
            &format!("/{project_id}/images"),
            Some(user),
            Some(json!({ "storage_key": slot["storage_key"], "section_id": section_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        confirmed["image_id"].as_str().unwrap().parse().unwrap()
    }

    async fn select(
        state: &AppState,
        project_id: Uuid,
        image_id: Uuid,
        section_id: Uuid,
    ) -> StatusCode {
        let (status, _) = send_json(
            router().with_state(state.clone()),
            "PUT",
            &format!("/{project_id}/images/{image_id}/selection"),
            Some(MEMBER),
            Some(json!({ "section_id": section_id, "is_selected": true })),
        )
        .await;
        status
    }

    #[tokio::test]
    async fn test_upload_slot_issues_a_project_scoped_key() {
        // Arrange
        let state = test_state();
        let (project_id, _) = seed_project(&state, "A", Phase::ImageUpload).await;

        // Act
        let (status, slot) = send_json(
            router().with_state(state),
            "POST",
            &format!("/{project_id}/images/upload-slot"),
            Some(MEMBER),
            Some(json!({ "filename": "dish.PNG", "content_type": "image/png" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        let key = slot["storage_key"].as_str().unwrap();
        assert!(key.starts_with(&format!("cooking-images/{project_id}/")));
        assert!(key.ends_with(".png"));
        assert_eq!(slot["public_url"], format!("https://images.test/{key}"));
        assert!(slot["upload_url"].as_str().unwrap().contains(key));
    }

    #[tokio::test]
    async fn test_anonymous_upload_slot_returns_401() {
        let state = test_state();
        let (project_id, _) = seed_project(&state, "A", Phase::ImageUpload).await;

        let (status, _) = send_json(
            router().with_state(state),
            "POST",
            &format!("/{project_id}/images/upload-slot"),
            None,
            Some(json!({ "filename": "dish.png", "content_type": "image/png" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_uploads_are_closed_while_cooking() {
        let state = test_state();
        let (project_id, _) = seed_project(&state, "A", Phase::Cooking).await;

        let (status, _) = send_json(
            router().with_state(state),
            "POST",
            &format!("/{project_id}/images/upload-slot"),
            Some(MEMBER),
            Some(json!({ "filename": "dish.png", "content_type": "image/png" })),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_confirmed_upload_appears_in_the_pool() {
        // Arrange
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A\n\nB", Phase::ImageUpload).await;

        // Act
        let image_id = upload(&state, project_id, Some(ids[1]), MEMBER).await;

        // Assert
        let (_, images) = send_json(
            router().with_state(state),
            "GET",
            &format!("/{project_id}/images"),
            None,
            None,
        )
        .await;
        assert_eq!(images.as_array().unwrap().len(), 1);
        assert_eq!(images[0]["image_id"], image_id.to_string());
        assert_eq!(images[0]["section_id"], ids[1].to_string());
        assert_eq!(images[0]["is_selected"], false);
        assert_eq!(images[0]["uploaded_by"], MEMBER);
    }

    #[tokio::test]
    async fn test_foreign_storage_key_is_rejected() {
        let state = test_state();
        let (project_id, _) = seed_project(&state, "A", Phase::ImageUpload).await;

        let (status, _) = send_json(
            router().with_state(state),
            "POST",
            &format!("/{project_id}/images"),
            Some(MEMBER),
            Some(json!({ "storage_key": format!("cooking-images/{}/x.jpg", Uuid::new_v4()) })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_selection_opens_only_in_image_selection() {
        // Arrange
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A", Phase::ImageUpload).await;
        let image_id = upload(&state, project_id, Some(ids[0]), MEMBER).await;

        // Act
        let during_upload = select(&state, project_id, image_id, ids[0]).await;
        send_json(
            crate::routes::projects::router().with_state(state.clone()),
            "POST",
            &format!("/{project_id}/phase"),
            Some(CHAIR),
            Some(json!({ "phase": "image_selection" })),
        )
        .await;
        let during_selection = select(&state, project_id, image_id, ids[0]).await;

        // Assert
        assert_eq!(during_upload, StatusCode::FORBIDDEN);
        assert_eq!(during_selection, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_selected_images_are_labelled_with_display_names() {
        // Arrange
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A\n\nB", Phase::ImageSelection).await;
        let first = upload(&state, project_id, Some(ids[1]), MEMBER).await;
        let second = upload(&state, project_id, Some(ids[0]), MEMBER).await;
        select(&state, project_id, first, ids[1]).await;
        select(&state, project_id, second, ids[0]).await;

        // Act
        let response = crate::routes::test_helpers::send(
            router().with_state(state.clone()),
            "GET",
            &format!("/{project_id}/images/selected"),
            None,
            None,
        )
        .await;

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let selected: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(selected[0]["image_id"], second.to_string());
        assert_eq!(selected[0]["section_index"], 0);
        assert_eq!(selected[1]["section_index"], 1);
        // No name header was sent, so the id doubles as the name.
        assert_eq!(selected[0]["uploader_name"], MEMBER);
    }

    #[tokio::test]
    async fn test_upload_is_filed_under_the_session_display_name() {
        // Arrange
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A", Phase::ImageSelection).await;
        let (_, slot) = send_json(
            router().with_state(state.clone()),
            "POST",
            &format!("/{project_id}/images/upload-slot"),
            Some(MEMBER),
            Some(json!({ "filename": "dish.jpg", "content_type": "image/jpeg" })),
        )
        .await;
        let body = json!({ "storage_key": slot["storage_key"], "section_id": ids[0] });
        let request = axum::http::Request::builder()
            .method("POST")
            .uri(format!("/{project_id}/images"))
            .header("x-user-id", MEMBER)
            .header("x-user-name", "Alice Adams")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        // Act
        let response = tower::ServiceExt::oneshot(router().with_state(state.clone()), request)
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let confirmed: Value = serde_json::from_slice(&bytes).unwrap();
        let image_id: Uuid = confirmed["image_id"].as_str().unwrap().parse().unwrap();
        select(&state, project_id, image_id, ids[0]).await;

        // Assert
        let (_, selected) = send_json(
            router().with_state(state),
            "GET",
            &format!("/{project_id}/images/selected"),
            None,
            None,
        )
        .await;
        assert_eq!(selected[0]["uploader_name"], "Alice Adams");
    }

    #[tokio::test]
    async fn test_only_the_uploader_or_chair_may_comment() {
        // Arrange
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A", Phase::ImageUpload).await;
        let image_id = upload(&state, project_id, Some(ids[0]), MEMBER).await;
        let uri = format!("/{project_id}/images/{image_id}/comment");

        // Act
        let (stranger, _) = send_json(
            router().with_state(state.clone()),
            "PUT",
            &uri,
            Some("bob"),
            Some(json!({ "comment": "meh" })),
        )
        .await;
        let (owner, _) = send_json(
            router().with_state(state.clone()),
            "PUT",
            &uri,
            Some(MEMBER),
            Some(json!({ "comment": "crop left" })),
        )
        .await;

        // Assert
        assert_eq!(stranger, StatusCode::FORBIDDEN);
        assert_eq!(owner, StatusCode::OK);
        let (_, image) = send_json(
            router().with_state(state),
            "GET",
            &format!("/{project_id}/images/{image_id}"),
            None,
            None,
        )
        .await;
        assert_eq!(image["comment"], "crop left");
    }

    #[tokio::test]
    async fn test_chair_deletes_any_image() {
        let state = test_state();
        let (project_id, ids) = seed_project(&state, "A", Phase::ImageUpload).await;
        let image_id = upload(&state, project_id, Some(ids[0]), MEMBER).await;

        let (status, _) = send_json(
            router().with_state(state.clone()),
            "DELETE",
            &format!("/{project_id}/images/{image_id}"),
            Some(CHAIR),
            None,
        )
        .await;
        let (after, _) = send_json(
            router().with_state(state),
            "GET",
            &format!("/{project_id}/images/{image_id}"),
            None,
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(after, StatusCode::NOT_FOUND);
    }
}
