//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use kitchen_api::feed::ChangeFeed;
use kitchen_api::identity::USER_ID_HEADER;
use kitchen_api::routes;
use kitchen_api::state::AppState;
use kitchen_core::access::Role;
use kitchen_export::archive::ZipArchiveWriter;
use kitchen_store::pg_event_repository::PgEventRepository;
use kitchen_store::pg_presence_repository::PgPresenceRepository;
use kitchen_test_support::{FixedClock, StaticRoleDirectory, StubImageFetcher, StubObjectStorage};
use sqlx::PgPool;
use tower::ServiceExt;

/// Chair of every project created through these helpers.
pub const CHAIR: &str = "carol";
/// A regular contributor.
pub const MEMBER: &str = "alice";

/// Build the full app router backed by PostgreSQL, with a fixed clock and
/// stub storage. Uses the same route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let presence = Arc::new(PgPresenceRepository::new(pool.clone()));
    let app_state = AppState {
        clock: Arc::new(FixedClock::at_fixed_now()),
        event_repository: Arc::new(PgEventRepository::new(pool)),
        presence_repository: presence.clone(),
        object_storage: Arc::new(StubObjectStorage::new()),
        image_fetcher: Arc::new(StubImageFetcher::new()),
        archive_writer: Arc::new(ZipArchiveWriter),
        role_directory: Arc::new(StaticRoleDirectory::new([(CHAIR, Role::Owner)])),
        display_names: presence,
        feed: Arc::new(ChangeFeed::new()),
    };
    routes::build_router(app_state)
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a POST request with a JSON body as `user` and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    user: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, user, Some(body)).await
}

/// Send a PUT request with a JSON body as `user` and return the response.
pub async fn put_json(
    app: Router,
    uri: &str,
    user: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PUT", uri, user, Some(body)).await
}

/// Send a GET request as `user` and return the response.
pub async fn get_json(
    app: Router,
    uri: &str,
    user: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, user, None).await
}

/// Send a DELETE request as `user` and return the response.
pub async fn delete(app: Router, uri: &str, user: Option<&str>) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, user, None).await
}
