use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use tracing::instrument;

use super::{
    extractors::UserPayload,
    services::{execute, UserReply, UserRequest},
};
use crate::{error::ApiError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    UserPayload(body): UserPayload,
) -> Result<UserReply, ApiError> {
    execute(state.store.as_ref(), UserRequest::Create(body)).await
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<UserReply, ApiError> {
    execute(state.store.as_ref(), UserRequest::List).await
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<UserReply, ApiError> {
    execute(state.store.as_ref(), UserRequest::Get(id)).await
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    UserPayload(body): UserPayload,
) -> Result<UserReply, ApiError> {
    execute(state.store.as_ref(), UserRequest::Update(id, body)).await
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<UserReply, ApiError> {
    execute(state.store.as_ref(), UserRequest::Delete(id)).await
}
