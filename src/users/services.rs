use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, info};

use super::dto::{User, UserBody};
use crate::{error::ApiError, store::DocumentStore};

pub const COLLECTION: &str = "users";

/// One inbound call against the users collection, as decided by routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRequest {
    Create(UserBody),
    List,
    Get(String),
    Update(String, UserBody),
    Delete(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserReply {
    Created(String),
    Listed(Vec<User>),
    Empty,
    Found(User),
    Updated,
    Deleted,
}

/// Runs exactly one store operation for `req`.
pub async fn execute(store: &dyn DocumentStore, req: UserRequest) -> Result<UserReply, ApiError> {
    match req {
        UserRequest::Create(body) => {
            let data = to_document(&body)?;
            let id = store.add(COLLECTION, data).await?;
            info!(%id, "user created");
            Ok(UserReply::Created(id))
        }
        UserRequest::List => {
            let docs = store.list(COLLECTION).await?;
            if docs.is_empty() {
                return Ok(UserReply::Empty);
            }
            let users = docs
                .iter()
                .map(User::from_document)
                .collect::<Result<Vec<_>, _>>()?;
            debug!(count = users.len(), "users listed");
            Ok(UserReply::Listed(users))
        }
        UserRequest::Get(id) => {
            let doc = store.get(COLLECTION, &id).await?;
            Ok(UserReply::Found(User::from_document(&doc)?))
        }
        UserRequest::Update(id, body) => {
            let data = to_document(&body)?;
            store.set(COLLECTION, &id, data).await?;
            info!(%id, "user updated");
            Ok(UserReply::Updated)
        }
        UserRequest::Delete(id) => {
            store.delete(COLLECTION, &id).await?;
            info!(%id, "user deleted");
            Ok(UserReply::Deleted)
        }
    }
}

fn to_document(body: &UserBody) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))
}

fn json_response<T: Serialize>(value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(e) => ApiError::Encode(e.to_string()).into_response(),
    }
}

impl IntoResponse for UserReply {
    fn into_response(self) -> Response {
        match self {
            UserReply::Created(id) => format!("success: id is {id}\n").into_response(),
            UserReply::Listed(users) => json_response(&users),
            UserReply::Empty => StatusCode::NO_CONTENT.into_response(),
            UserReply::Found(user) => json_response(&user),
            UserReply::Updated => "success updating\n".into_response(),
            UserReply::Deleted => "success deleting\n".into_response(),
        }
    }
}
