use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_LENGTH,
};
use bytes::Bytes;

use super::dto::UserBody;
use crate::error::ApiError;

/// Reads a `{email, name}` body whose length is declared up front.
pub struct UserPayload(pub UserBody);

#[async_trait]
impl<S> FromRequest<S> for UserPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let declared = req
            .headers()
            .get(CONTENT_LENGTH)
            .ok_or_else(|| ApiError::Body("missing Content-Length".into()))?
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .ok_or_else(|| ApiError::Body("invalid Content-Length".into()))?;

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::Body(e.body_text()))?;

        if body.len() != declared {
            return Err(ApiError::Body(format!(
                "read {} bytes, Content-Length declared {declared}",
                body.len()
            )));
        }

        let user = serde_json::from_slice::<UserBody>(&body)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(UserPayload(user))
    }
}
