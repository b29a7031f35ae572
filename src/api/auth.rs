use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::api::response::ApiError;
use crate::api::AppState;
use crate::authorization::{decode_actor, Actor};
use crate::error::GovernanceError;

/// The caller, decoded from an `Authorization: Bearer <jwt>` header.
pub struct AuthActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for AuthActor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                GovernanceError::AuthenticationError("Missing Authorization header".to_string())
            })?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                GovernanceError::AuthenticationError("Expected a bearer token".to_string())
            })?;

        Ok(AuthActor(decode_actor(token, &state.jwt_secret)?))
    }
}
