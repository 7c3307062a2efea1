use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::http::HeaderName;
use uuid::Uuid;

use crate::http::AppError;
use crate::AppState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

pub const USER_ID_HEADER: HeaderName = HeaderName::from_static("user-id");

/// Bearer token wins over the `user-id` header. The header is only honoured
/// when the deployment trusts its upstream to set it.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
            let token = auth_header
                .to_str()
                .ok()
                .and_then(bearer_token)
                .filter(|token| !token.is_empty())
                .ok_or_else(|| AppError::unauthorized("invalid Authorization header"))?;

            let session = state
                .tokens
                .authenticate_access_token(token)
                .map_err(|err| {
                    tracing::error!(error = ?err, "failed to authenticate access token");
                    AppError::internal("failed to authenticate")
                })?;

            let session = session.ok_or_else(|| AppError::unauthorized("invalid token"))?;
            return Ok(AuthUser {
                user_id: session.user_id,
            });
        }

        if state.trust_user_id_header {
            if let Some(value) = parts.headers.get(USER_ID_HEADER) {
                let user_id = value
                    .to_str()
                    .ok()
                    .and_then(|value| Uuid::parse_str(value.trim()).ok())
                    .ok_or_else(|| AppError::unauthorized("invalid user-id header"))?;
                return Ok(AuthUser { user_id });
            }
        }

        Err(AppError::unauthorized("authentication required"))
    }
}

/// Auth schemes compare case-insensitively.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
}
