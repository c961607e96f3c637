use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use uuid::Uuid;

/// Header the upstream identity/session provider sets on every request it
/// lets through. The API never resolves sessions itself.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the caller, resolved once per request from [`USER_ID_HEADER`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "x-user-id header is required"))?;

        let user_id = value
            .parse::<Uuid>()
            .map_err(|_| (StatusCode::UNAUTHORIZED, "x-user-id header must be a UUID"))?;

        Ok(CurrentUser(user_id))
    }
}
