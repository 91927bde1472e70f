use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::session::{SESSION_COOKIE, SessionError};
use crate::state::{AppState, blocking};

/// Identity of the caller, inserted by `require_auth`. Handlers load the full
/// user row only when they need it.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Session check for protected routes. Reads the `token` cookie, falling back
/// to an `Authorization: Bearer` header.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(req.headers()))
        .ok_or(ApiError::Unauthorized("Not authenticated"))?;

    let user_id = blocking(&state, move |s| {
        s.sessions
            .verify(&s.db, Some(token.as_str()))
            .map_err(|e| match e {
                SessionError::Store(e) => ApiError::from(e),
                other => {
                    debug!("Rejected session: {}", other);
                    ApiError::Unauthorized("Invalid token")
                }
            })
    })
    .await?;

    req.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}
