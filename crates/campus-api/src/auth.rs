use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::CookieJar;
use campus_db::DbError;
use campus_db::models::UserRow;
use campus_types::api::{LoginRequest, MessageBody, ProfileResponse, RegisterRequest};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::rows::parse_id;
use crate::state::{AppState, AppStateInner, blocking};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let req = validate_registration(req)?;
    let user_id = Uuid::new_v4();
    let username = req.username.clone();

    blocking(&state, move |s| {
        let hash = s
            .passwords
            .hash(&req.password)
            .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))?;

        s.db.create_user(
            &user_id.to_string(),
            &req.username,
            &req.email,
            &hash,
            &req.college,
        )
        .map_err(|e| match e {
            DbError::DuplicateKey(_) => ApiError::Conflict("Username or email already taken"),
            other => ApiError::from(other),
        })
    })
    .await?;

    info!("Registered user {} ({})", username, user_id);
    Ok((StatusCode::CREATED, Json(MessageBody::new("Registered"))))
}

/// Unknown username and wrong password get the same answer.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<MessageBody>), ApiError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("Missing fields".into()));
    }

    let user_id = blocking(&state, move |s| {
        let Some(user) = s.db.get_user_by_username(req.username.trim())? else {
            s.passwords.verify_unknown(&req.password);
            debug!("Login for unknown user {}", req.username.trim());
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
        };

        if !s.passwords.verify(&req.password, &user.password) {
            debug!("Password mismatch for {}", user.username);
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
        }

        Ok(parse_id(&user.id)?)
    })
    .await?;

    let token = state
        .sessions
        .issue(user_id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!("User {} logged in", user_id);
    let cookie = state.cookies.session_cookie(token, state.sessions.ttl());
    Ok((jar.add(cookie), Json(MessageBody::new("Logged in"))))
}

/// Clears the client cookie. The token itself stays valid until expiry.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<MessageBody>) {
    (
        jar.add(state.cookies.cleared_cookie()),
        Json(MessageBody::new("Logged out")),
    )
}

pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let row = blocking(&state, move |s| load_user(s, user.id)).await?;

    Ok(Json(ProfileResponse {
        username: row.username,
        college: row.college,
    }))
}

/// The caller's full record. A vanished account is treated like a bad token.
pub(crate) fn load_user(s: &AppStateInner, id: Uuid) -> Result<UserRow, ApiError> {
    s.db.get_user_by_id(&id.to_string())?
        .ok_or(ApiError::Unauthorized("Invalid token"))
}

fn validate_registration(req: RegisterRequest) -> Result<RegisterRequest, ApiError> {
    let req = RegisterRequest {
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        password: req.password,
        college: req.college.trim().to_string(),
    };

    if req.username.is_empty() || req.email.is_empty() || req.password.is_empty() || req.college.is_empty() {
        return Err(ApiError::Validation("Missing fields".into()));
    }
    let len = req.username.chars().count();
    if !(3..=32).contains(&len) || req.username.chars().any(char::is_whitespace) {
        return Err(ApiError::Validation(
            "Username must be 3-32 characters without spaces".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(ApiError::Validation("Invalid email".into()));
    }

    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str, college: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            college: college.into(),
        }
    }

    #[test]
    fn registration_fields_are_trimmed() {
        let req = validate_registration(request(" alice ", "a@x.com ", "p1", " MIT")).unwrap();
        assert_eq!(req.username, "alice");
        assert_eq!(req.email, "a@x.com");
        assert_eq!(req.college, "MIT");
    }

    #[test]
    fn registration_rejects_bad_shapes() {
        assert!(validate_registration(request("alice", "a@x.com", "", "MIT")).is_err());
        assert!(validate_registration(request("al", "a@x.com", "p1", "MIT")).is_err());
        assert!(validate_registration(request("al ice", "a@x.com", "p1", "MIT")).is_err());
        assert!(validate_registration(request("alice", "ax.com", "p1", "MIT")).is_err());
        assert!(validate_registration(request("alice", "a@x.com", "p1", "  ")).is_err());
    }
}
