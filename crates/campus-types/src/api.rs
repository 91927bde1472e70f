use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BookKind, ChatKind};

// -- Session Claims --

/// Claims carried by the session token. The token is stateless: nothing about
/// it is stored server-side, so it stays valid until `exp` even after logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Every non-collection response body, including all errors.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// -- Auth --

/// Fields default to empty so a missing field reaches validation and gets the
/// same "Missing fields" answer as an empty one.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub college: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub username: String,
    pub college: String,
}

// -- Users --

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
}

// -- Chat --

#[derive(Debug, Default, Deserialize)]
pub struct SendChatRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    pub id: Uuid,
    pub kind: ChatKind,
    pub sender: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver: Option<UserSummary>,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactResponse {
    pub username: String,
}

// -- Books --

#[derive(Debug, Default, Deserialize)]
pub struct LendBookRequest {
    #[serde(default)]
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BorrowBookRequest {
    #[serde(default)]
    pub title: String,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: Uuid,
    pub kind: BookKind,
    pub owner: UserSummary,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub reason: Option<String>,
    pub accepted: bool,
    pub accepted_by: Option<UserSummary>,
    pub created_at: DateTime<Utc>,
}

// -- Events --

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    pub datetime: DateTime<Utc>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub media_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub desc: String,
    pub datetime: DateTime<Utc>,
    pub link: String,
    pub media_url: String,
    pub created_at: DateTime<Utc>,
}

// -- Resources --

#[derive(Debug, Default, Deserialize)]
pub struct CreateResourceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub subject: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResourceResponse {
    pub id: Uuid,
    pub title: String,
    pub link: String,
    pub subject: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
