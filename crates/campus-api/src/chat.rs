//! Poll-based chat in three modes: global, per-college group, one-to-one.
//! Every fetch re-reads the full history, oldest first.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use campus_db::DbError;
use campus_db::models::MessageRow;
use campus_db::queries::{MessageFilter, NewMessage};
use campus_types::api::{ChatMessageResponse, SendChatRequest};
use campus_types::models::ChatKind;
use tracing::info;
use uuid::Uuid;

use crate::auth::load_user;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::rows::{parse_id, parse_time, summary};
use crate::state::{AppState, AppStateInner, blocking};

// -- Global --

pub async fn get_global(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
) -> Result<Json<Vec<ChatMessageResponse>>, ApiError> {
    let rows = blocking(&state, |s| Ok(s.db.get_messages(&MessageFilter::Global)?)).await?;
    Ok(Json(to_responses(rows)?))
}

pub async fn send_global(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<SendChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = message_text(req)?;

    let row = blocking(&state, move |s| {
        let id = Uuid::new_v4().to_string();
        let sender = user.id.to_string();
        Ok(s.db.create_message(&NewMessage::global(&id, &sender, &text))?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(to_response(row)?)))
}

// -- Group --

/// Messages of the caller's current college.
pub async fn get_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<ChatMessageResponse>>, ApiError> {
    let rows = blocking(&state, move |s| {
        let me = load_user(s, user.id)?;
        Ok(s.db.get_messages(&MessageFilter::Group {
            college: &me.college,
        })?)
    })
    .await?;

    Ok(Json(to_responses(rows)?))
}

/// The college is copied from the sender's profile at send time.
pub async fn send_group(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<SendChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = message_text(req)?;

    let row = blocking(&state, move |s| {
        let me = load_user(s, user.id)?;
        let id = Uuid::new_v4().to_string();
        Ok(s.db.create_message(&NewMessage::group(&id, &me.id, &me.college, &text))?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(to_response(row)?)))
}

// -- One-to-one --

/// Conversation between the caller and `username`, both directions.
pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<Json<Vec<ChatMessageResponse>>, ApiError> {
    let rows = blocking(&state, move |s| {
        let other = resolve_user(s, &username)?;
        let me = user.id.to_string();
        Ok(s.db.get_messages(&MessageFilter::Direct {
            user_a: &me,
            user_b: &other,
        })?)
    })
    .await?;

    Ok(Json(to_responses(rows)?))
}

pub async fn send_direct(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(username): Path<String>,
    ApiJson(req): ApiJson<SendChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = message_text(req)?;

    let row = blocking(&state, move |s| {
        let receiver = resolve_user(s, &username)?;
        let sender = user.id.to_string();
        if receiver == sender {
            return Err(ApiError::Validation("Cannot message yourself".into()));
        }

        let id = Uuid::new_v4().to_string();
        Ok(s.db.create_message(&NewMessage::direct(&id, &sender, &receiver, &text))?)
    })
    .await?;

    info!("Direct message {} from {}", row.id, user.id);
    Ok((StatusCode::CREATED, Json(to_response(row)?)))
}

fn resolve_user(s: &AppStateInner, username: &str) -> Result<String, ApiError> {
    s.db.get_user_by_username(username)?
        .map(|u| u.id)
        .ok_or(ApiError::NotFound("User not found"))
}

fn message_text(req: SendChatRequest) -> Result<String, ApiError> {
    if req.text.trim().is_empty() {
        return Err(ApiError::Validation("Message text is required".into()));
    }
    Ok(req.text)
}

fn to_responses(rows: Vec<MessageRow>) -> Result<Vec<ChatMessageResponse>, DbError> {
    rows.into_iter().map(to_response).collect()
}

fn to_response(row: MessageRow) -> Result<ChatMessageResponse, DbError> {
    let kind: ChatKind = row
        .kind
        .parse()
        .map_err(|e: String| DbError::Corrupt(format!("message {}: {}", row.id, e)))?;

    let receiver = match (&row.receiver_id, row.receiver_username) {
        (Some(id), Some(username)) => Some(summary(id, username)?),
        _ => None,
    };

    Ok(ChatMessageResponse {
        id: parse_id(&row.id)?,
        kind,
        sender: summary(&row.sender_id, row.sender_username)?,
        college: row.college,
        receiver,
        text: row.text,
        created_at: parse_time(&row.created_at)?,
    })
}
