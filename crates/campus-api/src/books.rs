use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use campus_db::DbError;
use campus_db::board::NewBook;
use campus_db::models::BookRow;
use campus_types::api::{BookResponse, BorrowBookRequest, LendBookRequest};
use campus_types::models::BookKind;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::rows::{parse_id, parse_time, summary};
use crate::state::{AppState, blocking};

/// Public feed, newest first.
pub async fn get_books(State(state): State<AppState>) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let rows = blocking(&state, |s| Ok(s.db.get_books()?)).await?;
    let books = rows
        .into_iter()
        .map(to_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(books))
}

pub async fn post_lend(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<LendBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = required_title(&req.title)?;

    let row = blocking(&state, move |s| {
        let id = Uuid::new_v4().to_string();
        let owner = user.id.to_string();
        Ok(s.db.create_book(&NewBook {
            id: &id,
            kind: BookKind::Lend,
            owner_id: &owner,
            title: &title,
            author: optional(&req.author),
            description: optional(&req.description),
            reason: None,
        })?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(to_response(row)?)))
}

pub async fn post_borrow(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<BorrowBookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = required_title(&req.title)?;

    let row = blocking(&state, move |s| {
        let id = Uuid::new_v4().to_string();
        let owner = user.id.to_string();
        Ok(s.db.create_book(&NewBook {
            id: &id,
            kind: BookKind::Borrow,
            owner_id: &owner,
            title: &title,
            author: None,
            description: None,
            reason: optional(&req.reason),
        })?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(to_response(row)?)))
}

/// Only borrow requests can be accepted.
pub async fn accept_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResponse>, ApiError> {
    let row = blocking(&state, move |s| {
        s.db.accept_borrow_request(&book_id.to_string(), &user.id.to_string())?
            .ok_or(ApiError::NotFound("Not found"))
    })
    .await?;

    info!("Borrow request {} accepted by {}", book_id, user.id);
    Ok(Json(to_response(row)?))
}

fn required_title(title: &str) -> Result<String, ApiError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ApiError::Validation("Title is required".into()));
    }
    Ok(title.to_string())
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn to_response(row: BookRow) -> Result<BookResponse, DbError> {
    let kind: BookKind = row
        .kind
        .parse()
        .map_err(|e: String| DbError::Corrupt(format!("book {}: {}", row.id, e)))?;

    let accepted_by = match (&row.accepted_by, row.accepted_by_username) {
        (Some(id), Some(username)) => Some(summary(id, username)?),
        _ => None,
    };

    Ok(BookResponse {
        id: parse_id(&row.id)?,
        kind,
        owner: summary(&row.owner_id, row.owner_username)?,
        title: row.title,
        author: row.author,
        description: row.description,
        reason: row.reason,
        accepted: row.accepted,
        accepted_by,
        created_at: parse_time(&row.created_at)?,
    })
}
