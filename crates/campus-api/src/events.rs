use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use campus_db::DbError;
use campus_db::board::NewEvent;
use campus_db::models::EventRow;
use campus_types::api::{CreateEventRequest, EventResponse};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::rows::{parse_id, parse_time};
use crate::state::{AppState, blocking};

pub async fn get_events(State(state): State<AppState>) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let rows = blocking(&state, |s| Ok(s.db.get_events()?)).await?;
    let events = rows
        .into_iter()
        .map(to_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(events))
}

/// `media_url` points at media already hosted elsewhere; nothing is uploaded here.
pub async fn create_event(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() || req.desc.trim().is_empty() {
        return Err(ApiError::Validation("Title and description are required".into()));
    }

    let row = blocking(&state, move |s| {
        let id = Uuid::new_v4().to_string();
        Ok(s.db.create_event(&NewEvent {
            id: &id,
            title: req.title.trim(),
            description: req.desc.trim(),
            starts_at: req.datetime,
            link: req.link.trim(),
            media_url: req.media_url.trim(),
        })?)
    })
    .await?;

    info!("Event {} created by {}", row.id, user.id);
    Ok((StatusCode::CREATED, Json(to_response(row)?)))
}

fn to_response(row: EventRow) -> Result<EventResponse, DbError> {
    Ok(EventResponse {
        id: parse_id(&row.id)?,
        title: row.title,
        desc: row.description,
        datetime: parse_time(&row.starts_at)?,
        link: row.link,
        media_url: row.media_url,
        created_at: parse_time(&row.created_at)?,
    })
}
