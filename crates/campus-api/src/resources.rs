use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use campus_db::DbError;
use campus_db::models::ResourceRow;
use campus_types::api::{CreateResourceRequest, ResourceResponse};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::rows::{parse_id, parse_time};
use crate::state::{AppState, blocking};

pub async fn get_resources(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResourceResponse>>, ApiError> {
    let rows = blocking(&state, |s| Ok(s.db.get_resources()?)).await?;
    let resources = rows
        .into_iter()
        .map(to_response)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(resources))
}

pub async fn add_resource(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateResourceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (title, link, subject) = (req.title.trim(), req.link.trim(), req.subject.trim());
    if title.is_empty() || link.is_empty() || subject.is_empty() {
        return Err(ApiError::Validation("Title, link and subject are required".into()));
    }
    let (title, link, subject) = (title.to_string(), link.to_string(), subject.to_string());

    let row = blocking(&state, move |s| {
        let id = Uuid::new_v4().to_string();
        Ok(s.db
            .create_resource(&id, &title, &link, &subject, &user.id.to_string())?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(to_response(row)?)))
}

fn to_response(row: ResourceRow) -> Result<ResourceResponse, DbError> {
    Ok(ResourceResponse {
        id: parse_id(&row.id)?,
        title: row.title,
        link: row.link,
        subject: row.subject,
        created_by: row.created_by.as_deref().map(parse_id).transpose()?,
        created_at: parse_time(&row.created_at)?,
    })
}
