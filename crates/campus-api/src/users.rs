use axum::{
    Extension, Json,
    extract::{Query, State},
};
use campus_types::api::{UserSearchQuery, UserSummary};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::rows::user_summary;
use crate::state::{AppState, blocking};

const SEARCH_LIMIT: u32 = 10;

/// Username suggestions for starting a one-to-one chat.
pub async fn search_users(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    let term = query.search.unwrap_or_default().trim().to_string();

    let rows = blocking(&state, move |s| Ok(s.db.search_users(&term, SEARCH_LIMIT)?)).await?;
    let users = rows
        .into_iter()
        .map(user_summary)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(users))
}
