use campus_db::models::UserRow;
use campus_db::{DbError, parse_timestamp};
use campus_types::api::UserSummary;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, DbError> {
    raw.parse()
        .map_err(|e| DbError::Corrupt(format!("id '{}': {}", raw, e)))
}

pub(crate) fn parse_time(raw: &str) -> Result<DateTime<Utc>, DbError> {
    parse_timestamp(raw)
}

pub(crate) fn summary(id: &str, username: String) -> Result<UserSummary, DbError> {
    Ok(UserSummary {
        id: parse_id(id)?,
        username,
    })
}

pub(crate) fn user_summary(row: UserRow) -> Result<UserSummary, DbError> {
    summary(&row.id, row.username)
}
