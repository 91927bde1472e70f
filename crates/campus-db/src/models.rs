/// Database row types. These map directly to SQLite rows.
/// Distinct from campus-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub college: String,
    pub created_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub kind: String,
    pub sender_id: String,
    pub sender_username: String,
    pub college: Option<String>,
    pub receiver_id: Option<String>,
    pub receiver_username: Option<String>,
    pub text: String,
    pub created_at: String,
}

pub struct BookRow {
    pub id: String,
    pub kind: String,
    pub owner_id: String,
    pub owner_username: String,
    pub title: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub reason: Option<String>,
    pub accepted: bool,
    pub accepted_by: Option<String>,
    pub accepted_by_username: Option<String>,
    pub created_at: String,
}

pub struct EventRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub starts_at: String,
    pub link: String,
    pub media_url: String,
    pub created_at: String,
}

pub struct ResourceRow {
    pub id: String,
    pub title: String,
    pub link: String,
    pub subject: String,
    pub created_by: Option<String>,
    pub created_at: String,
}
