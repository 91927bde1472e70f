pub mod auth;
pub mod books;
pub mod chat;
pub mod contacts;
pub mod error;
pub mod events;
pub mod extract;
pub mod middleware;
pub mod password;
pub mod resources;
pub mod session;
pub mod state;
pub mod users;

mod rows;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
};

use crate::middleware::require_auth;
use crate::state::AppState;

/// Full HTTP surface. Routes in `protected` go through the session check;
/// the rest are public.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", get(auth::logout).post(auth::logout))
        .route("/api/books", get(books::get_books))
        .route("/api/events", get(events::get_events))
        .route("/api/resources", get(resources::get_resources))
        .route("/health", get(|| async { "ok" }));

    let protected = Router::new()
        .route("/api/auth/user", get(auth::current_user))
        .route("/api/users", get(users::search_users))
        .route("/api/chat/global", get(chat::get_global).post(chat::send_global))
        .route("/api/chat/group", get(chat::get_group).post(chat::send_group))
        .route("/api/chat/one-to-one/contacts", get(contacts::get_contacts))
        .route(
            "/api/chat/one-to-one/{username}",
            get(chat::get_conversation).post(chat::send_direct),
        )
        .route("/api/books/lend", post(books::post_lend))
        .route("/api/books/borrow", post(books::post_borrow))
        .route("/api/books/accept/{id}", patch(books::accept_request))
        .route("/api/events", post(events::create_event))
        .route("/api/resources", post(resources::add_resource))
        .layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
}
