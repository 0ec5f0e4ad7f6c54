use axum::{
    Router,
    routing::{get, post},
};

pub mod accounts;
pub mod notes;
pub mod system;

/// Router for all authenticated (principal-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/notes", get(notes::list_notes))
        .route("/notes/new", post(notes::create_note))
        .route("/note/:id", get(notes::get_note))
        .route("/note/:id/update", post(notes::update_note))
        .route("/note/:id/delete", post(notes::delete_note))
}

/// Router for endpoints reachable without a credential.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(accounts::router())
}
