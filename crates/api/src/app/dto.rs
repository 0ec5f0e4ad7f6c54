use serde::{Deserialize, Serialize};

use notes_core::{NoteId, UserId};

// -------------------------
// Request DTOs
// -------------------------

/// Missing fields deserialize as empty and fail validation with a 400.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NoteRequest {
    pub title: String,
    pub content: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    pub message: &'static str,
    pub id: UserId,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    /// Only set under the bearer-token strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NoteCreatedResponse {
    pub message: &'static str,
    pub id: NoteId,
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user_id: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}
