use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use notes_core::Note;

use crate::app::dto::{MessageResponse, NoteCreatedResponse, NoteRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn list_notes(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(services.list_notes(&principal).await?))
}

pub async fn create_note(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    body: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let note = services.create_note(&principal, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(NoteCreatedResponse {
            message: "Note created successfully",
            id: note.id,
        }),
    ))
}

pub async fn get_note(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(services.get_note(&principal, &id).await?))
}

pub async fn update_note(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    body: Result<Json<NoteRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(body) = body?;
    services.update_note(&principal, &id, body).await?;
    Ok(Json(MessageResponse::new("Note updated successfully")))
}

pub async fn delete_note(
    Extension(services): Extension<Arc<AppServices>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    services.delete_note(&principal, &id).await?;
    Ok(Json(MessageResponse::new("Note deleted successfully")))
}
