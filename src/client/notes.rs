use crate::api::notes::{CreateNoteRequest, NoteResponse, UpdateNoteRequest};
use crate::tables::NoteStatus;
use crate::NOTES_API;
use reqwest::{self, StatusCode};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Note not found")]
    NotFound(Uuid),

    #[error("Unexpected server error: {0}")]
    ServerError(String),
}

pub async fn create_note(
    base_url: &str,
    note: CreateNoteRequest,
) -> Result<NoteResponse, NoteError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{NOTES_API}", base_url);
    let response = client.post(url).json(&note).send().await?;

    let created = response.error_for_status()?.json::<NoteResponse>().await?;
    Ok(created)
}

pub async fn fetch_notes(base_url: &str, project_id: Uuid) -> Result<Vec<NoteResponse>, NoteError> {
    let url = format!("{}/{NOTES_API}?projectId={}", base_url, project_id);
    let response = reqwest::get(url).await?.error_for_status()?;
    let notes = response.json::<Vec<NoteResponse>>().await?;
    Ok(notes)
}

pub async fn update_note(
    base_url: &str,
    id: Uuid,
    changes: UpdateNoteRequest,
) -> Result<NoteResponse, NoteError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{NOTES_API}/{}", base_url, id);
    let response = client.patch(url).json(&changes).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(NoteError::NotFound(id));
    }

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(NoteError::ServerError(error_text));
    }

    let note = response.json::<NoteResponse>().await?;
    Ok(note)
}

/// Moves a note to another status column. The server refreshes the project's
/// cached progress as part of the same request.
pub async fn move_note(
    base_url: &str,
    id: Uuid,
    status: NoteStatus,
) -> Result<NoteResponse, NoteError> {
    update_note(
        base_url,
        id,
        UpdateNoteRequest {
            status: Some(status),
            ..Default::default()
        },
    )
    .await
}

pub async fn delete_note(base_url: &str, id: Uuid) -> Result<(), NoteError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{NOTES_API}/{}", base_url, id);
    let response = client.delete(url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(NoteError::NotFound(id));
    }

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(NoteError::ServerError(error_text));
    }

    Ok(())
}
