use super::images::remove_blob;
use super::AppState;
use crate::board;
use crate::tables::{Image, NewNote, Note, NoteStatus};
use crate::NOTES_API;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("note not found")]
    NotFound,

    #[error("projectId query parameter is required")]
    MissingProjectId,

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for NoteError {
    fn into_response(self) -> Response {
        let status_code = match self {
            NoteError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            NoteError::NotFound => StatusCode::NOT_FOUND,
            NoteError::MissingProjectId => StatusCode::BAD_REQUEST,
            NoteError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            NoteError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status_code, self.to_string()).into_response()
    }
}

#[derive(Deserialize, Serialize)]
pub struct CreateNoteRequest {
    pub project_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: Option<NoteStatus>,
}

#[derive(Deserialize, Serialize, Default, AsChangeset)]
#[diesel(table_name = crate::schema::notes)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<NoteStatus>,
}

#[derive(Serialize, Deserialize)]
pub struct NoteResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: NoteStatus,
    pub created_at: Option<chrono::NaiveDateTime>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            project_id: note.project_id,
            title: note.title,
            content: note.content,
            status: note.status,
            created_at: note.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesParams {
    pub project_id: Option<Uuid>,
}

#[derive(Serialize)]
struct DeleteResponse {
    message: String,
    deleted_id: Uuid,
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            format!("/{NOTES_API}").as_str(),
            get(list_notes).post(create_note),
        )
        .route(
            format!("/{NOTES_API}/:id").as_str(),
            patch(update_note).delete(delete_note),
        )
}

async fn list_notes(
    State(state): State<AppState>,
    Query(params): Query<ListNotesParams>,
) -> Result<Json<Vec<NoteResponse>>, NoteError> {
    use crate::schema::notes;

    let project_id = params.project_id.ok_or(NoteError::MissingProjectId)?;

    let mut conn = state
        .pool
        .get()
        .map_err(|_| NoteError::InternalServerError)?;

    let results = notes::table
        .filter(notes::project_id.eq(project_id))
        .order(notes::created_at.asc())
        .select(Note::as_select())
        .load::<Note>(&mut conn)?;

    Ok(Json(results.into_iter().map(Into::into).collect()))
}

async fn create_note(
    State(state): State<AppState>,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<Json<NoteResponse>, NoteError> {
    use crate::schema::notes;

    let new_note = NewNote {
        project_id: payload.project_id,
        title: &payload.title,
        content: &payload.content,
        status: payload.status.unwrap_or(NoteStatus::ToDo),
    };

    let mut conn = state
        .pool
        .get()
        .map_err(|_| NoteError::InternalServerError)?;

    let note = diesel::insert_into(notes::table)
        .values(&new_note)
        .get_result::<Note>(&mut conn)?;

    Ok(Json(note.into()))
}

/// Partial update. When the status column changes the project's cached
/// progress is recomputed from all of its notes, in the same transaction as
/// the note write.
async fn update_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>, NoteError> {
    use crate::schema::{notes, projects};

    let mut conn = state
        .pool
        .get()
        .map_err(|_| NoteError::InternalServerError)?;

    let note = conn
        .transaction::<Note, DieselError, _>(|conn| {
            let before = notes::table
                .find(note_id)
                .select(Note::as_select())
                .first::<Note>(conn)?;

            let after = diesel::update(notes::table.find(note_id))
                .set(&payload)
                .get_result::<Note>(conn)?;

            if before.status != after.status {
                let statuses = notes::table
                    .filter(notes::project_id.eq(after.project_id))
                    .select(notes::status)
                    .load::<NoteStatus>(conn)?;

                diesel::update(projects::table.find(after.project_id))
                    .set(projects::progress.eq(board::project_progress(&statuses)))
                    .execute(conn)?;
            }

            Ok(after)
        })
        .map_err(|err| match err {
            DieselError::NotFound => NoteError::NotFound,
            _ => NoteError::DatabaseError(err),
        })?;

    Ok(Json(note.into()))
}

/// Image blobs under the note's tasks are removed first; any storage failure
/// aborts before the row delete. The cascade then drops tasks and image rows
/// together with the note.
async fn delete_note(
    State(state): State<AppState>,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse, NoteError> {
    use crate::schema::{images, notes, tasks};

    let mut conn = state
        .pool
        .get()
        .map_err(|_| NoteError::InternalServerError)?;

    let attachments = images::table
        .inner_join(tasks::table)
        .filter(tasks::note_id.eq(note_id))
        .select(Image::as_select())
        .load::<Image>(&mut conn)?;

    for image in &attachments {
        remove_blob(&image.image_url).await?;
    }

    let result = diesel::delete(notes::table.find(note_id)).execute(&mut conn)?;

    if result > 0 {
        let response = DeleteResponse {
            message: format!("Note {} successfully deleted", note_id),
            deleted_id: note_id,
        };
        Ok((StatusCode::OK, Json(response)))
    } else {
        Err(NoteError::NotFound)
    }
}
