use super::AppState;
use crate::tables::{Image, NewImage};
use crate::{IMAGES_API, UPLOADS_DIR};
use axum::extract::Multipart;
use axum::http::{header, HeaderName, HeaderValue};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("image not found")]
    NotFound,

    #[error("projectId query parameter is required")]
    MissingProjectId,

    #[error("task_id and file fields are required")]
    InvalidUpload,

    #[error("path is outside the upload directory")]
    Forbidden,

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for ImageError {
    fn into_response(self) -> Response {
        let status_code = match self {
            ImageError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ImageError::NotFound => StatusCode::NOT_FOUND,
            ImageError::MissingProjectId => StatusCode::BAD_REQUEST,
            ImageError::InvalidUpload => StatusCode::BAD_REQUEST,
            ImageError::Forbidden => StatusCode::FORBIDDEN,
            ImageError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ImageError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status_code, self.to_string()).into_response()
    }
}

#[derive(Serialize, Deserialize)]
pub struct ImageResponse {
    pub id: Uuid,
    pub task_id: Uuid,
    pub image_url: String,
    pub uploaded_at: Option<chrono::NaiveDateTime>,
}

impl From<Image> for ImageResponse {
    fn from(image: Image) -> Self {
        Self {
            id: image.id,
            task_id: image.task_id,
            image_url: image.image_url,
            uploaded_at: image.uploaded_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListImagesParams {
    pub project_id: Option<Uuid>,
}

#[derive(Serialize)]
struct DeleteResponse {
    message: String,
    deleted_id: Uuid,
}

/// The blob store root. Uploaded bytes live here under generated storage
/// keys; the database only holds the keys.
pub(crate) fn upload_dir() -> PathBuf {
    PathBuf::from(std::env::var("UPLOAD_DIR").unwrap_or_else(|_| UPLOADS_DIR.to_string()))
}

/// Removes a stored blob. A file that is already gone counts as removed so
/// cascade replays stay idempotent.
pub(crate) async fn remove_blob(storage_key: &str) -> std::io::Result<()> {
    match fs::remove_file(upload_dir().join(storage_key)).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            format!("/{IMAGES_API}").as_str(),
            get(list_images).post(upload_image),
        )
        .route(
            format!("/{IMAGES_API}/:id").as_str(),
            get(download_image).delete(delete_image),
        )
        .route(
            format!("/{IMAGES_API}/download/*filepath").as_str(),
            get(download_image_by_key),
        )
}

/// Multipart upload: a `task_id` field naming the owning task and a `file`
/// field with the bytes. The blob is written first; an orphaned blob from a
/// failed insert is reaped by the daily sweep.
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageResponse>, ImageError> {
    use crate::schema::images;

    let mut task_id: Option<Uuid> = None;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ImageError::InvalidUpload)?
    {
        match field.name() {
            Some("task_id") => {
                let value = field.text().await.map_err(|_| ImageError::InvalidUpload)?;
                task_id = Some(value.parse().map_err(|_| ImageError::InvalidUpload)?);
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let data = field.bytes().await.map_err(|_| ImageError::InvalidUpload)?;
                upload = Some((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    let task_id = task_id.ok_or(ImageError::InvalidUpload)?;
    let (filename, data) = upload.ok_or(ImageError::InvalidUpload)?;

    let base_path = upload_dir();
    fs::create_dir_all(&base_path).await?;

    let storage_key = format!(
        "{}-{}",
        Uuid::new_v4(),
        sanitize_filename::sanitize(&filename)
    );
    fs::write(base_path.join(&storage_key), &data).await?;

    let new_image = NewImage {
        task_id,
        image_url: &storage_key,
    };

    let mut conn = state
        .pool
        .get()
        .map_err(|_| ImageError::InternalServerError)?;

    let image = diesel::insert_into(images::table)
        .values(&new_image)
        .get_result::<Image>(&mut conn)?;

    Ok(Json(image.into()))
}

/// All images under a project. Images hang off tasks, so project membership
/// goes through the task and note joins.
async fn list_images(
    State(state): State<AppState>,
    Query(params): Query<ListImagesParams>,
) -> Result<Json<Vec<ImageResponse>>, ImageError> {
    use crate::schema::{images, notes, tasks};

    let project_id = params.project_id.ok_or(ImageError::MissingProjectId)?;

    let mut conn = state
        .pool
        .get()
        .map_err(|_| ImageError::InternalServerError)?;

    let results = images::table
        .inner_join(tasks::table.inner_join(notes::table))
        .filter(notes::project_id.eq(project_id))
        .order(images::uploaded_at.asc())
        .select(Image::as_select())
        .load::<Image>(&mut conn)?;

    Ok(Json(results.into_iter().map(Into::into).collect()))
}

async fn download_image(
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
) -> Result<impl IntoResponse, ImageError> {
    use crate::schema::images;

    let mut conn = state
        .pool
        .get()
        .map_err(|_| ImageError::InternalServerError)?;

    let image = images::table
        .find(image_id)
        .select(Image::as_select())
        .first::<Image>(&mut conn)
        .map_err(|_| ImageError::NotFound)?;

    serve_blob(&image.image_url).await
}

async fn download_image_by_key(
    State(_state): State<AppState>,
    Path(filepath): Path<String>,
) -> Result<impl IntoResponse, ImageError> {
    serve_blob(&filepath).await
}

async fn serve_blob(storage_key: &str) -> Result<impl IntoResponse, ImageError> {
    // Keys never leave the upload directory
    if storage_key.split('/').any(|part| part == "..") {
        return Err(ImageError::Forbidden);
    }

    let file_path = upload_dir().join(storage_key);
    if !file_path.starts_with(upload_dir()) {
        return Err(ImageError::Forbidden);
    }

    if !file_path.exists() {
        return Err(ImageError::NotFound);
    }

    let file_data = fs::read(&file_path).await?;

    let mime_type = mime_guess::from_path(&file_path)
        .first_or_octet_stream()
        .to_string();

    let display_filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");

    let headers: [(HeaderName, HeaderValue); 2] = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_str(&mime_type).unwrap(),
        ),
        (
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&format!("attachment; filename=\"{}\"", display_filename))
                .unwrap(),
        ),
    ];

    Ok((headers, file_data))
}

/// Storage first, row second: if the blob cannot be removed the row stays so
/// the record keeps pointing at the bytes.
async fn delete_image(
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
) -> Result<impl IntoResponse, ImageError> {
    use crate::schema::images;

    let mut conn = state
        .pool
        .get()
        .map_err(|_| ImageError::InternalServerError)?;

    let image = images::table
        .find(image_id)
        .select(Image::as_select())
        .first::<Image>(&mut conn)
        .map_err(|_| ImageError::NotFound)?;

    remove_blob(&image.image_url).await?;

    diesel::delete(images::table.find(image_id)).execute(&mut conn)?;

    let response = DeleteResponse {
        message: format!("Image {} successfully deleted", image_id),
        deleted_id: image_id,
    };
    Ok((StatusCode::OK, Json(response)))
}
