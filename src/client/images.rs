use crate::api::images::ImageResponse;
use crate::IMAGES_API;
use reqwest::{self, StatusCode};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Image not found")]
    NotFound(Uuid),

    #[error("Unexpected server error: {0}")]
    ServerError(String),
}

/// Uploads image bytes for a task. The server stores the blob and returns
/// the row with its storage key.
pub async fn upload_image(
    base_url: &str,
    task_id: Uuid,
    filename: &str,
    data: Vec<u8>,
) -> Result<ImageResponse, ImageError> {
    let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_string());
    let form = reqwest::multipart::Form::new()
        .text("task_id", task_id.to_string())
        .part("file", part);

    let client = reqwest::Client::new();
    let url = format!("{}/{IMAGES_API}", base_url);
    let response = client.post(url).multipart(form).send().await?;

    let created = response.error_for_status()?.json::<ImageResponse>().await?;
    Ok(created)
}

pub async fn fetch_images(
    base_url: &str,
    project_id: Uuid,
) -> Result<Vec<ImageResponse>, ImageError> {
    let url = format!("{}/{IMAGES_API}?projectId={}", base_url, project_id);
    let response = reqwest::get(url).await?.error_for_status()?;
    let images = response.json::<Vec<ImageResponse>>().await?;
    Ok(images)
}

/// Public retrieval URL for a stored blob.
pub fn image_download_url(base_url: &str, storage_key: &str) -> String {
    format!("{}/{IMAGES_API}/download/{}", base_url, storage_key)
}

pub async fn delete_image(base_url: &str, id: Uuid) -> Result<(), ImageError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{IMAGES_API}/{}", base_url, id);
    let response = client.delete(url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(ImageError::NotFound(id));
    }

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ImageError::ServerError(error_text));
    }

    Ok(())
}
