use crate::api::tasks::{CreateTaskRequest, TaskResponse, UpdateTaskRequest};
use crate::TASKS_API;
use reqwest::{self, StatusCode};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Task not found")]
    NotFound(Uuid),

    #[error("Unexpected server error: {0}")]
    ServerError(String),
}

pub async fn create_task(
    base_url: &str,
    task: CreateTaskRequest,
) -> Result<TaskResponse, TaskError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TASKS_API}", base_url);
    let response = client.post(url).json(&task).send().await?;

    let created = response.error_for_status()?.json::<TaskResponse>().await?;
    Ok(created)
}

/// One position-ordered page of a project's tasks.
pub async fn fetch_tasks(
    base_url: &str,
    project_id: Uuid,
    page: i64,
    limit: i64,
) -> Result<Vec<TaskResponse>, TaskError> {
    let url = format!(
        "{}/{TASKS_API}?projectId={}&page={}&limit={}",
        base_url, project_id, page, limit
    );
    let response = reqwest::get(url).await?.error_for_status()?;
    let tasks = response.json::<Vec<TaskResponse>>().await?;
    Ok(tasks)
}

pub async fn update_task(
    base_url: &str,
    id: Uuid,
    changes: UpdateTaskRequest,
) -> Result<TaskResponse, TaskError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TASKS_API}/{}", base_url, id);
    let response = client.patch(url).json(&changes).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(TaskError::NotFound(id));
    }

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(TaskError::ServerError(error_text));
    }

    let task = response.json::<TaskResponse>().await?;
    Ok(task)
}

pub async fn delete_task(base_url: &str, id: Uuid) -> Result<(), TaskError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{TASKS_API}/{}", base_url, id);
    let response = client.delete(url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(TaskError::NotFound(id));
    }

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(TaskError::ServerError(error_text));
    }

    Ok(())
}
