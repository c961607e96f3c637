use crate::api::auth::USER_ID_HEADER;
use crate::api::{CreateProjectRequest, DashboardResponse, UpdateProjectRequest};
use crate::tables::Project;
use crate::{DASHBOARD_API, PROJECTS_API};
use reqwest::{self, StatusCode};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Project not found")]
    NotFound(Uuid),

    #[error("Unexpected server error: {0}")]
    ServerError(String),
}

pub async fn create_project(
    base_url: &str,
    user_id: Uuid,
    project: CreateProjectRequest,
) -> Result<Project, ProjectError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{PROJECTS_API}", base_url);
    let response = client
        .post(url)
        .header(USER_ID_HEADER, user_id.to_string())
        .json(&project)
        .send()
        .await?;

    let created = response.error_for_status()?.json::<Project>().await?;
    Ok(created)
}

pub async fn fetch_projects(base_url: &str, user_id: Uuid) -> Result<Vec<Project>, ProjectError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{PROJECTS_API}", base_url);
    let response = client
        .get(url)
        .header(USER_ID_HEADER, user_id.to_string())
        .send()
        .await?
        .error_for_status()?;

    let projects = response.json::<Vec<Project>>().await?;
    Ok(projects)
}

pub async fn fetch_project(base_url: &str, id: Uuid) -> Result<Project, ProjectError> {
    let url = format!("{}/{PROJECTS_API}/{}", base_url, id);
    let response = reqwest::get(url).await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(ProjectError::NotFound(id));
    }

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ProjectError::ServerError(error_text));
    }

    let project = response.json::<Project>().await?;
    Ok(project)
}

pub async fn update_project(
    base_url: &str,
    id: Uuid,
    changes: UpdateProjectRequest,
) -> Result<Project, ProjectError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{PROJECTS_API}/{}", base_url, id);
    let response = client.patch(url).json(&changes).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(ProjectError::NotFound(id));
    }

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ProjectError::ServerError(error_text));
    }

    let project = response.json::<Project>().await?;
    Ok(project)
}

pub async fn delete_project(base_url: &str, id: Uuid) -> Result<(), ProjectError> {
    let client = reqwest::Client::new();
    let url = format!("{}/{PROJECTS_API}/{}", base_url, id);
    let response = client.delete(url).send().await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(ProjectError::NotFound(id));
    }

    if !response.status().is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ProjectError::ServerError(error_text));
    }

    Ok(())
}

pub async fn fetch_dashboard(base_url: &str) -> Result<DashboardResponse, ProjectError> {
    let url = format!("{}/{DASHBOARD_API}", base_url);
    let response = reqwest::get(url).await?.error_for_status()?;
    let stats = response.json::<DashboardResponse>().await?;
    Ok(stats)
}
