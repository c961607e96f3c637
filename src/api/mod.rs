use crate::tables::{Image, NewProject, Project};
use crate::{DASHBOARD_API, PROJECTS_API};
pub mod auth;
pub mod images;
pub mod notes;
mod state;
pub mod tasks;

use auth::CurrentUser;
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use axum_extra::response::ErasedJson;
use bigdecimal::BigDecimal;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use state::{AppState, Pool};
use std::collections::HashSet;
use tokio::fs;
use tokio::time::{self, Duration};
use tracing::{error, info, warn};
use uuid::Uuid;

// Request/Response types
#[derive(Deserialize, Serialize)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Serialize, Default, AsChangeset)]
#[diesel(table_name = crate::schema::projects)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct DashboardResponse {
    pub total_projects: i64,
    pub completed_projects: i64,
    pub total_notes: i64,
    pub total_tasks: i64,
}

#[derive(Serialize)]
struct DeleteResponse {
    message: String,
    deleted_id: Uuid,
}

pub fn create_router(pool: Pool) -> Router {
    let state = AppState::new(pool);

    // Spawn cleanup task
    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_secs(24 * 60 * 60)); // 24 hours
            loop {
                interval.tick().await;
                cleanup_orphaned_uploads(state.clone()).await;
            }
        });
    }

    let max_body_size = 50 * 1024 * 1024; // image uploads only, keep the cap modest

    Router::new()
        .merge(images::create_router())
        .merge(notes::create_router())
        .merge(tasks::create_router())
        .route(
            format!("/{PROJECTS_API}").as_str(),
            get(list_projects).post(create_project),
        )
        .route(
            format!("/{PROJECTS_API}/:id").as_str(),
            get(get_project).patch(update_project).delete(delete_project),
        )
        .route(format!("/{DASHBOARD_API}").as_str(), get(dashboard_stats))
        .layer(DefaultBodyLimit::max(max_body_size))
        .with_state(state)
}

async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<Json<Project>, StatusCode> {
    use crate::schema::projects;

    let new_project = NewProject {
        user_id,
        title: &payload.title,
        description: payload.description.as_deref(),
    };

    let mut conn = state
        .pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let project = diesel::insert_into(projects::table)
        .values(&new_project)
        .get_result::<Project>(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(project))
}

async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<ErasedJson, StatusCode> {
    use crate::schema::projects;

    let mut conn = state
        .pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let results = projects::table
        .filter(projects::user_id.eq(user_id))
        .order(projects::created_at.asc())
        .select(Project::as_select())
        .load::<Project>(&mut conn)
        .map_err(|err| {
            error!("Failed to load projects: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(ErasedJson::pretty(results))
}

async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Project>, StatusCode> {
    use crate::schema::projects;

    let mut conn = state
        .pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let project = projects::table
        .find(project_id)
        .select(Project::as_select())
        .first::<Project>(&mut conn)
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Ok(Json(project))
}

async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, StatusCode> {
    use crate::schema::projects;

    let mut conn = state
        .pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let project = diesel::update(projects::table.find(project_id))
        .set(&payload)
        .get_result::<Project>(&mut conn)
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Ok(Json(project))
}

/// Every image blob under the project goes first; a storage failure aborts
/// with nothing deleted. The row delete then cascades through notes, tasks
/// and image records in one statement.
async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, StatusCode> {
    use crate::schema::{images, notes, projects, tasks};

    let mut conn = state
        .pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let attachments = images::table
        .inner_join(tasks::table.inner_join(notes::table))
        .filter(notes::project_id.eq(project_id))
        .select(Image::as_select())
        .load::<Image>(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    for image in &attachments {
        self::images::remove_blob(&image.image_url)
            .await
            .map_err(|err| {
                error!("Failed to remove blob {}: {}", image.image_url, err);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
    }

    let result = diesel::delete(projects::table.find(project_id))
        .execute(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result > 0 {
        let response = DeleteResponse {
            message: format!("Project {} successfully deleted", project_id),
            deleted_id: project_id,
        };
        Ok((StatusCode::OK, Json(response)))
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn dashboard_stats(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, StatusCode> {
    use crate::schema::{notes, projects, tasks};

    let mut conn = state
        .pool
        .get()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let total_projects = projects::table
        .count()
        .get_result::<i64>(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // A project counts as completed when every note is Completed, which is
    // the only way the cached percentage reaches 100 exactly.
    let completed_projects = projects::table
        .filter(projects::progress.eq(BigDecimal::from(100)))
        .count()
        .get_result::<i64>(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let total_notes = notes::table
        .count()
        .get_result::<i64>(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let total_tasks = tasks::table
        .count()
        .get_result::<i64>(&mut conn)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(DashboardResponse {
        total_projects,
        completed_projects,
        total_notes,
        total_tasks,
    }))
}

/// Deletes upload-dir files that no image row references and logs rows whose
/// file has gone missing. Runs daily; keeps the blob store consistent with
/// cascade deletes that removed rows without touching disk.
async fn cleanup_orphaned_uploads(state: AppState) {
    info!("Starting orphaned upload cleanup");

    let mut conn = match state.pool.get() {
        Ok(conn) => conn,
        Err(err) => {
            error!("Failed to get database connection for cleanup: {}", err);
            return;
        }
    };

    let rows = match crate::schema::images::table.load::<Image>(&mut conn) {
        Ok(rows) => rows,
        Err(err) => {
            error!("Failed to load image records: {}", err);
            return;
        }
    };

    let base_path = images::upload_dir();
    if let Err(err) = fs::create_dir_all(&base_path).await {
        error!("Failed to create upload directory: {}", err);
        return;
    }

    let known: HashSet<&str> = rows.iter().map(|row| row.image_url.as_str()).collect();

    let mut entries = match fs::read_dir(&base_path).await {
        Ok(entries) => entries,
        Err(err) => {
            error!("Failed to read upload directory: {}", err);
            return;
        }
    };

    let mut removed = 0usize;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        if !known.contains(name.as_str()) {
            match fs::remove_file(entry.path()).await {
                Ok(()) => {
                    removed += 1;
                    info!("Removed orphaned upload: {}", name);
                }
                Err(err) => warn!("Failed to remove orphaned upload {}: {}", name, err),
            }
        }
    }

    for row in &rows {
        if !base_path.join(&row.image_url).exists() {
            warn!("Image {} has no file at {}", row.id, row.image_url);
        }
    }

    info!("Upload cleanup finished, {} orphaned files removed", removed);
}
