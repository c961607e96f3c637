use super::images::remove_blob;
use super::AppState;
use crate::tables::{Image, NewTask, Task, TaskStatus};
use crate::TASKS_API;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("task not found")]
    NotFound,

    #[error("projectId query parameter is required")]
    MissingProjectId,

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),

    #[error("Internal server error")]
    InternalServerError,
}

impl IntoResponse for TaskError {
    fn into_response(self) -> Response {
        let status_code = match self {
            TaskError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TaskError::NotFound => StatusCode::NOT_FOUND,
            TaskError::MissingProjectId => StatusCode::BAD_REQUEST,
            TaskError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TaskError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status_code, self.to_string()).into_response()
    }
}

#[derive(Deserialize, Serialize)]
pub struct CreateTaskRequest {
    pub note_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Deserialize, Serialize, Default, AsChangeset)]
#[diesel(table_name = crate::schema::tasks)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub position: Option<i32>,
}

#[derive(Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub note_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub position: Option<i32>,
    pub created_at: Option<chrono::NaiveDateTime>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            note_id: task.note_id,
            title: task.title,
            description: task.description,
            status: task.status,
            position: task.position,
            created_at: task.created_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksParams {
    pub project_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
struct DeleteResponse {
    message: String,
    deleted_id: Uuid,
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            format!("/{TASKS_API}").as_str(),
            get(list_tasks).post(create_task),
        )
        .route(
            format!("/{TASKS_API}/:id").as_str(),
            patch(update_task).delete(delete_task),
        )
}

/// A project's tasks in display order, one fixed-size page at a time. Tasks
/// hang off notes, so project membership goes through the note join.
async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<ListTasksParams>,
) -> Result<Json<Vec<TaskResponse>>, TaskError> {
    use crate::schema::{notes, tasks};

    let project_id = params.project_id.ok_or(TaskError::MissingProjectId)?;
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).max(1);

    let mut conn = state
        .pool
        .get()
        .map_err(|_| TaskError::InternalServerError)?;

    let results = tasks::table
        .inner_join(notes::table)
        .filter(notes::project_id.eq(project_id))
        .order(tasks::position.asc())
        .limit(limit)
        .offset((page - 1) * limit)
        .select(Task::as_select())
        .load::<Task>(&mut conn)?;

    Ok(Json(results.into_iter().map(Into::into).collect()))
}

async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<Json<TaskResponse>, TaskError> {
    use crate::schema::tasks;

    let new_task = NewTask {
        note_id: payload.note_id,
        title: &payload.title,
        description: payload.description.as_deref(),
        status: payload.status.unwrap_or(TaskStatus::ToDo),
    };

    let mut conn = state
        .pool
        .get()
        .map_err(|_| TaskError::InternalServerError)?;

    let task = diesel::insert_into(tasks::table)
        .values(&new_task)
        .get_result::<Task>(&mut conn)?;

    Ok(Json(task.into()))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, TaskError> {
    use crate::schema::tasks;

    let mut conn = state
        .pool
        .get()
        .map_err(|_| TaskError::InternalServerError)?;

    let task = diesel::update(tasks::table.find(task_id))
        .set(&payload)
        .get_result::<Task>(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => TaskError::NotFound,
            _ => TaskError::DatabaseError(err),
        })?;

    Ok(Json(task.into()))
}

/// Attached image blobs are removed before any row delete; a storage failure
/// aborts the whole request so the database never references a half-deleted
/// task. Row-level cleanup then rides on the FK cascade.
async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, TaskError> {
    use crate::schema::{images, tasks};

    let mut conn = state
        .pool
        .get()
        .map_err(|_| TaskError::InternalServerError)?;

    let attachments = images::table
        .filter(images::task_id.eq(task_id))
        .select(Image::as_select())
        .load::<Image>(&mut conn)?;

    for image in &attachments {
        remove_blob(&image.image_url).await?;
    }

    let result = diesel::delete(tasks::table.find(task_id)).execute(&mut conn)?;

    if result > 0 {
        let response = DeleteResponse {
            message: format!("Task {} successfully deleted", task_id),
            deleted_id: task_id,
        };
        Ok((StatusCode::OK, Json(response)))
    } else {
        Err(TaskError::NotFound)
    }
}
