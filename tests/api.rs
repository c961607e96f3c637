use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, StatusCode};
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use mindspace_rest_api::api;
use mindspace_rest_api::schema::{images, notes, tasks};
use mindspace_rest_api::tables::NewImage;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

fn setup() -> (TestServer, Pool) {
    dotenv::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create pool");

    let server =
        TestServer::new(api::create_router(pool.clone())).expect("Failed to build test server");
    (server, pool)
}

fn identity(user: Uuid) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user.to_string()).unwrap(),
    )
}

async fn create_project(server: &TestServer, user: Uuid, title: &str) -> Uuid {
    let (name, value) = identity(user);
    let response = server
        .post("/api/projects")
        .add_header(name, value)
        .json(&json!({ "title": title, "description": "integration fixture" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

async fn create_note(server: &TestServer, project_id: Uuid, title: &str) -> Uuid {
    let response = server
        .post("/api/notes")
        .json(&json!({
            "project_id": project_id,
            "title": title,
            "content": "note body"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

async fn create_task(server: &TestServer, note_id: Uuid, title: &str) -> Uuid {
    let response = server
        .post("/api/tasks")
        .json(&json!({ "note_id": note_id, "title": title }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn projects_require_an_identity_header() {
    let (server, _pool) = setup();

    let response = server
        .post("/api/projects")
        .json(&json!({ "title": "anonymous" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_project_crud() {
    let (server, _pool) = setup();
    let user = Uuid::new_v4();

    let project_id = create_project(&server, user, "CRUD project").await;

    // A fresh project starts with no progress
    let response = server.get(&format!("/api/projects/{}", project_id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["title"], "CRUD project");
    assert_eq!(body["progress"], "0");

    let response = server
        .patch(&format!("/api/projects/{}", project_id))
        .json(&json!({ "title": "Renamed project" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["title"], "Renamed project");

    let (name, value) = identity(user);
    let response = server.get("/api/projects").add_header(name, value).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let listed: Value = response.json();
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&project_id.to_string().as_str()));

    let response = server.delete(&format!("/api/projects/{}", project_id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.get(&format!("/api/projects/{}", project_id)).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tasks_paginate_in_position_order() {
    let (server, _pool) = setup();
    let user = Uuid::new_v4();

    let project_id = create_project(&server, user, "Pagination project").await;
    let note_id = create_note(&server, project_id, "Board note").await;

    for position in 0..25 {
        let task_id = create_task(&server, note_id, &format!("task {}", position)).await;
        let response = server
            .patch(&format!("/api/tasks/{}", task_id))
            .json(&json!({ "position": position }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let response = server
        .get(&format!("/api/tasks?projectId={}&page=2&limit=10", project_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let page: Value = response.json();
    let positions: Vec<i64> = page
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["position"].as_i64().unwrap())
        .collect();
    assert_eq!(positions, (10..20).collect::<Vec<i64>>());
}

#[tokio::test]
async fn unknown_projects_paginate_to_nothing() {
    let (server, _pool) = setup();

    let response = server
        .get(&format!("/api/tasks?projectId={}", Uuid::new_v4()))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let page: Value = response.json();
    assert_eq!(page.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn listing_tasks_without_a_project_is_a_client_error() {
    let (server, pool) = setup();

    let response = server.get("/api/tasks").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server.get("/api/images").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server.get("/api/notes").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // Same check against the raw service
    let router = api::create_router(pool);
    let response = router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/tasks")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn moving_notes_updates_the_cached_progress() {
    let (server, _pool) = setup();
    let user = Uuid::new_v4();

    let project_id = create_project(&server, user, "Progress project").await;
    let mut note_ids = Vec::new();
    for index in 0..4 {
        note_ids.push(create_note(&server, project_id, &format!("note {}", index)).await);
    }

    for (note_id, status) in [
        (note_ids[0], "Completed"),
        (note_ids[1], "Completed"),
        (note_ids[2], "In Progress"),
    ] {
        let response = server
            .patch(&format!("/api/notes/{}", note_id))
            .json(&json!({ "status": status }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], status);
    }

    // [Completed, Completed, In Progress, To Do] -> exactly half done
    let response = server.get(&format!("/api/projects/{}", project_id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["progress"], "50.00");
}

#[tokio::test]
async fn content_only_edits_leave_progress_alone() {
    let (server, _pool) = setup();
    let user = Uuid::new_v4();

    let project_id = create_project(&server, user, "Quiet project").await;
    let note_id = create_note(&server, project_id, "quiet note").await;

    let response = server
        .patch(&format!("/api/notes/{}", note_id))
        .json(&json!({ "content": "edited body" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = server.get(&format!("/api/projects/{}", project_id)).await;
    let body: Value = response.json();
    assert_eq!(body["progress"], "0");
}

#[tokio::test]
async fn deleting_a_project_cascades_to_every_descendant() {
    let (server, pool) = setup();
    let user = Uuid::new_v4();

    let project_id = create_project(&server, user, "Cascade project").await;

    let mut note_ids = Vec::new();
    let mut task_ids = Vec::new();
    for note_index in 0..2 {
        let note_id = create_note(&server, project_id, &format!("note {}", note_index)).await;
        note_ids.push(note_id);
        for task_index in 0..3 {
            task_ids.push(create_task(&server, note_id, &format!("task {}", task_index)).await);
        }
    }

    {
        let mut conn = pool.get().unwrap();
        for task_id in &task_ids {
            let key = format!("cascade-{}.png", Uuid::new_v4());
            diesel::insert_into(images::table)
                .values(&NewImage {
                    task_id: *task_id,
                    image_url: &key,
                })
                .execute(&mut conn)
                .unwrap();
        }
    }

    let response = server.delete(&format!("/api/projects/{}", project_id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let mut conn = pool.get().unwrap();
    let remaining_notes: i64 = notes::table
        .filter(notes::project_id.eq(project_id))
        .count()
        .get_result(&mut conn)
        .unwrap();
    let remaining_tasks: i64 = tasks::table
        .filter(tasks::note_id.eq_any(&note_ids))
        .count()
        .get_result(&mut conn)
        .unwrap();
    let remaining_images: i64 = images::table
        .filter(images::task_id.eq_any(&task_ids))
        .count()
        .get_result(&mut conn)
        .unwrap();

    assert_eq!(remaining_notes, 0);
    assert_eq!(remaining_tasks, 0);
    assert_eq!(remaining_images, 0);
}

#[tokio::test]
async fn missing_tasks_report_not_found() {
    let (server, _pool) = setup();

    let response = server
        .patch(&format!("/api/tasks/{}", Uuid::new_v4()))
        .json(&json!({ "status": "Completed" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server.delete(&format!("/api/tasks/{}", Uuid::new_v4())).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .patch(&format!("/api/notes/{}", Uuid::new_v4()))
        .json(&json!({ "content": "nobody home" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notes_track_the_four_state_workflow() {
    let (server, _pool) = setup();
    let user = Uuid::new_v4();

    let project_id = create_project(&server, user, "Testing column project").await;
    let note_id = create_note(&server, project_id, "qa note").await;

    let response = server
        .patch(&format!("/api/notes/{}", note_id))
        .json(&json!({ "status": "Testing" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "Testing");

    // Tasks have no Testing column
    let task_id = create_task(&server, note_id, "qa task").await;
    let response = server
        .patch(&format!("/api/tasks/{}", task_id))
        .json(&json!({ "status": "Testing" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn images_upload_and_delete_in_storage_first_order() {
    let upload_dir = tempfile::tempdir().unwrap();
    std::env::set_var("UPLOAD_DIR", upload_dir.path());

    let (server, _pool) = setup();
    let user = Uuid::new_v4();

    let project_id = create_project(&server, user, "Image project").await;
    let note_id = create_note(&server, project_id, "image note").await;
    let task_id = create_task(&server, note_id, "image task").await;

    let form = MultipartForm::new()
        .add_text("task_id", task_id.to_string())
        .add_part(
            "file",
            Part::bytes(vec![0x89, b'P', b'N', b'G']).file_name("shot.png"),
        );

    let response = server.post("/api/images").multipart(form).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    let image_id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();
    let storage_key = body["image_url"].as_str().unwrap();
    assert!(storage_key.ends_with("shot.png"));
    assert!(upload_dir.path().join(storage_key).exists());

    let response = server
        .get(&format!("/api/images?projectId={}", project_id))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let listed: Value = response.json();
    assert!(listed
        .as_array()
        .unwrap()
        .iter()
        .any(|image| image["id"] == body["id"]));

    let response = server.delete(&format!("/api/images/{}", image_id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(!upload_dir.path().join(storage_key).exists());

    let response = server
        .get(&format!("/api/images?projectId={}", project_id))
        .await;
    let listed: Value = response.json();
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn dashboard_counts_cover_created_records() {
    let (server, _pool) = setup();
    let user = Uuid::new_v4();

    let project_id = create_project(&server, user, "KPI project").await;
    let note_id = create_note(&server, project_id, "kpi note").await;
    create_task(&server, note_id, "kpi task").await;

    let response = server.get("/api/dashboard").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let stats: Value = response.json();
    assert!(stats["total_projects"].as_i64().unwrap() >= 1);
    assert!(stats["total_notes"].as_i64().unwrap() >= 1);
    assert!(stats["total_tasks"].as_i64().unwrap() >= 1);
}
