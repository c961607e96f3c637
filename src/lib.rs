pub mod api;
pub mod board;
pub mod client;
pub mod schema;
pub mod tables;
pub const BASE_URL: &str = "http://localhost:36170";
pub const PROJECTS_API: &str = "api/projects";
pub const NOTES_API: &str = "api/notes";
pub const TASKS_API: &str = "api/tasks";
pub const IMAGES_API: &str = "api/images";
pub const DASHBOARD_API: &str = "api/dashboard";
pub const UPLOADS_DIR: &str = "uploads";
