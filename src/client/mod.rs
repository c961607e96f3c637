pub mod board;
pub mod images;
pub mod notes;
pub mod projects;
pub mod sync;
pub mod tasks;
pub use crate::api::images::ImageResponse;
pub use crate::api::notes::{CreateNoteRequest, NoteResponse, UpdateNoteRequest};
pub use crate::api::tasks::{CreateTaskRequest, TaskResponse, UpdateTaskRequest};
pub use crate::api::{CreateProjectRequest, DashboardResponse, UpdateProjectRequest};
// Re-export the modules
pub use board::*;
pub use images::*;
pub use notes::*;
pub use projects::*;
pub use sync::*;
pub use tasks::*;
