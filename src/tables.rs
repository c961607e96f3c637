use bigdecimal::BigDecimal;
use diesel::deserialize::{self, FromSql};
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::{AsExpression, FromSqlRow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use uuid::Uuid;

/// Board workflow for notes. Tasks use the narrower [`TaskStatus`]; the two
/// sets are intentionally distinct and must not be unified.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
pub enum NoteStatus {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Testing,
    Completed,
}

impl NoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::ToDo => "To Do",
            NoteStatus::InProgress => "In Progress",
            NoteStatus::Testing => "Testing",
            NoteStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "To Do" => Ok(NoteStatus::ToDo),
            "In Progress" => Ok(NoteStatus::InProgress),
            "Testing" => Ok(NoteStatus::Testing),
            "Completed" => Ok(NoteStatus::Completed),
            other => Err(format!("unrecognized note status: {}", other)),
        }
    }
}

impl ToSql<Text, Pg> for NoteStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for NoteStatus {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        let label = std::str::from_utf8(bytes.as_bytes())?;
        label.parse().map_err(Into::into)
    }
}

/// Sub-workflow for tasks on the kanban board. Three states, no "Testing".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
pub enum TaskStatus {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "To Do" => Ok(TaskStatus::ToDo),
            "In Progress" => Ok(TaskStatus::InProgress),
            "Completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unrecognized task status: {}", other)),
        }
    }
}

impl ToSql<Text, Pg> for TaskStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for TaskStatus {
    fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
        let label = std::str::from_utf8(bytes.as_bytes())?;
        label.parse().map_err(Into::into)
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::projects)]
pub struct Project {
    pub id: Uuid,
    /// Subject id issued by the external identity provider.
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Cached percentage of the project's notes that are Completed, scale 2.
    pub progress: BigDecimal,
    pub created_at: Option<chrono::NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::projects)]
pub struct NewProject<'a> {
    pub user_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::notes)]
pub struct Note {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: NoteStatus,
    pub created_at: Option<chrono::NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::notes)]
pub struct NewNote<'a> {
    pub project_id: Uuid,
    pub title: &'a str,
    pub content: &'a str,
    pub status: NoteStatus,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::tasks)]
pub struct Task {
    pub id: Uuid,
    pub note_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    /// Dense zero-based rank within the board; NULL until the first drag.
    pub position: Option<i32>,
    pub created_at: Option<chrono::NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::tasks)]
pub struct NewTask<'a> {
    pub note_id: Uuid,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::images)]
pub struct Image {
    pub id: Uuid,
    pub task_id: Uuid,
    /// Storage key relative to the upload directory, not a full URL.
    pub image_url: String,
    pub uploaded_at: Option<chrono::NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::images)]
pub struct NewImage<'a> {
    pub task_id: Uuid,
    pub image_url: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_have_no_testing_column() {
        assert_eq!("Testing".parse::<NoteStatus>(), Ok(NoteStatus::Testing));
        assert!("Testing".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn statuses_serialize_as_their_display_labels() {
        let json = serde_json::to_string(&NoteStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
        let json = serde_json::to_string(&TaskStatus::ToDo).unwrap();
        assert_eq!(json, "\"To Do\"");
        assert_eq!("In Progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
    }
}
