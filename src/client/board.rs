use super::sync::Debouncer;
use super::tasks::{self, TaskError};
use crate::api::tasks::{TaskResponse, UpdateTaskRequest};
use crate::board::{move_card, BoardCard, DropTarget};
use crate::tables::TaskStatus;
use futures::future::join_all;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// How long the board stays quiet after the last drag before the
/// accumulated positions are written back.
pub const SYNC_QUIET_PERIOD: Duration = Duration::from_millis(500);

pub const TASKS_PER_PAGE: i64 = 10;

/// Client-held board state for one project.
///
/// Drags are applied optimistically and persisted through a debounced
/// write-back; a failed write is logged and the local state kept, so the
/// board can drift from the server until [`KanbanBoard::refresh`] runs.
pub struct KanbanBoard {
    base_url: String,
    project_id: Uuid,
    page: i64,
    cards: Vec<BoardCard>,
    sync: Debouncer,
}

impl KanbanBoard {
    /// Loads the first page of the project's tasks.
    pub async fn open(base_url: &str, project_id: Uuid) -> Result<Self, TaskError> {
        let tasks = tasks::fetch_tasks(base_url, project_id, 1, TASKS_PER_PAGE).await?;
        Ok(Self {
            base_url: base_url.to_string(),
            project_id,
            page: 1,
            cards: as_cards(tasks, 0),
            sync: Debouncer::new(SYNC_QUIET_PERIOD),
        })
    }

    pub fn cards(&self) -> &[BoardCard] {
        &self.cards
    }

    /// One column's cards in display order.
    pub fn column(&self, status: TaskStatus) -> Vec<&BoardCard> {
        let mut cards: Vec<&BoardCard> = self
            .cards
            .iter()
            .filter(|card| card.status == status)
            .collect();
        cards.sort_by_key(|card| card.position);
        cards
    }

    /// Applies a drag locally and, when something actually moved, schedules
    /// the debounced write-back of the whole list. A no-op drag schedules
    /// nothing.
    pub fn drop_card(&mut self, dragged: Uuid, target: DropTarget) -> bool {
        if !move_card(&mut self.cards, dragged, target) {
            return false;
        }

        let base_url = self.base_url.clone();
        let cards = self.cards.clone();
        self.sync.schedule(move || push_positions(base_url, cards));
        true
    }

    /// Appends the next page of tasks. Returns how many arrived.
    pub async fn load_more(&mut self) -> Result<usize, TaskError> {
        let tasks =
            tasks::fetch_tasks(&self.base_url, self.project_id, self.page + 1, TASKS_PER_PAGE)
                .await?;
        self.page += 1;

        let loaded = tasks.len();
        let offset = self.cards.len();
        self.cards.extend(as_cards(tasks, offset));
        Ok(loaded)
    }

    /// Reconciliation point: drops any pending write-back and reloads the
    /// authoritative server order from the first page.
    pub async fn refresh(&mut self) -> Result<(), TaskError> {
        self.sync.cancel();
        let tasks = tasks::fetch_tasks(&self.base_url, self.project_id, 1, TASKS_PER_PAGE).await?;
        self.page = 1;
        self.cards = as_cards(tasks, 0);
        Ok(())
    }

    /// Cancels any pending write-back without flushing it.
    pub fn close(&self) {
        self.sync.cancel();
    }
}

fn as_cards(tasks: Vec<TaskResponse>, offset: usize) -> Vec<BoardCard> {
    tasks
        .into_iter()
        .enumerate()
        .map(|(index, task)| BoardCard {
            id: task.id,
            title: task.title,
            status: task.status,
            // Unplaced tasks take their arrival index until the first drag.
            position: task.position.unwrap_or((offset + index) as i32),
        })
        .collect()
}

/// One PATCH per card carrying its current status and position. Failures
/// are logged and not retried; the server catches up on the next flush or
/// the board on the next refresh.
async fn push_positions(base_url: String, cards: Vec<BoardCard>) {
    let updates = cards.into_iter().map(|card| {
        let base_url = base_url.clone();
        async move {
            let changes = UpdateTaskRequest {
                status: Some(card.status),
                position: Some(card.position),
                ..Default::default()
            };
            if let Err(err) = tasks::update_task(&base_url, card.id, changes).await {
                warn!("Failed to sync task {}: {}", card.id, err);
            }
        }
    });

    join_all(updates).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(cards: Vec<BoardCard>) -> KanbanBoard {
        KanbanBoard {
            base_url: crate::BASE_URL.to_string(),
            project_id: Uuid::new_v4(),
            page: 1,
            cards,
            sync: Debouncer::new(SYNC_QUIET_PERIOD),
        }
    }

    fn card(status: TaskStatus, position: i32) -> BoardCard {
        BoardCard {
            id: Uuid::new_v4(),
            title: format!("card {}", position),
            status,
            position,
        }
    }

    #[tokio::test]
    async fn columns_come_back_in_position_order() {
        let board = board_with(vec![
            card(TaskStatus::ToDo, 3),
            card(TaskStatus::Completed, 1),
            card(TaskStatus::ToDo, 0),
            card(TaskStatus::ToDo, 2),
        ]);

        let todo = board.column(TaskStatus::ToDo);
        let positions: Vec<i32> = todo.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![0, 2, 3]);
        assert_eq!(board.column(TaskStatus::InProgress).len(), 0);
    }

    #[tokio::test]
    async fn a_failed_drag_schedules_no_sync() {
        let mut board = board_with(vec![card(TaskStatus::ToDo, 0)]);
        let before = board.cards().to_vec();

        assert!(!board.drop_card(Uuid::new_v4(), DropTarget::Column(TaskStatus::Completed)));
        assert_eq!(board.cards(), &before[..]);
    }

    #[test]
    fn server_rows_without_positions_take_their_arrival_index() {
        let rows = vec![
            TaskResponse {
                id: Uuid::new_v4(),
                note_id: Uuid::new_v4(),
                title: "placed".into(),
                description: None,
                status: TaskStatus::ToDo,
                position: Some(7),
                created_at: None,
            },
            TaskResponse {
                id: Uuid::new_v4(),
                note_id: Uuid::new_v4(),
                title: "unplaced".into(),
                description: None,
                status: TaskStatus::ToDo,
                position: None,
                created_at: None,
            },
        ];

        let cards = as_cards(rows, 10);
        assert_eq!(cards[0].position, 7);
        assert_eq!(cards[1].position, 11);
    }
}
