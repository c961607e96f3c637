//! Board logic shared by the API and the client: card reordering and the
//! cached project progress figure. Everything here is pure; persistence is
//! the caller's problem.

use crate::tables::{NoteStatus, TaskStatus};
use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A task as the kanban board holds it. Positions are dense, zero-based,
/// and span the whole list; columns sort their cards by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardCard {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub position: i32,
}

/// Where a drag ended: on another card, or in a column with no card under
/// the pointer (the empty-column sentinel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Card(Uuid),
    Column(TaskStatus),
}

/// Applies a single drag-and-drop intent to the card list.
///
/// The dragged card is removed from its current index and reinserted at the
/// target index (the end of the list for a column drop). Every card's
/// position is then rewritten to its new index, so positions stay dense with
/// no gaps or duplicates. When the destination column differs from the
/// card's current one, the card takes the destination status.
///
/// Returns `false` and leaves the list untouched when either id is unknown
/// or the card was dropped on itself; callers schedule a sync only on
/// `true`.
pub fn move_card(cards: &mut Vec<BoardCard>, dragged: Uuid, target: DropTarget) -> bool {
    let Some(from) = cards.iter().position(|card| card.id == dragged) else {
        return false;
    };

    let (to, destination_status) = match target {
        DropTarget::Card(over) => {
            if over == dragged {
                return false;
            }
            match cards.iter().position(|card| card.id == over) {
                Some(index) => (index, cards[index].status),
                None => return false,
            }
        }
        DropTarget::Column(status) => (cards.len() - 1, status),
    };

    let card = cards.remove(from);
    cards.insert(to, card);

    for (index, card) in cards.iter_mut().enumerate() {
        card.position = index as i32;
    }

    if cards[to].status != destination_status {
        cards[to].status = destination_status;
    }

    true
}

/// Percentage of notes that are Completed, rounded half-up to two decimals.
/// An empty set is 0.00 rather than a division by zero.
pub fn project_progress(statuses: &[NoteStatus]) -> BigDecimal {
    let total = statuses.len();
    if total == 0 {
        return BigDecimal::from(0).with_scale(2);
    }

    let completed = statuses
        .iter()
        .filter(|status| **status == NoteStatus::Completed)
        .count();

    (BigDecimal::from(completed as i64 * 100) / BigDecimal::from(total as i64))
        .with_scale_round(2, RoundingMode::HalfUp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: Uuid, status: TaskStatus, position: i32) -> BoardCard {
        BoardCard {
            id,
            title: format!("task {}", position),
            status,
            position,
        }
    }

    fn board() -> (Vec<BoardCard>, Vec<Uuid>) {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let cards = vec![
            card(ids[0], TaskStatus::ToDo, 0),
            card(ids[1], TaskStatus::ToDo, 1),
            card(ids[2], TaskStatus::InProgress, 2),
            card(ids[3], TaskStatus::InProgress, 3),
            card(ids[4], TaskStatus::Completed, 4),
        ];
        (cards, ids)
    }

    fn positions(cards: &[BoardCard]) -> Vec<i32> {
        cards.iter().map(|c| c.position).collect()
    }

    #[test]
    fn move_within_column_rewrites_positions_densely() {
        let (mut cards, ids) = board();

        assert!(move_card(&mut cards, ids[0], DropTarget::Card(ids[1])));

        assert_eq!(cards[0].id, ids[1]);
        assert_eq!(cards[1].id, ids[0]);
        assert_eq!(positions(&cards), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn positions_stay_dense_after_any_move() {
        let (mut cards, ids) = board();

        for (dragged, over) in [(ids[4], ids[0]), (ids[2], ids[3]), (ids[1], ids[4])] {
            assert!(move_card(&mut cards, dragged, DropTarget::Card(over)));
            let mut seen = positions(&cards);
            seen.sort_unstable();
            assert_eq!(seen, (0..cards.len() as i32).collect::<Vec<_>>());
        }
    }

    #[test]
    fn cross_column_drop_takes_destination_status() {
        let (mut cards, ids) = board();

        assert!(move_card(&mut cards, ids[0], DropTarget::Card(ids[4])));

        let moved = cards.iter().find(|c| c.id == ids[0]).unwrap();
        assert_eq!(moved.status, TaskStatus::Completed);
        assert_eq!(moved.position, 4);
    }

    #[test]
    fn empty_column_drop_appends_with_column_status() {
        let (mut cards, ids) = board();
        // No Completed cards on this board.
        cards.retain(|c| c.status != TaskStatus::Completed);

        assert!(move_card(
            &mut cards,
            ids[1],
            DropTarget::Column(TaskStatus::Completed)
        ));

        let last = cards.last().unwrap();
        assert_eq!(last.id, ids[1]);
        assert_eq!(last.status, TaskStatus::Completed);
        assert_eq!(positions(&cards), vec![0, 1, 2, 3]);
    }

    #[test]
    fn dropping_a_card_on_itself_is_a_no_op() {
        let (mut cards, ids) = board();
        let before = cards.clone();

        assert!(!move_card(&mut cards, ids[2], DropTarget::Card(ids[2])));
        assert_eq!(cards, before);
    }

    #[test]
    fn unknown_ids_leave_the_list_unchanged() {
        let (mut cards, ids) = board();
        let before = cards.clone();

        assert!(!move_card(&mut cards, Uuid::new_v4(), DropTarget::Card(ids[0])));
        assert!(!move_card(&mut cards, ids[0], DropTarget::Card(Uuid::new_v4())));
        assert_eq!(cards, before);
    }

    #[test]
    fn progress_of_no_notes_is_zero() {
        assert_eq!(project_progress(&[]), BigDecimal::from(0));
    }

    #[test]
    fn progress_of_half_completed_notes_is_exactly_fifty() {
        let statuses = [
            NoteStatus::Completed,
            NoteStatus::Completed,
            NoteStatus::InProgress,
            NoteStatus::ToDo,
        ];
        assert_eq!(project_progress(&statuses).to_string(), "50.00");
    }

    #[test]
    fn progress_stays_within_bounds() {
        let all = [NoteStatus::Completed; 7];
        assert_eq!(project_progress(&all), BigDecimal::from(100));

        let none = [NoteStatus::Testing; 3];
        assert_eq!(project_progress(&none), BigDecimal::from(0));

        let third = [NoteStatus::Completed, NoteStatus::ToDo, NoteStatus::ToDo];
        assert_eq!(project_progress(&third).to_string(), "33.33");
    }
}
