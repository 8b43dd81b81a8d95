use crate::id::TaskId;
use crate::model::Task;
use std::cmp::Ordering;

/// Error returned when a move references a position outside the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move from {from} to {to} in a list of {len}")]
pub struct MoveError {
    /// Source index.
    pub from: usize,
    /// Destination index.
    pub to: usize,
    /// Length of the list.
    pub len: usize,
}

/// Move the element at `from` so that it ends up at `to`.
///
/// Elements between the two positions shift by one slot; everything else
/// keeps its place. Equal indices leave the list untouched.
///
/// # Errors
/// Returns [`MoveError`] when either index is out of bounds.
pub fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), MoveError> {
    let len = items.len();
    if from >= len || to >= len {
        return Err(MoveError { from, to, len });
    }
    if from != to {
        let item = items.remove(from);
        items.insert(to, item);
    }
    Ok(())
}

/// Zero-based order indices for the list as it currently stands.
#[must_use]
pub fn order_assignments(ids: &[TaskId]) -> Vec<(TaskId, u32)> {
    ids.iter()
        .zip(0u32..)
        .map(|(id, position)| (*id, position))
        .collect()
}

/// Display order of a project's tasks.
///
/// Tasks carrying an order index come first, by index; the rest follow by
/// creation time.
#[must_use]
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    match (a.order_index, b.order_index) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.created_at.cmp(&b.created_at))
    .then_with(|| a.id.cmp(&b.id))
}

/// Sort tasks into display order.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(compare_tasks);
}
