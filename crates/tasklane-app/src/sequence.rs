use std::collections::HashMap;

use tasklane_core::TaskId;

/// Per-task ticket bookkeeping used to discard out-of-order responses.
///
/// Tickets come from one counter shared by all tasks, so a ticket is never
/// reissued. Only responses that reached the local list advance a task's
/// mark; a request that fails leaves earlier successes free to apply.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    next: u64,
    applied: HashMap<TaskId, u64>,
}

impl SequenceTracker {
    /// Issue the next ticket.
    pub fn issue(&mut self) -> u64 {
        self.next += 1;
        self.next
    }

    /// Claim `ticket` for `task` if no newer response was applied yet.
    ///
    /// Returns false when the response is older than one already applied.
    pub fn accept(&mut self, task: TaskId, ticket: u64) -> bool {
        let mark = self.applied.entry(task).or_default();
        if ticket > *mark {
            *mark = ticket;
            true
        } else {
            false
        }
    }

    /// Drop the mark of a task that no longer exists locally.
    pub fn forget(&mut self, task: TaskId) {
        self.applied.remove(&task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_response_loses_to_applied_newer_one() {
        let mut tracker = SequenceTracker::default();
        let task = TaskId::new();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(second > first);
        assert!(tracker.accept(task, second));
        assert!(!tracker.accept(task, first));
    }

    #[test]
    fn unanswered_newer_ticket_does_not_block_older_response() {
        let mut tracker = SequenceTracker::default();
        let task = TaskId::new();
        let first = tracker.issue();
        let _failed = tracker.issue();
        assert!(tracker.accept(task, first));
    }

    #[test]
    fn marks_are_tracked_per_task() {
        let mut tracker = SequenceTracker::default();
        let a = TaskId::new();
        let b = TaskId::new();
        let ticket_a = tracker.issue();
        let ticket_b = tracker.issue();
        assert!(tracker.accept(b, ticket_b));
        assert!(tracker.accept(a, ticket_a));
    }

    #[test]
    fn forgotten_tasks_start_fresh() {
        let mut tracker = SequenceTracker::default();
        let task = TaskId::new();
        let ticket = tracker.issue();
        assert!(tracker.accept(task, ticket));
        tracker.forget(task);

        let again = tracker.issue();
        assert!(again > ticket);
        assert!(tracker.accept(task, again));
    }
}
