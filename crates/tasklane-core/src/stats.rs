use crate::model::Task;
use crate::status::TaskStatus;
use serde::Serialize;

/// Summary counts for a project's task collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    /// Number of tasks.
    pub total: usize,
    /// Tasks in `done`.
    pub completed: usize,
    /// Tasks in `in_progress`.
    pub in_progress: usize,
    /// `completed / total` as a rounded percentage, 0 for an empty project.
    pub progress: u8,
}

impl ProjectStats {
    /// Count the given tasks.
    #[must_use]
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        Self::from_statuses(tasks.into_iter().map(|task| task.status))
    }

    /// Count the given statuses.
    #[must_use]
    pub fn from_statuses<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = TaskStatus>,
    {
        let mut stats = Self::default();
        for status in statuses {
            stats.total += 1;
            match status {
                TaskStatus::Done => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Todo => {}
            }
        }
        stats.progress = percent(stats.completed, stats.total);
        stats
    }

    /// Tasks neither done nor in progress.
    #[must_use]
    pub const fn todo(&self) -> usize {
        self.total - self.completed - self.in_progress
    }
}

// Rounds half up; `part <= whole` keeps the result within 0..=100.
fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let rounded = (200 * part + whole) / (2 * whole);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskStatus::{Done, InProgress, Todo};

    #[test]
    fn empty_project_is_all_zero() {
        let stats = ProjectStats::from_statuses([]);
        assert_eq!(
            stats,
            ProjectStats {
                total: 0,
                completed: 0,
                in_progress: 0,
                progress: 0
            }
        );
    }

    #[test]
    fn progress_rounds_half_up() {
        assert_eq!(ProjectStats::from_statuses([Done, Todo, Todo]).progress, 33);
        assert_eq!(ProjectStats::from_statuses([Done, Done, Todo]).progress, 67);
        assert_eq!(ProjectStats::from_statuses([Done, Todo]).progress, 50);
        assert_eq!(
            ProjectStats::from_statuses([Done, Todo, Todo, Todo, Todo, Todo, Todo, Todo]).progress,
            13
        );
    }

    #[test]
    fn counts_partition_total() {
        let mixes: [&[TaskStatus]; 4] = [
            &[Todo],
            &[Done, Done, InProgress],
            &[InProgress, Todo, InProgress, Done, Todo],
            &[Done; 7],
        ];
        for mix in mixes {
            let stats = ProjectStats::from_statuses(mix.iter().copied());
            assert_eq!(stats.completed + stats.in_progress + stats.todo(), stats.total);
            assert!(stats.progress <= 100);
        }
        assert_eq!(ProjectStats::from_statuses([Done; 7]).progress, 100);
    }
}
