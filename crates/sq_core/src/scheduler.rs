//! Session timers
//!
//! A deterministic timer table: nothing fires on its own, the owner polls it
//! with the current time. Dropping or clearing the scheduler cancels every
//! pending task, so callbacks can never outlive the session that armed them.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Sweep,
    DailyQuests,
    DismissPopup,
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    kind: TaskKind,
    due: DateTime<Utc>,
    every: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: BTreeMap<TaskId, ScheduledTask>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_once(&mut self, kind: TaskKind, at: DateTime<Utc>) -> TaskId {
        self.insert(ScheduledTask { kind, due: at, every: None })
    }

    /// Fire at `first_at`, then every `every` after that
    pub fn schedule_every(
        &mut self,
        kind: TaskKind,
        first_at: DateTime<Utc>,
        every: Duration,
    ) -> TaskId {
        let every = if every <= Duration::zero() { Duration::seconds(1) } else { every };
        self.insert(ScheduledTask { kind, due: first_at, every: Some(every) })
    }

    fn insert(&mut self, task: ScheduledTask) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        tracing::trace!(?id, kind = ?task.kind, due = %task.due, "task scheduled");
        self.tasks.insert(id, task);
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.tasks.remove(&id).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Earliest pending due time
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.tasks.values().map(|t| t.due).min()
    }

    /// Collect every task due at `now`, ordered by due time then id.
    ///
    /// One-shot tasks are removed. A repeating task fires once per poll, even
    /// if several intervals have elapsed, and is re-armed for the first
    /// interval boundary after `now`.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<(TaskId, TaskKind)> {
        let mut due: Vec<(DateTime<Utc>, TaskId, TaskKind)> = self
            .tasks
            .iter()
            .filter(|(_, task)| task.due <= now)
            .map(|(id, task)| (task.due, *id, task.kind))
            .collect();
        due.sort_by_key(|(at, id, _)| (*at, *id));

        for (_, id, _) in &due {
            let Some(task) = self.tasks.get_mut(id) else {
                continue;
            };
            match task.every {
                Some(every) => task.due = next_boundary(task.due, every, now),
                None => {
                    self.tasks.remove(id);
                }
            }
        }

        due.into_iter().map(|(_, id, kind)| (id, kind)).collect()
    }
}

fn next_boundary(due: DateTime<Utc>, every: Duration, now: DateTime<Utc>) -> DateTime<Utc> {
    let every_ms = every.num_milliseconds().max(1);
    let behind_ms = (now - due).num_milliseconds().max(0);
    let steps = behind_ms / every_ms + 1;
    due + Duration::milliseconds(steps * every_ms)
}
