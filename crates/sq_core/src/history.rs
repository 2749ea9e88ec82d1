use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAP: usize = 200;

/// One signed experience change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub reward: i64,
    pub at: DateTime<Utc>,
}

/// Experience log, most recent first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `entry`, evicting the oldest entries beyond `cap`
    pub fn record(&mut self, entry: HistoryEntry, cap: usize) {
        self.entries.push_front(entry);
        self.entries.truncate(cap);
    }

    pub fn truncate(&mut self, cap: usize) {
        self.entries.truncate(cap);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Net experience over the whole log
    pub fn net_reward(&self) -> i64 {
        self.entries.iter().map(|e| e.reward).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(i: i64, base: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            id: format!("h-{}", i),
            title: format!("Entry {}", i),
            reward: i,
            at: base + Duration::minutes(i),
        }
    }

    #[test]
    fn test_cap_keeps_most_recent_first() {
        let base = Utc::now();
        let mut history = History::new();
        for i in 0..205 {
            history.record(entry(i, base), DEFAULT_HISTORY_CAP);
        }

        assert_eq!(history.len(), 200);
        assert_eq!(history.latest().map(|e| e.reward), Some(204));

        let rewards: Vec<i64> = history.iter().map(|e| e.reward).collect();
        let expected: Vec<i64> = (5..205).rev().collect();
        assert_eq!(rewards, expected);
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let base = Utc::now();
        let mut history = History::new();
        history.record(entry(1, base), 10);
        history.record(entry(-2, base), 10);

        let value = serde_json::to_value(&history).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["reward"], -2);
        assert_eq!(history.net_reward(), -1);
    }
}
