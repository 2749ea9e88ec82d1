//! Popup notification queue
//!
//! Events are shown one at a time in the order they were raised. A shown
//! popup stays until it is resolved, dismissed, or its display time runs out.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::quest::{Quest, Rarity, Subject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    New,
    Reminder,
    Complete,
    Penalty,
    LevelUp,
}

/// Snapshot of a quest at the moment something happened to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub quest_id: String,
    pub title: String,
    pub subject: Subject,
    pub rarity: Rarity,
    /// Signed: negative for penalties
    pub reward_exp: i64,
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_level: Option<u32>,
}

impl NotificationEvent {
    pub fn for_quest(kind: EventKind, quest: &Quest) -> Self {
        Self {
            kind,
            quest_id: quest.id.clone(),
            title: quest.title.clone(),
            subject: quest.subject,
            rarity: quest.rarity,
            reward_exp: quest.reward_exp as i64,
            due_at: quest.due_at(),
            new_level: None,
        }
    }

    pub fn penalty(quest: &Quest, penalty: u32) -> Self {
        Self { reward_exp: -(penalty as i64), ..Self::for_quest(EventKind::Penalty, quest) }
    }

    pub fn level_up(quest: &Quest, level: u32) -> Self {
        Self { new_level: Some(level), ..Self::for_quest(EventKind::LevelUp, quest) }
    }

    pub fn message(&self) -> String {
        match self.kind {
            EventKind::New => format!("New quest: {} (+{} EXP)", self.title, self.reward_exp),
            EventKind::Reminder => format!("Reminder: {} is due soon", self.title),
            EventKind::Complete => {
                format!("Completed {}? Claim {} EXP or undo", self.title, self.reward_exp)
            }
            EventKind::Penalty => format!("Overdue: {} ({} EXP)", self.title, self.reward_exp),
            EventKind::LevelUp => {
                format!("Level up! You reached level {}", self.new_level.unwrap_or_default())
            }
        }
    }
}

/// The popup currently on screen
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub event: NotificationEvent,
    pub shown_at: DateTime<Utc>,
    pub dismiss_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NotificationQueue {
    pending: VecDeque<NotificationEvent>,
    current: Option<Popup>,
    display_for: Duration,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(Duration::seconds(7))
    }
}

impl NotificationQueue {
    pub fn new(display_for: Duration) -> Self {
        Self { pending: VecDeque::new(), current: None, display_for }
    }

    pub fn enqueue(&mut self, event: NotificationEvent) {
        tracing::debug!(kind = ?event.kind, quest_id = %event.quest_id, "notification queued");
        self.pending.push_back(event);
    }

    pub fn extend<I: IntoIterator<Item = NotificationEvent>>(&mut self, events: I) {
        for event in events {
            self.enqueue(event);
        }
    }

    /// Show the head of the queue if nothing is on screen.
    ///
    /// Returns the newly shown popup, or `None` when a popup is already
    /// visible or the queue is empty.
    pub fn show_next(&mut self, now: DateTime<Utc>) -> Option<&Popup> {
        if self.current.is_some() {
            return None;
        }
        let event = self.pending.pop_front()?;
        self.current = Some(Popup { event, shown_at: now, dismiss_at: now + self.display_for });
        self.current.as_ref()
    }

    /// Clear the popup if its display time has run out
    pub fn expire(&mut self, now: DateTime<Utc>) -> Option<NotificationEvent> {
        let expired = self.current.as_ref().is_some_and(|popup| popup.dismiss_at <= now);
        if expired {
            self.dismiss()
        } else {
            None
        }
    }

    /// Clear the popup regardless of time
    pub fn dismiss(&mut self) -> Option<NotificationEvent> {
        self.current.take().map(|popup| popup.event)
    }

    pub fn current(&self) -> Option<&Popup> {
        self.current.as_ref()
    }

    pub fn pending(&self) -> impl Iterator<Item = &NotificationEvent> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether a matching event is on screen or waiting
    pub fn contains<F>(&self, matches: F) -> bool
    where
        F: Fn(&NotificationEvent) -> bool,
    {
        self.current.as_ref().is_some_and(|popup| matches(&popup.event))
            || self.pending.iter().any(&matches)
    }

    /// Drop waiting events that match; the popup on screen is left alone
    pub fn discard<F>(&mut self, matches: F) -> usize
    where
        F: Fn(&NotificationEvent) -> bool,
    {
        let before = self.pending.len();
        self.pending.retain(|event| !matches(event));
        let dropped = before - self.pending.len();
        if dropped > 0 {
            tracing::debug!(dropped, "stale notifications discarded");
        }
        dropped
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.current = None;
    }
}
