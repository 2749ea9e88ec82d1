//! Session state
//!
//! Everything one logged-in user owns: quests, progression, stats and the
//! experience history. Every operation takes the state by `&mut` and returns
//! the notifications it raised, so a caller always sees a complete update.
//! The state can be converted to/from [`UserBlob`] for persistence.

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::error::{CoreError, Result};
use crate::history::{History, HistoryEntry};
use crate::notify::{EventKind, NotificationEvent};
use crate::progression::{LevelChange, Progression};
use crate::quest::{
    estimated_minutes, random_id, Quest, QuestBook, QuestDraft, QuestGenerator, Rarity, Subject,
};
use crate::save::format::{ProfileSnapshot, UserBlob};
use crate::stats::{allocate_point, Attribute, Stats};
use crate::sweep::{sweep, SweepOutcome};

/// Result of claiming a completed quest
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimOutcome {
    pub quest_id: String,
    pub reward: u32,
    pub attribute: Attribute,
    pub level_change: LevelChange,
    /// `levelup` notification when the claim crossed a level
    pub events: Vec<NotificationEvent>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub quests: QuestBook,
    pub history: History,
    pub stats: Stats,
    pub progression: Progression,
    pub last_generated_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore runtime state from save data
    pub fn from_blob(blob: UserBlob) -> Self {
        Self {
            quests: QuestBook::from_quests(blob.quests),
            history: blob.history,
            stats: blob.stats,
            progression: Progression { exp: blob.exp, level: blob.level.max(1), unspent: blob.unspent },
            last_generated_at: blob.last_generated_at,
        }
    }

    /// Convert runtime state to save format
    pub fn to_blob(&self) -> UserBlob {
        UserBlob {
            version: crate::save::SAVE_VERSION,
            quests: self.quests.as_slice().to_vec(),
            history: self.history.clone(),
            stats: self.stats,
            exp: self.progression.exp,
            level: self.progression.level,
            unspent: self.progression.unspent,
            last_generated_at: self.last_generated_at,
        }
    }

    pub fn profile(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            stats: self.stats,
            exp: self.progression.exp,
            level: self.progression.level,
            unspent: self.progression.unspent,
        }
    }

    // ========================
    // Quest creation
    // ========================

    /// Add generated quests, announcing each one
    pub fn add_generated(&mut self, quests: Vec<Quest>) -> Vec<NotificationEvent> {
        quests
            .into_iter()
            .map(|quest| {
                let event = NotificationEvent::for_quest(EventKind::New, &quest);
                self.quests.add(quest);
                event
            })
            .collect()
    }

    pub fn generate(
        &mut self,
        generator: &mut QuestGenerator,
        count: usize,
        subject: Option<Subject>,
        now: DateTime<Utc>,
    ) -> Vec<NotificationEvent> {
        let quests = generator.generate(count, subject, now);
        tracing::info!(count = quests.len(), ?subject, "generated quests");
        self.add_generated(quests)
    }

    /// Generate the daily batch unless one was already generated today (UTC)
    pub fn generate_daily_if_due(
        &mut self,
        generator: &mut QuestGenerator,
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<NotificationEvent> {
        let due = match self.last_generated_at {
            Some(last) => last.date_naive() != now.date_naive(),
            None => true,
        };
        if !due {
            return Vec::new();
        }

        self.last_generated_at = Some(now);
        self.generate(generator, count, None, now)
    }

    /// Validate a draft and add it as a new quest.
    ///
    /// Nothing is added when validation fails.
    pub fn add_manual(&mut self, draft: QuestDraft, id: String, now: DateTime<Utc>) -> Result<&Quest> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(CoreError::MissingField("title"));
        }
        let subject = draft.subject.ok_or(CoreError::MissingField("subject"))?;
        if draft.reward_exp == 0 {
            return Err(CoreError::InvalidParameter("rewardExp must be greater than 0".into()));
        }
        if draft.est_mins == Some(0) {
            return Err(CoreError::InvalidParameter("estMins must be greater than 0".into()));
        }

        let rarity = draft.rarity.unwrap_or(Rarity::Common);
        let mut quest = Quest::new(id, title.to_string(), subject, rarity, draft.reward_exp, now)
            .with_due_at(draft.due_at);
        quest.description = draft.description.unwrap_or_default();
        quest.est_mins = draft.est_mins.unwrap_or_else(|| estimated_minutes(draft.reward_exp));
        quest.repeat = draft.repeat;

        tracing::info!(quest_id = %quest.id, title = %quest.title, "quest created");
        Ok(self.quests.add(quest))
    }

    pub fn remove(&mut self, quest_id: &str) -> Result<Quest> {
        let quest = self.quests.remove(quest_id)?;
        tracing::info!(quest_id, "quest removed");
        Ok(quest)
    }

    // ========================
    // Completion
    // ========================

    /// Mark a quest done pending confirmation; raises the `complete` popup
    pub fn begin_completion(&mut self, quest_id: &str) -> Result<NotificationEvent> {
        let quest = self.quests.begin_completion(quest_id)?;
        Ok(NotificationEvent::for_quest(EventKind::Complete, quest))
    }

    /// Commit a pending completion: bank the reward, log it and raise the
    /// subject's attribute
    pub fn claim(
        &mut self,
        quest_id: &str,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome> {
        let quest = self.quests.claim(quest_id)?.clone();

        let level_change = self.progression.apply(quest.reward_exp as i64, &config.level_curve);
        self.history.record(
            HistoryEntry {
                id: random_id(),
                title: quest.title.clone(),
                reward: quest.reward_exp as i64,
                at: now,
            },
            config.history_cap,
        );
        let attribute = quest.subject.attribute();
        self.stats.increment(attribute, 1);

        let mut events = Vec::new();
        if level_change.levels_gained > 0 {
            tracing::info!(level = level_change.level, points = level_change.points_gained, "level up");
            events.push(NotificationEvent::level_up(&quest, level_change.level));
        }
        tracing::info!(quest_id, reward = quest.reward_exp, "quest claimed");

        Ok(ClaimOutcome {
            quest_id: quest.id,
            reward: quest.reward_exp,
            attribute,
            level_change,
            events,
        })
    }

    /// Revert a pending completion; nothing else changes
    pub fn undo(&mut self, quest_id: &str) -> Result<()> {
        self.quests.undo(quest_id)?;
        tracing::debug!(quest_id, "completion undone");
        Ok(())
    }

    pub fn allocate_point(&mut self, attribute: Attribute) -> Result<u32> {
        allocate_point(&mut self.stats, &mut self.progression.unspent, attribute)
    }

    // ========================
    // Sweep
    // ========================

    /// Fire due reminders and overdue penalties
    pub fn run_sweep(&mut self, config: &EngineConfig, now: DateTime<Utc>) -> Vec<NotificationEvent> {
        let outcomes = sweep(self.quests.as_mut_slice(), now, &config.sweep_rules());

        let mut events = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                SweepOutcome::Reminder { index } => {
                    let quest = &self.quests.as_slice()[index];
                    tracing::debug!(quest_id = %quest.id, "reminder fired");
                    events.push(NotificationEvent::for_quest(EventKind::Reminder, quest));
                }
                SweepOutcome::Penalty { index, penalty } => {
                    let quest = self.quests.as_slice()[index].clone();
                    self.progression.apply(-(penalty as i64), &config.level_curve);
                    self.history.record(
                        HistoryEntry {
                            id: random_id(),
                            title: format!("Penalty: {}", quest.title),
                            reward: -(penalty as i64),
                            at: now,
                        },
                        config.history_cap,
                    );
                    tracing::info!(quest_id = %quest.id, penalty, "overdue penalty applied");
                    events.push(NotificationEvent::penalty(&quest, penalty));
                }
            }
        }
        events
    }
}
