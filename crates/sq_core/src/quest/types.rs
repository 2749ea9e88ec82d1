use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::Attribute;

/// Study subject a quest belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Mathematics,
    Science,
    Language,
    History,
    Programming,
}

impl Subject {
    /// Fixed subject pool used by the generator
    pub const ALL: [Subject; 5] = [
        Subject::Mathematics,
        Subject::Science,
        Subject::Language,
        Subject::History,
        Subject::Programming,
    ];

    /// Title pool for generated quests
    pub fn titles(&self) -> [&'static str; 3] {
        match self {
            Subject::Mathematics => {
                ["Solve a problem set", "Review proofs from class", "Practice mental arithmetic"]
            }
            Subject::Science => {
                ["Summarize a lab report", "Read a chapter on physics", "Draw a reaction diagram"]
            }
            Subject::Language => {
                ["Learn twenty new words", "Write a short essay", "Read an article aloud"]
            }
            Subject::History => {
                ["Build a timeline of an era", "Read a primary source", "Quiz yourself on dates"]
            }
            Subject::Programming => {
                ["Solve a coding kata", "Refactor an old exercise", "Read a library's source"]
            }
        }
    }

    /// Attribute raised when a quest of this subject is claimed
    pub fn attribute(&self) -> Attribute {
        match self {
            Subject::Mathematics => Attribute::Logic,
            Subject::Science => Attribute::Curiosity,
            Subject::Language => Attribute::Expression,
            Subject::History => Attribute::Memory,
            Subject::Programming => Attribute::Focus,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Mathematics => "mathematics",
            Subject::Science => "science",
            Subject::Language => "language",
            Subject::History => "history",
            Subject::Programming => "programming",
        }
    }

    pub fn parse(name: &str) -> Option<Subject> {
        let name = name.trim().to_ascii_lowercase();
        Subject::ALL.into_iter().find(|s| s.as_str() == name)
    }
}

/// Rarity tier id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }
}

/// Reminder/penalty lifecycle of a quest.
///
/// Transitions only move forward: `Pending -> Reminded -> Penalized`, or
/// `Pending -> Penalized` when the reminder window was missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "AlertFlags", into = "AlertFlags")]
pub enum AlertState {
    #[default]
    Pending,
    Reminded,
    Penalized { reminded: bool },
}

impl AlertState {
    pub fn is_reminded(&self) -> bool {
        matches!(self, AlertState::Reminded | AlertState::Penalized { reminded: true })
    }

    pub fn is_penalized(&self) -> bool {
        matches!(self, AlertState::Penalized { .. })
    }

    /// Move to `Reminded`. Returns false if the reminder already fired or the
    /// quest was penalized.
    pub fn remind(&mut self) -> bool {
        match self {
            AlertState::Pending => {
                *self = AlertState::Reminded;
                true
            }
            _ => false,
        }
    }

    /// Move to `Penalized`. Returns false if the penalty already applied.
    pub fn penalize(&mut self) -> bool {
        match *self {
            AlertState::Penalized { .. } => false,
            state => {
                *self = AlertState::Penalized { reminded: state == AlertState::Reminded };
                true
            }
        }
    }
}

/// Persisted shape of [`AlertState`]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AlertFlags {
    #[serde(default)]
    reminder_notified: bool,
    #[serde(default)]
    penalty_applied: bool,
}

impl From<AlertFlags> for AlertState {
    fn from(flags: AlertFlags) -> Self {
        match (flags.reminder_notified, flags.penalty_applied) {
            (false, false) => AlertState::Pending,
            (true, false) => AlertState::Reminded,
            (reminded, true) => AlertState::Penalized { reminded },
        }
    }
}

impl From<AlertState> for AlertFlags {
    fn from(state: AlertState) -> Self {
        AlertFlags {
            reminder_notified: state.is_reminded(),
            penalty_applied: state.is_penalized(),
        }
    }
}

/// A single study quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub subject: Subject,
    pub rarity: Rarity,
    pub reward_exp: u32,
    pub est_mins: u32,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub pending_complete: bool,
    #[serde(flatten)]
    pub alert: AlertState,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    due_at: Option<DateTime<Utc>>,
}

impl Quest {
    pub fn new(
        id: String,
        title: String,
        subject: Subject,
        rarity: Rarity,
        reward_exp: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description: String::new(),
            subject,
            rarity,
            reward_exp,
            est_mins: estimated_minutes(reward_exp),
            repeat: false,
            completed: false,
            pending_complete: false,
            alert: AlertState::Pending,
            created_at,
            due_at: None,
        }
    }

    pub fn with_due_at(mut self, due_at: Option<DateTime<Utc>>) -> Self {
        self.due_at = due_at;
        self
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_at
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }
}

/// Estimated study time for a reward: half the reward, at least ten minutes
pub fn estimated_minutes(reward_exp: u32) -> u32 {
    reward_exp.div_ceil(2).max(10)
}

/// User input for a manually created quest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subject: Option<Subject>,
    #[serde(default)]
    pub rarity: Option<Rarity>,
    #[serde(default)]
    pub reward_exp: u32,
    #[serde(default)]
    pub est_mins: Option<u32>,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
}
