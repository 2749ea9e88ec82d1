//! # sq_core - Study Quest Engine
//!
//! Turns study tasks into quests with rarities and EXP rewards, tracks
//! completion, reminds before deadlines, penalizes overdue work and levels
//! the user up.
//!
//! ## Features
//! - Seedable quest generation (same seed = same quests)
//! - Claim/undo completion flow through a popup queue
//! - Deterministic timers driven by an explicit clock
//! - JSON persistence over any key-value store; storage failures never
//!   reach the caller

// Game engine APIs often require many parameters
#![allow(clippy::too_many_arguments)]

pub mod auth;
pub mod config;
pub mod error;
pub mod history;
pub mod notify;
pub mod progression;
pub mod quest;
pub mod save;
pub mod scheduler;
pub mod session;
pub mod state;
pub mod stats;
pub mod sweep;

pub use auth::AuthError;
pub use config::{ConfigError, EngineConfig};
pub use error::{CoreError, Result};
pub use history::{History, HistoryEntry};
pub use notify::{EventKind, NotificationEvent, NotificationQueue, Popup};
pub use progression::{apply_experience_delta, LevelChange, LevelCurve, Progression};
pub use quest::{Quest, QuestBook, QuestDraft, QuestGenerator, Rarity, RarityTier, Subject};
pub use save::{FileStore, KeyValueStore, MemoryStore, SessionStore, StoreError, UserBlob};
pub use scheduler::{Scheduler, TaskId, TaskKind};
pub use session::Session;
pub use state::{ClaimOutcome, SessionState};
pub use stats::{Attribute, Stats};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u32 = save::SAVE_VERSION;
