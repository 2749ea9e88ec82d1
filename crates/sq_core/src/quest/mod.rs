pub mod generator;
pub mod manager;
pub mod rarity;
pub mod types;

pub use generator::{random_id, QuestGenerator};
pub use manager::{QuestBook, QuestStatistics};
pub use rarity::{select_tier, RarityTier, DEFAULT_RARITY_TABLE};
pub use types::{estimated_minutes, AlertState, Quest, QuestDraft, Rarity, Subject};
