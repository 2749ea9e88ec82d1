// Procedural quest generation
use chrono::{DateTime, Duration, Utc};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use super::rarity::{highest_tier, select_tier, RarityTier, DEFAULT_RARITY_TABLE};
use super::types::{estimated_minutes, Quest, Subject};
use crate::config::EngineConfig;

/// Generates study quests from the subject pool and the rarity table.
///
/// Ids come from the generator's own RNG, so a seeded generator reproduces
/// the same quests for the same timestamps.
#[derive(Debug, Clone)]
pub struct QuestGenerator {
    rng: ChaCha8Rng,
    tiers: Vec<RarityTier>,
    due_in: Option<Duration>,
}

impl Default for QuestGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl QuestGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            tiers: DEFAULT_RARITY_TABLE.to_vec(),
            due_in: None,
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            tiers: DEFAULT_RARITY_TABLE.to_vec(),
            due_in: None,
        }
    }

    pub fn from_config(config: &EngineConfig, seed: Option<u64>) -> Self {
        let generator = match seed {
            Some(seed) => Self::new(seed),
            None => Self::from_entropy(),
        };
        generator.with_tiers(config.rarity_table.clone()).with_due_in(config.generated_due_in())
    }

    pub fn with_tiers(mut self, tiers: Vec<RarityTier>) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn with_due_in(mut self, due_in: Option<Duration>) -> Self {
        self.due_in = due_in;
        self
    }

    pub fn tiers(&self) -> &[RarityTier] {
        &self.tiers
    }

    /// Fresh unique id
    pub fn next_id(&mut self) -> String {
        uuid::Builder::from_random_bytes(self.rng.gen()).into_uuid().to_string()
    }

    /// Generate `count` quests, all for `preferred` when given
    pub fn generate(
        &mut self,
        count: usize,
        preferred: Option<Subject>,
        now: DateTime<Utc>,
    ) -> Vec<Quest> {
        (0..count).map(|_| self.generate_one(preferred, now)).collect()
    }

    fn generate_one(&mut self, preferred: Option<Subject>, now: DateTime<Utc>) -> Quest {
        let subject = match preferred {
            Some(subject) => subject,
            None => *Subject::ALL.choose(&mut self.rng).unwrap_or(&Subject::Mathematics),
        };

        let tier = *select_tier(&self.tiers, &mut self.rng);
        let titles = subject.titles();
        let title = titles[self.rng.gen_range(0..titles.len())];
        let reward_exp = tier.roll_reward(&mut self.rng);
        let id = self.next_id();

        let mut quest = Quest::new(id, title.to_string(), subject, tier.id, reward_exp, now)
            .with_due_at(self.due_in.map(|d| now + d));
        quest.description = format!(
            "{} {} quest, about {} minutes of study",
            capitalize(tier.id.as_str()),
            subject.as_str(),
            estimated_minutes(reward_exp)
        );
        quest.repeat = tier.id != highest_tier(&self.tiers);
        quest
    }
}

/// Ids for records created outside the generator
pub fn random_id() -> String {
    Uuid::new_v4().to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
