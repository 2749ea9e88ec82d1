// Weighted rarity table
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::types::Rarity;

/// One row of the rarity table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityTier {
    pub id: Rarity,
    /// Relative selection weight
    pub weight: u32,
    /// Inclusive reward range `[min, max]`
    pub reward_range: (u32, u32),
}

impl RarityTier {
    pub const fn new(id: Rarity, weight: u32, min: u32, max: u32) -> Self {
        Self { id, weight, reward_range: (min, max) }
    }

    /// Draw a reward uniformly from the tier's range, both ends included
    pub fn roll_reward<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let (a, b) = self.reward_range;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        rng.gen_range(lo..=hi)
    }

    pub fn contains_reward(&self, reward: u32) -> bool {
        let (lo, hi) = self.reward_range;
        (lo..=hi).contains(&reward)
    }
}

/// Default table, lowest to highest tier
pub static DEFAULT_RARITY_TABLE: [RarityTier; 4] = [
    RarityTier::new(Rarity::Common, 60, 20, 40),    // 60%
    RarityTier::new(Rarity::Rare, 25, 45, 80),      // 25%
    RarityTier::new(Rarity::Epic, 12, 90, 140),     // 12%
    RarityTier::new(Rarity::Legendary, 3, 180, 260), // 3%
];

pub fn total_weight(tiers: &[RarityTier]) -> u64 {
    tiers.iter().map(|t| t.weight as u64).sum()
}

/// Map a roll in `[0, total_weight)` onto a tier.
///
/// Tiers are walked in table order; the first tier whose weight exceeds the
/// remaining roll wins. Degenerate tables fall back to the first tier.
pub fn tier_for_roll(tiers: &[RarityTier], roll: u64) -> &RarityTier {
    let mut remainder = roll;
    for tier in tiers {
        let weight = tier.weight as u64;
        if weight > remainder {
            return tier;
        }
        remainder -= weight;
    }
    tiers.first().unwrap_or(&DEFAULT_RARITY_TABLE[0])
}

/// Pick a tier with probability `weight / total_weight`
pub fn select_tier<'a, R: Rng + ?Sized>(tiers: &'a [RarityTier], rng: &mut R) -> &'a RarityTier {
    let total = total_weight(tiers);
    if total == 0 {
        return tiers.first().unwrap_or(&DEFAULT_RARITY_TABLE[0]);
    }
    tier_for_roll(tiers, rng.gen_range(0..total))
}

/// The tier that never repeats: the last row of the table
pub fn highest_tier(tiers: &[RarityTier]) -> Rarity {
    tiers.last().map(|t| t.id).unwrap_or(Rarity::Legendary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_roll_boundaries() {
        let table = &DEFAULT_RARITY_TABLE;
        assert_eq!(tier_for_roll(table, 0).id, Rarity::Common);
        assert_eq!(tier_for_roll(table, 59).id, Rarity::Common);
        assert_eq!(tier_for_roll(table, 60).id, Rarity::Rare);
        assert_eq!(tier_for_roll(table, 84).id, Rarity::Rare);
        assert_eq!(tier_for_roll(table, 85).id, Rarity::Epic);
        assert_eq!(tier_for_roll(table, 96).id, Rarity::Epic);
        assert_eq!(tier_for_roll(table, 97).id, Rarity::Legendary);
        assert_eq!(tier_for_roll(table, 99).id, Rarity::Legendary);
    }

    #[test]
    fn test_zero_weight_table_falls_back_to_first() {
        let table = [RarityTier::new(Rarity::Rare, 0, 1, 2), RarityTier::new(Rarity::Epic, 0, 3, 4)];
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(select_tier(&table, &mut rng).id, Rarity::Rare);
    }

    #[test]
    fn test_empty_table_falls_back_to_default_first() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(select_tier(&[], &mut rng).id, Rarity::Common);
    }

    #[test]
    fn test_zero_weight_tier_is_never_picked() {
        let table = [
            RarityTier::new(Rarity::Common, 1, 1, 1),
            RarityTier::new(Rarity::Rare, 0, 2, 2),
            RarityTier::new(Rarity::Epic, 1, 3, 3),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            assert_ne!(select_tier(&table, &mut rng).id, Rarity::Rare);
        }
    }

    #[test]
    fn test_selection_frequency_converges() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let draws = 100_000;
        let mut counts = [0u32; 4];
        for _ in 0..draws {
            let tier = select_tier(&DEFAULT_RARITY_TABLE, &mut rng);
            let idx = DEFAULT_RARITY_TABLE.iter().position(|t| t.id == tier.id).unwrap();
            counts[idx] += 1;
        }

        let total = total_weight(&DEFAULT_RARITY_TABLE) as f64;
        for (tier, count) in DEFAULT_RARITY_TABLE.iter().zip(counts) {
            let expected = tier.weight as f64 / total;
            let observed = count as f64 / draws as f64;
            assert!(
                (observed - expected).abs() < 0.01,
                "{:?}: expected {:.3}, observed {:.3}",
                tier.id,
                expected,
                observed
            );
        }
    }

    #[test]
    fn test_roll_reward_inclusive() {
        let tier = RarityTier::new(Rarity::Common, 1, 5, 6);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut seen = [false; 2];
        for _ in 0..200 {
            let reward = tier.roll_reward(&mut rng);
            assert!(tier.contains_reward(reward));
            seen[(reward - 5) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_highest_tier() {
        assert_eq!(highest_tier(&DEFAULT_RARITY_TABLE), Rarity::Legendary);
        assert_eq!(highest_tier(&DEFAULT_RARITY_TABLE[..2]), Rarity::Rare);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any roll below the total weight lands on a tier with positive weight
            #[test]
            fn prop_roll_lands_on_weighted_tier(
                weights in proptest::collection::vec(0u32..50, 1..6),
                seed in any::<u64>()
            ) {
                let ids = [Rarity::Common, Rarity::Rare, Rarity::Epic, Rarity::Legendary];
                let table: Vec<RarityTier> = weights
                    .iter()
                    .enumerate()
                    .map(|(i, w)| RarityTier::new(ids[i % ids.len()], *w, 1, 2))
                    .collect();
                let total = total_weight(&table);
                prop_assume!(total > 0);

                let roll = seed % total;
                let tier = tier_for_roll(&table, roll);
                prop_assert!(tier.weight > 0);
            }
        }
    }
}
