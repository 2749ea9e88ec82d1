//! Experience and level progression
//!
//! Experience is banked toward the current level only. Crossing the
//! threshold rolls the remainder over into the next level, possibly several
//! levels at once. Losses burn banked experience down to zero but never
//! remove a level.

use serde::{Deserialize, Serialize};

/// Threshold used when the curve yields a non-positive value
pub const FALLBACK_THRESHOLD: u64 = 200;

/// Linear level curve: `threshold(L) = base + (L - 1) * step`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelCurve {
    pub base: i64,
    pub step: i64,
    pub points_per_level: u32,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self { base: 200, step: 50, points_per_level: 3 }
    }
}

/// Result of applying an experience delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelChange {
    pub exp: u32,
    pub level: u32,
    pub points_gained: u32,
    pub levels_gained: u32,
}

impl LevelCurve {
    /// Experience needed to advance from `level` to `level + 1`
    pub fn threshold(&self, level: u32) -> u64 {
        let level = level.max(1) as i64;
        let threshold = self.base.saturating_add((level - 1).saturating_mul(self.step));
        if threshold <= 0 {
            FALLBACK_THRESHOLD
        } else {
            threshold as u64
        }
    }

    pub fn apply(&self, exp: u32, level: u32, delta: i64) -> LevelChange {
        let mut level = level.max(1);
        let start_level = level;
        let mut banked = (exp as i64).saturating_add(delta).clamp(0, u32::MAX as i64) as u64;

        if delta > 0 {
            loop {
                let threshold = self.threshold(level);
                if banked < threshold {
                    break;
                }
                banked -= threshold;
                level = level.saturating_add(1);
            }
        }

        let levels_gained = level - start_level;
        LevelChange {
            exp: banked as u32,
            level,
            points_gained: levels_gained.saturating_mul(self.points_per_level),
            levels_gained,
        }
    }
}

/// Apply `delta` on the default curve
pub fn apply_experience_delta(current_exp: u32, current_level: u32, delta: i64) -> LevelChange {
    LevelCurve::default().apply(current_exp, current_level, delta)
}

/// Banked experience, level and unspent attribute points of one user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    #[serde(default)]
    pub exp: u32,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub unspent: u32,
}

fn default_level() -> u32 {
    1
}

impl Default for Progression {
    fn default() -> Self {
        Self { exp: 0, level: 1, unspent: 0 }
    }
}

impl Progression {
    /// Apply a signed delta. Attribute points from level-ups are added to
    /// `unspent` and are never taken back.
    pub fn apply(&mut self, delta: i64, curve: &LevelCurve) -> LevelChange {
        let change = curve.apply(self.exp, self.level, delta);
        self.exp = change.exp;
        self.level = change.level;
        self.unspent = self.unspent.saturating_add(change.points_gained);
        change
    }

    pub fn exp_to_next_level(&self, curve: &LevelCurve) -> u64 {
        curve.threshold(self.level).saturating_sub(self.exp as u64)
    }

    /// Fraction of the current level completed, 0.0 to 1.0
    pub fn level_progress(&self, curve: &LevelCurve) -> f32 {
        (self.exp as f64 / curve.threshold(self.level) as f64).min(1.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_formula() {
        let curve = LevelCurve::default();
        assert_eq!(curve.threshold(1), 200);
        assert_eq!(curve.threshold(2), 250);
        assert_eq!(curve.threshold(10), 650);
        assert_eq!(curve.threshold(0), 200);
    }

    #[test]
    fn test_single_level_up() {
        let change = apply_experience_delta(190, 1, 50);
        assert_eq!(change.level, 2);
        assert_eq!(change.exp, 40);
        assert_eq!(change.points_gained, 3);
    }

    #[test]
    fn test_large_reward_cascades() {
        // 200 + 250 + 300 = 750 to reach level 4
        let change = apply_experience_delta(0, 1, 760);
        assert_eq!(change.level, 4);
        assert_eq!(change.exp, 10);
        assert_eq!(change.levels_gained, 3);
        assert_eq!(change.points_gained, 9);
    }

    #[test]
    fn test_penalty_floors_without_deleveling() {
        let change = apply_experience_delta(0, 1, -9999);
        assert_eq!(change, LevelChange { exp: 0, level: 1, points_gained: 0, levels_gained: 0 });

        let change = apply_experience_delta(30, 5, -12);
        assert_eq!(change.exp, 18);
        assert_eq!(change.level, 5);
    }

    #[test]
    fn test_degenerate_curve_uses_fallback() {
        let curve = LevelCurve { base: -10, step: 0, points_per_level: 1 };
        assert_eq!(curve.threshold(3), FALLBACK_THRESHOLD);

        let change = curve.apply(0, 1, 450);
        assert_eq!(change.level, 3);
        assert_eq!(change.exp, 50);
    }

    #[test]
    fn test_progression_keeps_points_after_penalty() {
        let curve = LevelCurve::default();
        let mut progression = Progression::default();

        progression.apply(210, &curve);
        assert_eq!(progression, Progression { exp: 10, level: 2, unspent: 3 });

        progression.apply(-500, &curve);
        assert_eq!(progression, Progression { exp: 0, level: 2, unspent: 3 });
        assert_eq!(progression.exp_to_next_level(&curve), 250);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Levels never go down and banked experience stays below the threshold
            #[test]
            fn prop_apply_is_monotone_in_level(
                exp in 0u32..1000,
                level in 1u32..40,
                delta in -5000i64..20000
            ) {
                let curve = LevelCurve::default();
                let start_exp = exp.min(curve.threshold(level) as u32 - 1);
                let change = curve.apply(start_exp, level, delta);

                prop_assert!(change.level >= level);
                prop_assert!((change.exp as u64) < curve.threshold(change.level));
                prop_assert_eq!(change.points_gained, change.levels_gained * 3);
                if delta <= 0 {
                    prop_assert_eq!(change.level, level);
                }
            }
        }
    }
}
