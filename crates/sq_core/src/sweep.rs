//! Reminder and penalty sweep over active quests.
//!
//! The sweep only moves each quest's [`AlertState`] forward, so running it
//! again at the same wall-clock time finds nothing new to report.
//!
//! [`AlertState`]: crate::quest::AlertState

use chrono::{DateTime, Duration, Utc};

use crate::quest::Quest;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepRules {
    /// Reminder fires while `|due - now|` is inside this window
    pub reminder_window: Duration,
    /// Penalty applies once a quest is this far past due
    pub penalty_delay: Duration,
    /// Share of the reward lost to a penalty
    pub penalty_rate: f64,
}

impl Default for SweepRules {
    fn default() -> Self {
        Self {
            reminder_window: Duration::seconds(60),
            penalty_delay: Duration::hours(24),
            penalty_rate: 0.3,
        }
    }
}

impl SweepRules {
    pub fn penalty_for(&self, reward_exp: u32) -> u32 {
        (reward_exp as f64 * self.penalty_rate).round().max(0.0) as u32
    }
}

/// A transition fired by the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Reminder { index: usize },
    Penalty { index: usize, penalty: u32 },
}

/// Advance the alert state of every active quest with a due time.
///
/// Outcomes are returned in quest order, a reminder before a penalty for the
/// same quest. Applying penalty experience is left to the caller.
pub fn sweep(quests: &mut [Quest], now: DateTime<Utc>, rules: &SweepRules) -> Vec<SweepOutcome> {
    let mut outcomes = Vec::new();

    for (index, quest) in quests.iter_mut().enumerate() {
        if !quest.is_active() {
            continue;
        }
        let Some(due) = quest.due_at() else {
            continue;
        };

        let until_due = due - now;
        if until_due <= rules.reminder_window
            && until_due > -rules.reminder_window
            && quest.alert.remind()
        {
            outcomes.push(SweepOutcome::Reminder { index });
        }

        if now - due >= rules.penalty_delay && quest.alert.penalize() {
            outcomes.push(SweepOutcome::Penalty { index, penalty: rules.penalty_for(quest.reward_exp) });
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::{AlertState, Rarity, Subject};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-16T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn quest_due(id: &str, due: Option<DateTime<Utc>>) -> Quest {
        Quest::new(id.to_string(), id.to_string(), Subject::Science, Rarity::Rare, 50, now())
            .with_due_at(due)
    }

    #[test]
    fn test_reminder_window_boundary() {
        let rules = SweepRules::default();
        let mut quests = vec![
            quest_due("late", Some(now() + Duration::seconds(61))),
            quest_due("soon", Some(now() + Duration::seconds(59))),
            quest_due("just_passed", Some(now() - Duration::seconds(59))),
            quest_due("long_passed", Some(now() - Duration::seconds(60))),
        ];

        let outcomes = sweep(&mut quests, now(), &rules);
        assert_eq!(
            outcomes,
            vec![SweepOutcome::Reminder { index: 1 }, SweepOutcome::Reminder { index: 2 }]
        );
        assert_eq!(quests[0].alert, AlertState::Pending);
        assert_eq!(quests[1].alert, AlertState::Reminded);
        assert_eq!(quests[3].alert, AlertState::Pending);
    }

    #[test]
    fn test_exact_window_edge_reminds() {
        let mut quests = vec![quest_due("edge", Some(now() + Duration::seconds(60)))];
        let outcomes = sweep(&mut quests, now(), &SweepRules::default());
        assert_eq!(outcomes.len(), 1);
    }

    #[test]
    fn test_penalty_applies_once() {
        let rules = SweepRules::default();
        let mut quests = vec![quest_due("overdue", Some(now() - Duration::hours(25)))];

        let first = sweep(&mut quests, now(), &rules);
        assert_eq!(first, vec![SweepOutcome::Penalty { index: 0, penalty: 15 }]);
        assert_eq!(quests[0].alert, AlertState::Penalized { reminded: false });

        assert!(sweep(&mut quests, now(), &rules).is_empty());
        assert!(sweep(&mut quests, now() + Duration::days(3), &rules).is_empty());
    }

    #[test]
    fn test_penalty_boundary() {
        let rules = SweepRules::default();
        let mut quests = vec![
            quest_due("almost", Some(now() - Duration::hours(24) + Duration::seconds(1))),
            quest_due("exact", Some(now() - Duration::hours(24))),
        ];
        let outcomes = sweep(&mut quests, now(), &rules);
        assert_eq!(outcomes, vec![SweepOutcome::Penalty { index: 1, penalty: 15 }]);
    }

    #[test]
    fn test_reminded_quest_is_penalized_later() {
        let rules = SweepRules::default();
        let due = now() + Duration::seconds(30);
        let mut quests = vec![quest_due("q", Some(due))];

        assert_eq!(sweep(&mut quests, now(), &rules), vec![SweepOutcome::Reminder { index: 0 }]);
        assert!(sweep(&mut quests, now(), &rules).is_empty());

        let later = due + Duration::hours(24);
        assert_eq!(
            sweep(&mut quests, later, &rules),
            vec![SweepOutcome::Penalty { index: 0, penalty: 15 }]
        );
        assert_eq!(quests[0].alert, AlertState::Penalized { reminded: true });
    }

    #[test]
    fn test_completed_and_undated_quests_are_skipped() {
        let rules = SweepRules::default();
        let mut done = quest_due("done", Some(now() - Duration::hours(30)));
        done.completed = true;
        let mut quests = vec![done, quest_due("undated", None)];

        assert!(sweep(&mut quests, now(), &rules).is_empty());
        assert_eq!(quests[0].alert, AlertState::Pending);
    }

    #[test]
    fn test_penalty_rounding() {
        let rules = SweepRules::default();
        assert_eq!(rules.penalty_for(25), 8); // 7.5 rounds up
        assert_eq!(rules.penalty_for(20), 6);
        assert_eq!(rules.penalty_for(1), 0);
    }
}
