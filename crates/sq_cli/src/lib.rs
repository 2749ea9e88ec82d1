//! Study Quest CLI support
//!
//! Argument parsing helpers, text rendering and the clock-driven simulation
//! loop used by the `sq` binary.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

use sq_core::notify::Popup;
use sq_core::{
    Attribute, EngineConfig, FileStore, KeyValueStore, NotificationEvent, Quest, Session,
    SessionStore, Subject,
};

pub const PASSWORD_ENV: &str = "SQ_PASSWORD";

/// Store rooted at the data directory, capped per the engine config
pub fn open_store(data_dir: &Path, config: &EngineConfig) -> SessionStore<FileStore> {
    SessionStore::new(FileStore::new(data_dir)).with_history_cap(config.history_cap)
}

/// `--now` override, or the wall clock
pub fn resolve_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(raw) => parse_timestamp(raw),
        None => Ok(Utc::now()),
    }
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("Invalid RFC 3339 timestamp: {}", raw))
}

/// `--email`, falling back to whoever logged in last
pub fn resolve_email<S: KeyValueStore>(store: &SessionStore<S>, email: Option<String>) -> Result<String> {
    email
        .or_else(|| store.last_identity())
        .ok_or_else(|| anyhow!("No --email given and no previous login found"))
}

pub fn parse_subject(raw: &str) -> Result<Subject> {
    Subject::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = Subject::ALL.iter().map(|s| s.as_str()).collect();
        anyhow!("Unknown subject '{}' (expected one of: {})", raw, known.join(", "))
    })
}

pub fn parse_attribute(raw: &str) -> Result<Attribute> {
    Attribute::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = Attribute::ALL.iter().map(|a| a.as_str()).collect();
        anyhow!("Unknown attribute '{}' (expected one of: {})", raw, known.join(", "))
    })
}

pub fn format_quest(quest: &Quest) -> String {
    let status = if quest.completed {
        "done"
    } else if quest.pending_complete {
        "pending"
    } else if quest.alert.is_penalized() {
        "overdue"
    } else {
        "open"
    };
    let due = quest
        .due_at()
        .map(|d| format!(" due {}", d.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();

    format!(
        "[{:<7}] {} {:<9} {:<11} {:>4} EXP ~{}m  {}{}",
        status,
        quest.id,
        quest.rarity.as_str(),
        quest.subject.as_str(),
        quest.reward_exp,
        quest.est_mins,
        quest.title,
        due
    )
}

pub fn format_event(event: &NotificationEvent) -> String {
    format!("[{}] {}", event.rarity.as_str(), event.message())
}

pub fn format_popup(popup: &Popup) -> String {
    format!(
        "{} (until {})",
        format_event(&popup.event),
        popup.dismiss_at.format("%H:%M:%S")
    )
}

/// Multi-line profile and quest summary
pub fn render_status<S: KeyValueStore>(session: &Session<S>, now: DateTime<Utc>) -> String {
    let state = session.state();
    let config = session.config();
    let progression = &state.progression;
    let stats = state.quests.statistics(now);

    let mut lines = vec![
        format!("{} (user {})", session.email(), session.user_id()),
        format!(
            "Level {}  EXP {}/{}  ({:.0}%)  unspent points {}",
            progression.level,
            progression.exp,
            progression.exp as u64 + progression.exp_to_next_level(&config.level_curve),
            progression.level_progress(&config.level_curve) * 100.0,
            progression.unspent
        ),
        Attribute::ALL
            .iter()
            .map(|a| format!("{} {}", a.as_str(), state.stats.get(*a)))
            .collect::<Vec<_>>()
            .join("  "),
        format!(
            "Quests: {} total, {} active, {} pending, {} completed, {} overdue",
            stats.total, stats.active, stats.pending, stats.completed, stats.overdue
        ),
    ];
    lines.extend(state.quests.iter().map(format_quest));
    if let Some(entry) = state.history.latest() {
        lines.push(format!("Last: {} ({:+} EXP)", entry.title, entry.reward));
    }
    lines.join("\n")
}

/// End of a simulation window; rejects spans the clock cannot represent
pub fn simulation_end(start: DateTime<Utc>, hours: i64) -> Result<DateTime<Utc>> {
    if hours <= 0 {
        bail!("--hours must be positive");
    }
    Duration::try_hours(hours)
        .and_then(|span| start.checked_add_signed(span))
        .ok_or_else(|| anyhow!("--hours {} is out of range", hours))
}

/// Advance a session from `start` for `hours`, waking at every timer.
///
/// Popups are left to expire on their own. Returns each popup event in the
/// order it was displayed, with the time it appeared.
pub fn simulate<S: KeyValueStore>(
    session: &mut Session<S>,
    start: DateTime<Utc>,
    hours: i64,
) -> Result<Vec<(DateTime<Utc>, NotificationEvent)>> {
    let end = simulation_end(start, hours)?;

    let mut shown = Vec::new();
    if let Some(popup) = session.current_popup() {
        shown.push((popup.shown_at, popup.event.clone()));
    }

    while let Some(wake) = session.next_wakeup() {
        if wake > end {
            break;
        }
        let at = wake.max(start);
        if let Some(event) = session.tick(at) {
            shown.push((at, event));
        }
    }
    Ok(shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sq_core::QuestDraft;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        parse_timestamp("2026-10-16T07:00:00Z").unwrap()
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_subject("Science").unwrap(), Subject::Science);
        assert!(parse_subject("alchemy").is_err());
        assert_eq!(parse_attribute("focus").unwrap(), Attribute::Focus);
        assert!(parse_timestamp("yesterday").is_err());
        assert_eq!(resolve_now(Some("2026-10-16T07:00:00+00:00")).unwrap(), t0());
    }

    #[test]
    fn test_resolve_email_uses_last_identity() {
        let temp_dir = TempDir::new().unwrap();
        let config = EngineConfig::default();
        let mut store = open_store(temp_dir.path(), &config);
        assert!(resolve_email(&store, None).is_err());

        sq_core::auth::register(&mut store, "me@uni.edu", "pw").unwrap();
        assert_eq!(resolve_email(&store, None).unwrap(), "me@uni.edu");
        assert_eq!(resolve_email(&store, Some("x@y.z".into())).unwrap(), "x@y.z");
    }

    #[test]
    fn test_simulate_shows_every_popup() {
        let temp_dir = TempDir::new().unwrap();
        let config = EngineConfig::default();
        let store = open_store(temp_dir.path(), &config);
        let mut session = Session::login_or_register(store, config, "me@uni.edu", "pw", t0()).unwrap();

        let draft = QuestDraft {
            title: "Lab report".into(),
            subject: Some(Subject::Science),
            reward_exp: 40,
            due_at: Some(t0() + Duration::minutes(10)),
            ..QuestDraft::default()
        };
        session.add_quest(draft, t0()).unwrap();

        let shown = simulate(&mut session, t0(), 2).unwrap();
        let kinds: Vec<_> = shown.iter().map(|(_, e)| e.kind).collect();

        // Three daily quests, then the reminder
        assert_eq!(kinds.len(), 4);
        assert_eq!(kinds[3], sq_core::EventKind::Reminder);
        assert!(shown.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(simulate(&mut session, t0(), 0).is_err());
    }

    #[test]
    fn test_simulation_end_bounds() {
        assert_eq!(simulation_end(t0(), 24).unwrap(), t0() + Duration::days(1));
        assert!(simulation_end(t0(), -3).is_err());
        assert!(simulation_end(t0(), i64::MAX).is_err());
        assert!(simulation_end(t0(), 3_000_000_000).is_err());
    }

    #[test]
    fn test_render_status_lists_quests() {
        let temp_dir = TempDir::new().unwrap();
        let config = EngineConfig::default();
        let store = open_store(temp_dir.path(), &config);
        let session = Session::login_or_register(store, config, "me@uni.edu", "pw", t0()).unwrap();

        let text = render_status(&session, t0());
        assert!(text.starts_with("me@uni.edu"));
        assert!(text.contains("Level 1"));
        assert_eq!(text.lines().count(), 4 + 3);
    }
}
