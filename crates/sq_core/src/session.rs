//! Session runtime
//!
//! A [`Session`] exists between login and logout and owns everything a
//! logged-in user touches: state, popup queue, timers and the store. Timer
//! callbacks and user actions all go through `&mut self`, so they never
//! interleave. Every state change is persisted right away; a failing store
//! costs durability, never correctness.

use chrono::{DateTime, Utc};

use crate::auth::{self, AuthError};
use crate::config::EngineConfig;
use crate::error::{CoreError, Result};
use crate::notify::{EventKind, NotificationEvent, NotificationQueue, Popup};
use crate::quest::{Quest, QuestDraft, QuestGenerator, Subject};
use crate::save::{AccountRecord, KeyValueStore, SessionStore};
use crate::scheduler::{Scheduler, TaskId, TaskKind};
use crate::state::{ClaimOutcome, SessionState};
use crate::stats::Attribute;

pub struct Session<S: KeyValueStore> {
    email: String,
    user_id: String,
    state: SessionState,
    queue: NotificationQueue,
    scheduler: Scheduler,
    popup_task: Option<TaskId>,
    store: SessionStore<S>,
    config: EngineConfig,
    generator: QuestGenerator,
}

impl<S: KeyValueStore> Session<S> {
    /// Authenticate an existing account and start its session
    pub fn login(
        mut store: SessionStore<S>,
        config: EngineConfig,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Self, AuthError> {
        let account = auth::login(&mut store, email, password)?;
        let generator = QuestGenerator::from_config(&config, None);
        Ok(Self::open(store, config, account, generator, now))
    }

    /// Like [`Session::login`], registering the email first if it is unknown
    pub fn login_or_register(
        mut store: SessionStore<S>,
        config: EngineConfig,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Self, AuthError> {
        let account = auth::login_or_register(&mut store, email, password)?;
        let generator = QuestGenerator::from_config(&config, None);
        Ok(Self::open(store, config, account, generator, now))
    }

    /// Start a session for an already authenticated account.
    ///
    /// Loads the user's blob (defaults when absent), arms the sweep and
    /// daily-generation timers and runs both once at `now`.
    pub fn open(
        store: SessionStore<S>,
        config: EngineConfig,
        account: AccountRecord,
        generator: QuestGenerator,
        now: DateTime<Utc>,
    ) -> Self {
        let store = store.with_history_cap(config.history_cap);
        let state = match store.load_user(&account.user_id) {
            Some(blob) => SessionState::from_blob(blob),
            None => {
                tracing::info!(user_id = %account.user_id, "no saved progress, starting fresh");
                SessionState::new()
            }
        };

        let mut scheduler = Scheduler::new();
        scheduler.schedule_every(TaskKind::Sweep, now, config.sweep_interval());
        scheduler.schedule_every(TaskKind::DailyQuests, now, config.daily_check_interval());

        let mut session = Self {
            email: account.email,
            user_id: account.user_id,
            state,
            queue: NotificationQueue::new(config.popup_duration()),
            scheduler,
            popup_task: None,
            store,
            config,
            generator,
        };
        tracing::info!(user_id = %session.user_id, quests = session.state.quests.len(), "session started");

        session.tick(now);
        session
    }

    /// Cancel every timer, flush state and hand the store back
    pub fn logout(mut self, now: DateTime<Utc>) -> SessionStore<S> {
        self.scheduler.cancel_all();
        self.popup_task = None;
        self.queue.clear();
        self.persist();
        tracing::info!(user_id = %self.user_id, at = %now, "session ended");
        self.store
    }

    // ========================
    // Accessors
    // ========================

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_popup(&self) -> Option<&Popup> {
        self.queue.current()
    }

    pub fn pending_notifications(&self) -> usize {
        self.queue.pending_len()
    }

    /// When the next timer is due, if any
    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        self.scheduler.next_due()
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    // ========================
    // Timers
    // ========================

    /// Run every timer due at `now`, then advance the popup display.
    ///
    /// Returns the event of the popup shown by this tick, if one was.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<NotificationEvent> {
        let mut changed = false;

        for (id, kind) in self.scheduler.poll(now) {
            match kind {
                TaskKind::Sweep => {
                    let events = self.state.run_sweep(&self.config, now);
                    changed |= !events.is_empty();
                    self.queue.extend(events);
                }
                TaskKind::DailyQuests => {
                    let count = self.config.daily_quest_count;
                    let last_generated = self.state.last_generated_at;
                    let events = self.state.generate_daily_if_due(&mut self.generator, count, now);
                    changed |= !events.is_empty() || self.state.last_generated_at != last_generated;
                    self.queue.extend(events);
                }
                TaskKind::DismissPopup => {
                    if self.popup_task == Some(id) {
                        self.popup_task = None;
                    }
                    if let Some(event) = self.queue.expire(now) {
                        tracing::debug!(kind = ?event.kind, quest_id = %event.quest_id, "popup auto-dismissed");
                    }
                }
            }
        }

        if changed {
            self.persist();
        }
        self.show_next(now)
    }

    fn show_next(&mut self, now: DateTime<Utc>) -> Option<NotificationEvent> {
        let popup = self.queue.show_next(now)?;
        let (event, dismiss_at) = (popup.event.clone(), popup.dismiss_at);
        self.popup_task = Some(self.scheduler.schedule_once(TaskKind::DismissPopup, dismiss_at));
        tracing::debug!(kind = ?event.kind, quest_id = %event.quest_id, "popup shown");
        Some(event)
    }

    fn close_popup(&mut self) -> Option<NotificationEvent> {
        if let Some(task) = self.popup_task.take() {
            self.scheduler.cancel(task);
        }
        self.queue.dismiss()
    }

    fn persist(&mut self) {
        self.store.save_user(&self.user_id, &self.state.to_blob());
        auth::update_profile(&mut self.store, &self.email, self.state.profile());
    }

    // ========================
    // User actions
    // ========================

    /// Generate quests on demand, announcing each
    pub fn generate(
        &mut self,
        count: usize,
        subject: Option<Subject>,
        now: DateTime<Utc>,
    ) -> Vec<NotificationEvent> {
        let events = self.state.generate(&mut self.generator, count, subject, now);
        self.queue.extend(events.iter().cloned());
        self.persist();
        self.show_next(now);
        events
    }

    pub fn add_quest(&mut self, draft: QuestDraft, now: DateTime<Utc>) -> Result<Quest> {
        let id = self.generator.next_id();
        let quest = self.state.add_manual(draft, id, now)?.clone();
        self.persist();
        Ok(quest)
    }

    /// Mark a quest done and queue its confirmation popup.
    ///
    /// A quest has at most one confirmation popup shown or waiting.
    pub fn complete(&mut self, quest_id: &str, now: DateTime<Utc>) -> Result<()> {
        let event = self.state.begin_completion(quest_id)?;
        if !self.queue.contains(|e| is_completion_of(e, quest_id)) {
            self.queue.enqueue(event);
        }
        self.persist();
        self.show_next(now);
        Ok(())
    }

    pub fn claim(&mut self, quest_id: &str, now: DateTime<Utc>) -> Result<ClaimOutcome> {
        let outcome = self.state.claim(quest_id, &self.config, now)?;
        self.forget_notifications(quest_id, |e| is_completion_of(e, quest_id));
        self.queue.extend(outcome.events.iter().cloned());
        self.persist();
        self.show_next(now);
        Ok(outcome)
    }

    pub fn undo(&mut self, quest_id: &str, now: DateTime<Utc>) -> Result<()> {
        self.state.undo(quest_id)?;
        self.forget_notifications(quest_id, |e| is_completion_of(e, quest_id));
        self.persist();
        self.show_next(now);
        Ok(())
    }

    /// Claim the quest whose completion popup is on screen
    pub fn claim_current(&mut self, now: DateTime<Utc>) -> Result<ClaimOutcome> {
        let quest_id = self.current_completion()?;
        self.claim(&quest_id, now)
    }

    /// Undo the quest whose completion popup is on screen
    pub fn undo_current(&mut self, now: DateTime<Utc>) -> Result<()> {
        let quest_id = self.current_completion()?;
        self.undo(&quest_id, now)
    }

    fn current_completion(&self) -> Result<String> {
        match self.queue.current() {
            Some(popup) if popup.event.kind == EventKind::Complete => Ok(popup.event.quest_id.clone()),
            _ => Err(CoreError::InvalidState("no completion awaiting confirmation".into())),
        }
    }

    /// Close the popup and drop waiting events that no longer apply
    fn forget_notifications<F>(&mut self, quest_id: &str, matches: F)
    where
        F: Fn(&NotificationEvent) -> bool,
    {
        let showing = self.queue.current().is_some_and(|p| matches(&p.event));
        if showing {
            self.close_popup();
        }
        let dropped = self.queue.discard(&matches);
        if showing || dropped > 0 {
            tracing::debug!(quest_id, dropped, "notifications withdrawn");
        }
    }

    /// Close the current popup without acting on it
    pub fn dismiss(&mut self, now: DateTime<Utc>) -> Option<NotificationEvent> {
        let dismissed = self.close_popup();
        self.show_next(now);
        dismissed
    }

    pub fn remove(&mut self, quest_id: &str) -> Result<Quest> {
        let quest = self.state.remove(quest_id)?;
        self.forget_notifications(quest_id, |e| e.quest_id == quest_id);
        self.persist();
        Ok(quest)
    }

    pub fn allocate_point(&mut self, attribute: Attribute) -> Result<u32> {
        let value = self.state.allocate_point(attribute)?;
        self.persist();
        Ok(value)
    }
}

fn is_completion_of(event: &NotificationEvent, quest_id: &str) -> bool {
    event.kind == EventKind::Complete && event.quest_id == quest_id
}
