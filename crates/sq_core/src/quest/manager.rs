use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::*;
use crate::error::{CoreError, Result};

/// The user's quest list, in creation order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestBook {
    quests: Vec<Quest>,
}

impl QuestBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_quests(quests: Vec<Quest>) -> Self {
        Self { quests }
    }

    pub fn add(&mut self, quest: Quest) -> &Quest {
        self.quests.push(quest);
        &self.quests[self.quests.len() - 1]
    }

    pub fn get(&self, quest_id: &str) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == quest_id)
    }

    pub fn get_mut(&mut self, quest_id: &str) -> Option<&mut Quest> {
        self.quests.iter_mut().find(|q| q.id == quest_id)
    }

    fn require_mut(&mut self, quest_id: &str) -> Result<&mut Quest> {
        self.get_mut(quest_id).ok_or_else(|| CoreError::quest_not_found(quest_id))
    }

    pub fn remove(&mut self, quest_id: &str) -> Result<Quest> {
        let idx = self
            .quests
            .iter()
            .position(|q| q.id == quest_id)
            .ok_or_else(|| CoreError::quest_not_found(quest_id))?;
        Ok(self.quests.remove(idx))
    }

    /// Mark a quest as awaiting claim/undo
    pub fn begin_completion(&mut self, quest_id: &str) -> Result<&Quest> {
        let quest = self.require_mut(quest_id)?;
        if quest.completed {
            return Err(CoreError::InvalidState(format!("Quest {} is already completed", quest_id)));
        }
        quest.pending_complete = true;
        Ok(quest)
    }

    /// Commit a pending completion
    pub fn claim(&mut self, quest_id: &str) -> Result<&Quest> {
        let quest = self.require_mut(quest_id)?;
        if !quest.pending_complete || quest.completed {
            return Err(CoreError::InvalidState(format!(
                "Quest {} has no pending completion",
                quest_id
            )));
        }
        quest.pending_complete = false;
        quest.completed = true;
        Ok(quest)
    }

    /// Revert a pending completion
    pub fn undo(&mut self, quest_id: &str) -> Result<&Quest> {
        let quest = self.require_mut(quest_id)?;
        if !quest.pending_complete {
            return Err(CoreError::InvalidState(format!(
                "Quest {} has no pending completion",
                quest_id
            )));
        }
        quest.pending_complete = false;
        Ok(quest)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quest> {
        self.quests.iter()
    }

    pub fn as_mut_slice(&mut self) -> &mut [Quest] {
        &mut self.quests
    }

    pub fn as_slice(&self) -> &[Quest] {
        &self.quests
    }

    pub fn active(&self) -> impl Iterator<Item = &Quest> {
        self.quests.iter().filter(|q| q.is_active())
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    pub fn statistics(&self, now: DateTime<Utc>) -> QuestStatistics {
        let total = self.quests.len();
        let completed = self.quests.iter().filter(|q| q.completed).count();
        let pending = self.quests.iter().filter(|q| q.pending_complete).count();
        let overdue = self.active().filter(|q| q.due_at().is_some_and(|due| due < now)).count();
        let penalized = self.quests.iter().filter(|q| q.alert.is_penalized()).count();

        QuestStatistics { total, completed, active: total - completed, pending, overdue, penalized }
    }
}

/// Quest statistics for UI display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestStatistics {
    pub total: usize,
    pub completed: usize,
    pub active: usize,
    pub pending: usize,
    pub overdue: usize,
    pub penalized: usize,
}
