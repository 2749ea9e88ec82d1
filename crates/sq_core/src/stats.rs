//! Permanent character attributes raised by claimed quests and spent points.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Logic,
    Curiosity,
    Expression,
    Memory,
    Focus,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::Logic,
        Attribute::Curiosity,
        Attribute::Expression,
        Attribute::Memory,
        Attribute::Focus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Logic => "logic",
            Attribute::Curiosity => "curiosity",
            Attribute::Expression => "expression",
            Attribute::Memory => "memory",
            Attribute::Focus => "focus",
        }
    }

    pub fn parse(name: &str) -> Option<Attribute> {
        let name = name.trim().to_ascii_lowercase();
        Attribute::ALL.into_iter().find(|a| a.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default = "default_stat")]
    pub logic: u32,
    #[serde(default = "default_stat")]
    pub curiosity: u32,
    #[serde(default = "default_stat")]
    pub expression: u32,
    #[serde(default = "default_stat")]
    pub memory: u32,
    #[serde(default = "default_stat")]
    pub focus: u32,
}

fn default_stat() -> u32 {
    1
}

impl Default for Stats {
    fn default() -> Self {
        Self { logic: 1, curiosity: 1, expression: 1, memory: 1, focus: 1 }
    }
}

impl Stats {
    pub fn get(&self, attribute: Attribute) -> u32 {
        match attribute {
            Attribute::Logic => self.logic,
            Attribute::Curiosity => self.curiosity,
            Attribute::Expression => self.expression,
            Attribute::Memory => self.memory,
            Attribute::Focus => self.focus,
        }
    }

    fn slot_mut(&mut self, attribute: Attribute) -> &mut u32 {
        match attribute {
            Attribute::Logic => &mut self.logic,
            Attribute::Curiosity => &mut self.curiosity,
            Attribute::Expression => &mut self.expression,
            Attribute::Memory => &mut self.memory,
            Attribute::Focus => &mut self.focus,
        }
    }

    pub fn increment(&mut self, attribute: Attribute, amount: u32) {
        let slot = self.slot_mut(attribute);
        *slot = slot.saturating_add(amount);
    }

    pub fn total(&self) -> u32 {
        Attribute::ALL.iter().map(|a| self.get(*a)).sum()
    }
}

/// Spend one unspent attribute point on `attribute`.
pub fn allocate_point(stats: &mut Stats, unspent: &mut u32, attribute: Attribute) -> Result<u32> {
    if *unspent == 0 {
        return Err(CoreError::InvalidState("No unspent attribute points".to_string()));
    }
    *unspent -= 1;
    stats.increment(attribute, 1);
    Ok(stats.get(attribute))
}
