use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::history::History;
use crate::quest::Quest;
use crate::stats::Stats;

/// Key holding every registered account, by normalized email
pub const ACCOUNTS_KEY: &str = "sq.accounts";

/// Key holding the normalized email of the last user to log in
pub const LAST_IDENTITY_KEY: &str = "sq.lastIdentity";

/// Key holding one user's [`UserBlob`]
pub fn user_key(user_id: &str) -> String {
    format!("sq.user.{}", user_id)
}

/// Everything persisted for one user
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserBlob {
    /// Format version; blobs written before versioning read as 0
    #[serde(default)]
    pub version: u32,

    #[serde(default)]
    pub quests: Vec<Quest>,

    /// Experience log, most recent first
    #[serde(default)]
    pub history: History,

    #[serde(default)]
    pub stats: Stats,

    #[serde(default)]
    pub exp: u32,

    #[serde(default = "default_level")]
    pub level: u32,

    #[serde(default)]
    pub unspent: u32,

    #[serde(default)]
    pub last_generated_at: Option<DateTime<Utc>>,
}

fn default_level() -> u32 {
    1
}

impl Default for UserBlob {
    fn default() -> Self {
        Self {
            version: super::SAVE_VERSION,
            quests: Vec::new(),
            history: History::new(),
            stats: Stats::default(),
            exp: 0,
            level: 1,
            unspent: 0,
            last_generated_at: None,
        }
    }
}

/// Progress mirrored into the account directory
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub exp: u32,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub unspent: u32,
}

impl Default for ProfileSnapshot {
    fn default() -> Self {
        Self { stats: Stats::default(), exp: 0, level: 1, unspent: 0 }
    }
}

/// One registered local account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub email: String,
    /// Obscured, never the plain password
    pub password: String,
    pub user_id: String,
    #[serde(default)]
    pub profile: ProfileSnapshot,
}
