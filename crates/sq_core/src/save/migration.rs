use std::collections::HashSet;

use super::format::UserBlob;
use super::SAVE_VERSION;

/// Bring a loaded blob up to the current version and repair what a
/// hand-edited or truncated blob can get wrong.
pub fn migrate_blob(mut blob: UserBlob, history_cap: usize) -> UserBlob {
    let original_version = blob.version;

    blob = match blob.version {
        0 => migrate_v0_to_v1(blob),
        SAVE_VERSION => blob,
        v => {
            tracing::warn!(version = v, current = SAVE_VERSION, "loading blob from a newer version");
            blob
        }
    };

    if blob.level == 0 {
        tracing::warn!("blob has level 0, resetting to 1");
        blob.level = 1;
    }
    if blob.history.len() > history_cap {
        blob.history.truncate(history_cap);
    }

    blob.version = SAVE_VERSION;

    if original_version != SAVE_VERSION {
        tracing::info!(from = original_version, to = SAVE_VERSION, "migrated user blob");
    }
    blob
}

/// Version 0 blobs predate unique quest ids; keep the first of each id
fn migrate_v0_to_v1(mut blob: UserBlob) -> UserBlob {
    let mut seen = HashSet::new();
    let before = blob.quests.len();
    blob.quests.retain(|quest| seen.insert(quest.id.clone()));

    let dropped = before - blob.quests.len();
    if dropped > 0 {
        tracing::warn!(dropped, "dropped quests with duplicate ids");
    }
    blob
}
