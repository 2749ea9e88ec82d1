// Session persistence
// JSON blobs over an opaque key-value store; failures are logged and swallowed

pub mod error;
pub mod format;
pub mod manager;
pub mod migration;
pub mod store;

pub use error::StoreError;
pub use format::{AccountRecord, ProfileSnapshot, UserBlob};
pub use manager::SessionStore;
pub use migration::migrate_blob;
pub use store::{FileStore, KeyValueStore, MemoryStore};

pub const SAVE_VERSION: u32 = 1;
