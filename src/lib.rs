// shoplist - Ordered shopping list with pluggable key-value persistence

pub mod codec;
pub mod config;
pub mod file;
pub mod filter;
pub mod item;
pub mod sqlite;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use codec::{DEFAULT_KEY, load_items, save_items};
pub use config::{Backend, Config};
pub use file::FileStorage;
pub use filter::{ClearScope, Filter};
pub use item::{IdGenerator, Item, SequentialIds, UuidV7Ids};
pub use sqlite::SqliteStorage;
pub use storage::{KeyValueStorage, MemoryStorage};
pub use store::{ListStore, StoreError};
