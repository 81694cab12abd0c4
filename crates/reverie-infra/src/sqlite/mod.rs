//! SQLite repository implementations.

pub mod character;
pub mod conversation;
pub mod lorebook;
pub mod memory;
pub mod pool;
pub mod settings;
pub mod usage;

pub use character::SqliteCharacterRepository;
pub use conversation::SqliteConversationRepository;
pub use lorebook::SqliteLorebookRepository;
pub use memory::SqliteMemoryRepository;
pub use pool::DatabasePool;
pub use settings::SqliteSettingsRepository;
pub use usage::SqliteUsageRepository;
