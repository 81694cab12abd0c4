//! Repository trait definitions ("ports").
//!
//! Implementations live in reverie-infra. All traits use native async fn in
//! traits (RPITIT, Rust 2024 edition) and return `RepositoryError`.

pub mod character;
pub mod conversation;
pub mod lorebook;
pub mod memory;
pub mod settings;
pub mod usage;

pub use character::CharacterRepository;
pub use conversation::ConversationRepository;
pub use lorebook::LorebookRepository;
pub use memory::MemoryRepository;
pub use settings::SettingsRepository;
pub use usage::UsageRepository;
