//! Shared domain types for Reverie.
//!
//! This crate contains the core domain types used across the Reverie server:
//! conversations, character profiles, lorebooks, memories, generation
//! settings, LLM wire types, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod character;
pub mod chat;
pub mod error;
pub mod llm;
pub mod lorebook;
pub mod memory;
pub mod settings;
pub mod usage;
