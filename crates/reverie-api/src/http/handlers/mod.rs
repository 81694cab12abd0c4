//! HTTP request handlers.

pub mod admin;
pub mod character;
pub mod chat;
pub mod conversation;
pub mod lorebook;
pub mod memory;
