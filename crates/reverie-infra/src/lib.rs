//! Infrastructure layer: SQLite repositories and LLM provider adapters.
//!
//! Implements the repository traits from `reverie-core` with sqlx, and the
//! `ChatProvider` trait with raw reqwest clients that hand-decode SSE bodies.

pub mod llm;
pub mod sqlite;
