//! Business logic and repository trait definitions for Reverie.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, plus the prompt-assembly and streaming-completion
//! pipeline built on them. It depends only on `reverie-types` -- never on
//! `reverie-infra` or any database/IO crate.

pub mod chat;
pub mod llm;
pub mod repository;
