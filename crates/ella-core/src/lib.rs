//! Business logic and repository trait definitions for Ella.
//!
//! This crate defines the "ports" (repository and provider traits) that the
//! infrastructure layer implements, plus the orchestration core: the
//! entitlement gate, the durable step runner and the response generator.
//! It depends only on `ella-types` -- never on `ella-infra` or any
//! database/IO crate.

pub mod chat;
pub mod conversation;
pub mod job;
pub mod llm;
pub mod prompt;
pub mod provider;
pub mod repository;
pub mod user;

#[cfg(test)]
pub(crate) mod testing;
