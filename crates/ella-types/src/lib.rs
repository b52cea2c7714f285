//! Shared domain types for Ella.
//!
//! This crate contains the domain types used across the Ella backend:
//! users, conversations, messages, tool directives, job runs, provider
//! request/response shapes, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod conversation;
pub mod error;
pub mod image;
pub mod job;
pub mod llm;
pub mod search;
pub mod tool;
pub mod user;
