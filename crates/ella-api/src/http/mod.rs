//! HTTP layer for Ella.
//!
//! Two legacy routes (`/api/chat`, `/api/generate-title`) plus the
//! envelope-format REST API under `/api/v1/`, all behind bearer-token
//! authentication, with CORS and request tracing.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
