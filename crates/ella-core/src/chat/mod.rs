//! Inbound chat requests: the entitlement gate and the dispatch service that
//! either enqueues a response job or resolves the placeholder on denial.

pub mod gate;
pub mod service;
