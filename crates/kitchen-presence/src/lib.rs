//! Collaborative script kitchen: Presence bounded context.
//!
//! Participants report liveness by heartbeat. Who counts as active is
//! decided at read time against a sliding window; nothing sweeps stale rows.

pub mod application;
pub mod domain;
pub mod memory;
