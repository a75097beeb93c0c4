//! Collaborative script kitchen: Script bounded context.
//!
//! Owns the ordered section sequence of every project. All sections of a
//! project live in one event stream, so indexes are always `0..N` and
//! concurrent structural edits surface as concurrency conflicts instead of
//! corrupting the order.

pub mod application;
pub mod domain;
