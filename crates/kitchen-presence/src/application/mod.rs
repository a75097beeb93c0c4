//! Application layer for the Presence context.

pub mod command_handlers;
pub mod query_handlers;
