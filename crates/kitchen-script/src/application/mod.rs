//! Application layer for the Script context.

pub mod command_handlers;
pub mod query_handlers;
