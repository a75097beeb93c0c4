//! Application layer for the Project context.

pub mod command_handlers;
pub mod query_handlers;
