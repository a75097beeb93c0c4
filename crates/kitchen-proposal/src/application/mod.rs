//! Application layer for the Proposal context.

pub mod command_handlers;
pub mod query_handlers;
