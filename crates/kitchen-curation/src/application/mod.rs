//! Application layer for the Curation context.

pub mod command_handlers;
pub mod query_handlers;
