//! Application layer for export.

pub mod query_handlers;
