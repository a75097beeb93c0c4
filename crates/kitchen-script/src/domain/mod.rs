//! Domain layer for the Script context.

pub mod aggregates;
pub mod commands;
pub mod draft;
pub mod events;
pub mod import;
