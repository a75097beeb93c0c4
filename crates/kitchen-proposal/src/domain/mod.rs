//! Domain layer for the Proposal context.

pub mod aggregates;
pub mod commands;
pub mod draft;
pub mod events;
