//! Domain layer for the Curation context.

pub mod aggregates;
pub mod commands;
pub mod events;
