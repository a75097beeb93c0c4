//! Domain layer for the Presence context.

pub mod commands;
pub mod presence;
pub mod repository;
