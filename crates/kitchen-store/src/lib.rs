//! PostgreSQL persistence for the collaborative script kitchen.
//!
//! The schema lives in the workspace `migrations/` directory and is applied
//! with [`MIGRATOR`].

pub mod pg_event_repository;
pub mod pg_presence_repository;

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

pub(crate) fn database_error(e: sqlx::Error) -> kitchen_core::error::DomainError {
    kitchen_core::error::DomainError::Infrastructure(format!("database error: {e}"))
}
