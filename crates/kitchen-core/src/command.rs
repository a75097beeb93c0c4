//! Command abstractions.

use uuid::Uuid;

/// Trait that all commands implement.
///
/// Every command in the kitchen targets exactly one project, which is what
/// lets handlers locate the project-scoped event streams.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this command (for logging/routing).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this command through the system.
    fn correlation_id(&self) -> Uuid;

    /// The project this command mutates.
    fn project_id(&self) -> Uuid;
}
