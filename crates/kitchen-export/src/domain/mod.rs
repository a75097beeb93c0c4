//! Domain layer for export: bundle types, entry naming and script text.

pub mod bundle;
pub mod naming;
pub mod script_text;
