//! Collaborative script kitchen: Project lifecycle bounded context.
//!
//! Owns the project record and its phase. The phase controller decides
//! which operations are open in each phase, who may move the project
//! forward, and which tab a participant is shown.

pub mod application;
pub mod domain;
