//! Collaborative script kitchen: Image curation bounded context.
//!
//! Contributors upload candidate images for sections straight to object
//! storage and register them here; reviewers then adopt (select) images per
//! section for the final export.

pub mod application;
pub mod domain;
pub mod storage;
