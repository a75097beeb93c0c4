//! Collaborative script kitchen: Export.
//!
//! Renders the ordered script as text and packs the adopted images into a
//! downloadable archive. A single image that cannot be fetched never sinks
//! the bundle; it is reported next to it.

pub mod application;
pub mod archive;
pub mod domain;
pub mod fetch;
