//! Collaborative script kitchen: Proposal bounded context.
//!
//! Participants propose alternative text for a section; reviewers apply or
//! reject each proposal. Applying writes the proposed text into the section
//! and then marks the proposal approved.

pub mod application;
pub mod domain;
