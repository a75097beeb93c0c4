//! Kitchen Core: shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that all bounded
//! contexts depend on: events, aggregates, the event repository port,
//! access control and the identity and storage collaborators. It contains no
//! infrastructure code.

pub mod access;
pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod identity;
pub mod repository;
pub mod storage;
pub mod stream;
