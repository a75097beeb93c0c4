//! HTTP service for the collaborative script kitchen.

pub mod config;
pub mod error;
pub mod feed;
pub mod identity;
pub mod routes;
pub mod state;
pub mod telemetry;
