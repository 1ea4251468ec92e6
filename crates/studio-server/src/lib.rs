//! Local HTTP/WebSocket API over the image studio core.
//!
//! Split from main.rs so the router can be driven from integration tests.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;
