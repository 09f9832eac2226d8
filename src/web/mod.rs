//! HTTP control surface for the relay
//!
//! REST endpoints for health, pairing-code retrieval, sending and status.

mod api;
mod server;

pub use server::WebServer;
