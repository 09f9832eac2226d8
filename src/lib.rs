//! HTTP control surface over a WhatsApp Web session.
//!
//! The actual protocol session lives in an external bridge process; this
//! crate owns the session lifecycle state, outbound-message gating, phone
//! normalization and the HTTP surface.

pub mod config;
pub mod pairing;
pub mod phone;
pub mod provider;
pub mod state;
pub mod web;
