//! Falkon HTTP server.
//!
//! Wires the message store, capability gating, and HTTP routes into an Axum
//! application serving the contact message API at `/v1/messages` and a
//! health probe at `/v1/sys/health`.

pub mod auth;
pub mod capability;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
