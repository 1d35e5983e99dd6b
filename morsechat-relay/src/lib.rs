//! `MorseChat` hub library.
//!
//! Exposes the broadcast hub for use in tests and embedding. The hub
//! accepts WebSocket connections and re-broadcasts every encrypted frame it
//! receives to all connected clients.

pub mod config;
pub mod hub;
