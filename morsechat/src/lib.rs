//! MorseChat: encrypted Morse code chat over a WebSocket broadcast hub.
//!
//! Typed text is rendered as Morse, framed together with the text,
//! encrypted with a pre-shared key and broadcast through a
//! `morsechat-relay` hub to every participant.

pub mod app;
pub mod chat;
pub mod cipher;
pub mod config;
pub mod net;
pub mod transport;
pub mod ui;
