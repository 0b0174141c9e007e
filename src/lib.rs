//! Server-authoritative synchronized playback for watch-together groups.

pub mod common;
pub mod configs;
pub mod protocol;
pub mod server;
pub mod transport;
pub mod ws;
