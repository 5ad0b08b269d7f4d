//! Arena Server - authoritative state synchronization for a multiplayer ship arena
//!
//! The library exposes the server components for the binary and for tests:
//! - `game`: participant registry, combat resolution, fan-out and the arena task
//! - `ws`: WebSocket session handling and the named-event wire protocol
//! - `http`: router with health check and static asset serving

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;
pub mod ws;
