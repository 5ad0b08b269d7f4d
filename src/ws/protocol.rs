//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is one named event: `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::game::Participant;

/// Position or Euler rotation (radians) in arena space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Latest local transform of the sender's ship
    UpdateState { position: Vec3, rotation: Vec3 },

    /// Shot fired from `position`
    Shoot {
        position: Vec3,
        #[serde(default)]
        rotation: Vec3,
        #[serde(default)]
        direction: Vec3,
    },

    /// Requested display name; any JSON scalar is accepted
    SetUsername(serde_json::Value),

    /// Explicit respawn request. Respawn is timer driven, so this is ignored.
    Respawn,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Transport handshake: tells the client its connection id. Sent by the
    /// session itself, always the first frame on a socket.
    Connect { id: Uuid },

    /// Full snapshot for a freshly connected client
    CurrentPlayers(HashMap<Uuid, Participant>),

    /// Another client joined
    NewPlayer(Participant),

    /// Another client moved
    PlayerMoved {
        id: Uuid,
        position: Vec3,
        rotation: Vec3,
    },

    /// Shot echo, delivered to the shooter as well
    PlayerShot {
        id: Uuid,
        position: Vec3,
        rotation: Vec3,
        direction: Vec3,
        /// Unix milliseconds
        timestamp: u64,
    },

    PlayerHit { id: Uuid, hp: u32 },

    PlayerDied { id: Uuid },

    PlayerRespawn { id: Uuid, position: Vec3 },

    /// Canonical order: kills desc, deaths asc
    Scoreboard(Vec<ScoreEntry>),

    PlayerDisconnected(Uuid),
}

impl ServerMsg {
    /// Wire event name, for logging
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMsg::Connect { .. } => "connect",
            ServerMsg::CurrentPlayers(_) => "currentPlayers",
            ServerMsg::NewPlayer(_) => "newPlayer",
            ServerMsg::PlayerMoved { .. } => "playerMoved",
            ServerMsg::PlayerShot { .. } => "playerShot",
            ServerMsg::PlayerHit { .. } => "playerHit",
            ServerMsg::PlayerDied { .. } => "playerDied",
            ServerMsg::PlayerRespawn { .. } => "playerRespawn",
            ServerMsg::Scoreboard(_) => "scoreboard",
            ServerMsg::PlayerDisconnected(_) => "playerDisconnected",
        }
    }
}

/// One scoreboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: Uuid,
    pub username: String,
    pub kills: u32,
    pub deaths: u32,
    pub color: String,
}
