//! Session registry - authoritative set of connected participants

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::ws::protocol::{ScoreEntry, Vec3};

/// Health on spawn and respawn
pub const MAX_HP: u32 = 100;

/// Longest accepted display name, in characters
pub const MAX_USERNAME_CHARS: usize = 16;

/// Server-tracked state for one live connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub position: Vec3,
    pub rotation: Vec3,
    /// Fixed for the lifetime of the connection
    pub color: String,
    pub username: String,
    /// 0..=MAX_HP
    pub hp: u32,
    /// False between death and respawn
    pub alive: bool,
    pub kills: u32,
    pub deaths: u32,
}

/// In-memory keyed store of participants.
///
/// Owned by the arena task, so every mutation is serialized.
#[derive(Debug)]
pub struct SessionRegistry {
    participants: HashMap<Uuid, Participant>,
    /// Suffix for the next generated `Player<N>` name
    next_username: u64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            participants: HashMap::new(),
            next_username: 1,
        }
    }

    /// Produce the next `Player<N>` name. N never repeats within the process.
    pub fn generate_username(&mut self) -> String {
        let name = format!("Player{}", self.next_username);
        self.next_username += 1;
        name
    }

    /// Register a participant with identity defaults and full health.
    ///
    /// Returns `None` if the id is already registered.
    pub fn create(&mut self, id: Uuid, position: Vec3, color: String) -> Option<&Participant> {
        if self.participants.contains_key(&id) {
            return None;
        }

        let participant = Participant {
            id,
            position,
            rotation: Vec3::ZERO,
            color,
            username: self.generate_username(),
            hp: MAX_HP,
            alive: true,
            kills: 0,
            deaths: 0,
        };

        Some(self.participants.entry(id).or_insert(participant))
    }

    /// Store a new transform. Returns false (no-op) for unknown or dead participants.
    pub fn upsert_position(&mut self, id: Uuid, position: Vec3, rotation: Vec3) -> bool {
        match self.participants.get_mut(&id) {
            Some(p) if p.alive => {
                p.position = position;
                p.rotation = rotation;
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn get_mut(&mut self, id: &Uuid) -> Option<&mut Participant> {
        self.participants.get_mut(id)
    }

    pub fn remove(&mut self, id: &Uuid) -> Option<Participant> {
        self.participants.remove(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.participants.contains_key(id)
    }

    /// Snapshot of every participant, keyed by id
    pub fn all(&self) -> HashMap<Uuid, Participant> {
        self.participants.clone()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.values_mut()
    }

    /// Apply a requested display name.
    ///
    /// The name is cut to `MAX_USERNAME_CHARS` characters; an empty name falls
    /// back to a generated one. Returns the applied name, or `None` for an
    /// unknown id.
    pub fn set_username(&mut self, id: Uuid, requested: &str) -> Option<&str> {
        if !self.participants.contains_key(&id) {
            return None;
        }

        let mut name: String = requested.chars().take(MAX_USERNAME_CHARS).collect();
        if name.is_empty() {
            name = self.generate_username();
        }

        let participant = self.participants.get_mut(&id)?;
        participant.username = name;
        Some(participant.username.as_str())
    }

    /// Scoreboard rows: kills desc, deaths asc, then username and id for a stable order
    pub fn scoreboard(&self) -> Vec<ScoreEntry> {
        let mut rows: Vec<ScoreEntry> = self
            .participants
            .values()
            .map(|p| ScoreEntry {
                id: p.id,
                username: p.username.clone(),
                kills: p.kills,
                deaths: p.deaths,
                color: p.color.clone(),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.kills
                .cmp(&a.kills)
                .then(a.deaths.cmp(&b.deaths))
                .then_with(|| a.username.cmp(&b.username))
                .then(a.id.cmp(&b.id))
        });
        rows
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
