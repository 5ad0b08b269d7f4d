//! Arena state and the authoritative event loop
//!
//! One task owns the registry and processes commands strictly in arrival
//! order, so every handler runs to completion before the next starts.
//! Connections talk to it through an [`ArenaHandle`].

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ArenaConfig;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg, Vec3};

use super::broadcast::{BroadcastDispatcher, Outbound};
use super::combat::{CombatSystem, ShotOutcome};
use super::registry::SessionRegistry;
use super::spawn::{random_color, random_spawn};

/// Command queue depth
const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Commands processed by the arena task
#[derive(Debug)]
pub enum ArenaCommand {
    /// Connection accepted by the transport
    Connect { id: Uuid, outbound: Outbound },
    /// Inbound event from a connection
    Input { id: Uuid, msg: ClientMsg },
    /// Transport reported the connection gone
    Disconnect { id: Uuid },
    /// Respawn timer fired
    Respawn { id: Uuid },
}

/// Handle to the running arena
#[derive(Clone)]
pub struct ArenaHandle {
    cmd_tx: mpsc::Sender<ArenaCommand>,
    participant_count: Arc<AtomicUsize>,
}

impl ArenaHandle {
    /// Register a connection. Returns false if the arena has shut down.
    pub async fn connect(&self, id: Uuid, outbound: Outbound) -> bool {
        self.cmd_tx
            .send(ArenaCommand::Connect { id, outbound })
            .await
            .is_ok()
    }

    /// Forward an inbound event. Returns false if the arena has shut down.
    pub async fn input(&self, id: Uuid, msg: ClientMsg) -> bool {
        self.cmd_tx
            .send(ArenaCommand::Input { id, msg })
            .await
            .is_ok()
    }

    pub async fn disconnect(&self, id: Uuid) {
        let _ = self.cmd_tx.send(ArenaCommand::Disconnect { id }).await;
    }

    pub fn participant_count(&self) -> usize {
        self.participant_count.load(Ordering::Relaxed)
    }
}

/// The authoritative arena
pub struct Arena {
    registry: SessionRegistry,
    dispatcher: BroadcastDispatcher,
    rng: ChaCha8Rng,
    respawn_delay: Duration,
    cmd_rx: mpsc::Receiver<ArenaCommand>,
    /// Weak so pending timers don't keep the loop alive after shutdown
    timer_tx: mpsc::WeakSender<ArenaCommand>,
    participant_count: Arc<AtomicUsize>,
}

impl Arena {
    /// Create a new arena and the handle used to reach it
    pub fn new(config: &ArenaConfig) -> (Self, ArenaHandle) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let participant_count = Arc::new(AtomicUsize::new(0));

        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let arena = Self {
            registry: SessionRegistry::new(),
            dispatcher: BroadcastDispatcher::new(),
            rng,
            respawn_delay: config.respawn_delay,
            cmd_rx,
            timer_tx: cmd_tx.downgrade(),
            participant_count: participant_count.clone(),
        };

        let handle = ArenaHandle {
            cmd_tx,
            participant_count,
        };

        (arena, handle)
    }

    /// Process commands until every handle is dropped
    pub async fn run(mut self) {
        info!("Arena started");

        while let Some(cmd) = self.cmd_rx.recv().await {
            self.handle_command(cmd);
        }

        info!(
            participants = self.registry.len(),
            "All handles dropped, arena stopped"
        );
    }

    pub fn handle_command(&mut self, cmd: ArenaCommand) {
        match cmd {
            ArenaCommand::Connect { id, outbound } => self.handle_connect(id, outbound),
            ArenaCommand::Input { id, msg } => self.handle_input(id, msg),
            ArenaCommand::Disconnect { id } => self.handle_disconnect(id),
            ArenaCommand::Respawn { id } => self.handle_respawn(id),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    fn handle_input(&mut self, id: Uuid, msg: ClientMsg) {
        if !self.registry.contains(&id) {
            debug!(participant_id = %id, "Input from unknown participant ignored");
            return;
        }

        match msg {
            ClientMsg::UpdateState { position, rotation } => {
                self.handle_update_state(id, position, rotation);
            }
            ClientMsg::Shoot {
                position,
                rotation,
                direction,
            } => {
                self.handle_shoot(id, position, rotation, direction);
            }
            ClientMsg::SetUsername(requested) => {
                self.handle_set_username(id, &requested);
            }
            ClientMsg::Respawn => {
                debug!(participant_id = %id, "Respawn is timer driven, request ignored");
            }
        }
    }

    /// Connection entered ACTIVE
    fn handle_connect(&mut self, id: Uuid, outbound: Outbound) {
        let position = random_spawn(&mut self.rng);
        let color = random_color(&mut self.rng);

        let participant = match self.registry.create(id, position, color) {
            Some(p) => p.clone(),
            None => {
                warn!(participant_id = %id, "Participant already connected");
                return;
            }
        };

        self.dispatcher.register(id, outbound);
        self.sync_participant_count();

        info!(
            participant_id = %id,
            username = %participant.username,
            participant_count = self.registry.len(),
            "Participant connected"
        );

        self.dispatcher
            .to(id, ServerMsg::CurrentPlayers(self.registry.all()));
        self.dispatcher
            .all_except(id, ServerMsg::NewPlayer(participant));
        self.broadcast_scoreboard();
    }

    fn handle_update_state(&mut self, id: Uuid, position: Vec3, rotation: Vec3) {
        if !self.registry.upsert_position(id, position, rotation) {
            debug!(participant_id = %id, "Movement while dead ignored");
            return;
        }

        self.dispatcher.all_except(
            id,
            ServerMsg::PlayerMoved {
                id,
                position,
                rotation,
            },
        );
    }

    fn handle_shoot(&mut self, id: Uuid, position: Vec3, rotation: Vec3, direction: Vec3) {
        let shooter_alive = self.registry.get(&id).map_or(false, |p| p.alive);
        if !shooter_alive {
            debug!(participant_id = %id, "Shot while dead ignored");
            return;
        }

        for outcome in CombatSystem::resolve_shot(&mut self.registry, id, position) {
            match outcome {
                ShotOutcome::Hit { target_id, hp } => {
                    debug!(shooter_id = %id, target_id = %target_id, hp, "Hit");
                    self.dispatcher
                        .all(ServerMsg::PlayerHit { id: target_id, hp });
                }
                ShotOutcome::Killed {
                    target_id,
                    shooter_id,
                } => {
                    info!(shooter_id = %shooter_id, target_id = %target_id, "Participant killed");
                    self.dispatcher.all(ServerMsg::PlayerDied { id: target_id });
                    self.broadcast_scoreboard();
                    self.schedule_respawn(target_id);
                }
            }
        }

        self.dispatcher.all(ServerMsg::PlayerShot {
            id,
            position,
            rotation,
            direction,
            timestamp: unix_millis(),
        });
    }

    fn handle_set_username(&mut self, id: Uuid, requested: &serde_json::Value) {
        let requested = username_from_payload(requested);
        if let Some(applied) = self.registry.set_username(id, &requested) {
            debug!(participant_id = %id, username = %applied, "Username set");
            self.broadcast_scoreboard();
        }
    }

    /// Connection entered DISCONNECTED
    fn handle_disconnect(&mut self, id: Uuid) {
        self.dispatcher.unregister(&id);

        if self.registry.remove(&id).is_none() {
            debug!(participant_id = %id, "Disconnect for unknown participant");
            return;
        }
        self.sync_participant_count();

        info!(
            participant_id = %id,
            participant_count = self.registry.len(),
            "Participant disconnected"
        );

        self.dispatcher.all(ServerMsg::PlayerDisconnected(id));
        self.broadcast_scoreboard();
    }

    fn handle_respawn(&mut self, id: Uuid) {
        let position = random_spawn(&mut self.rng);
        if !CombatSystem::respawn(&mut self.registry, id, position) {
            debug!(participant_id = %id, "Stale respawn timer ignored");
            return;
        }

        info!(participant_id = %id, "Participant respawned");
        self.dispatcher
            .all(ServerMsg::PlayerRespawn { id, position });
    }

    /// Enqueue a respawn after the configured delay.
    ///
    /// Disconnect does not cancel the timer; `handle_respawn` re-checks
    /// that the participant still exists.
    fn schedule_respawn(&self, id: Uuid) {
        let timer_tx = self.timer_tx.clone();
        let delay = self.respawn_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = timer_tx.upgrade() {
                let _ = tx.send(ArenaCommand::Respawn { id }).await;
            }
        });
    }

    fn broadcast_scoreboard(&self) {
        self.dispatcher
            .all(ServerMsg::Scoreboard(self.registry.scoreboard()));
    }

    fn sync_participant_count(&self) {
        self.participant_count
            .store(self.registry.len(), Ordering::Relaxed);
    }
}

/// Stringify a `setUsername` payload. Null yields an empty name.
fn username_from_payload(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
