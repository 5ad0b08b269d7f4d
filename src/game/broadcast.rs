//! Broadcast dispatcher - fans server events out to connected clients

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

/// Per-connection outbound queue depth
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Sending half of a connection's outbound queue
pub type Outbound = mpsc::Sender<Arc<ServerMsg>>;

/// Routes messages to "sender only", "all" or "all except sender".
///
/// Delivery is best effort: a full or closed queue drops the message for that
/// recipient and never blocks the arena.
#[derive(Default)]
pub struct BroadcastDispatcher {
    clients: HashMap<Uuid, Outbound>,
}

impl BroadcastDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: Uuid, outbound: Outbound) {
        self.clients.insert(id, outbound);
    }

    /// Drop a connection's queue; its writer sees the channel close
    pub fn unregister(&mut self, id: &Uuid) {
        self.clients.remove(id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Send to one connection
    pub fn to(&self, id: Uuid, msg: ServerMsg) {
        match self.clients.get(&id) {
            Some(outbound) => deliver(id, outbound, &Arc::new(msg)),
            None => debug!(participant_id = %id, event = msg.event_name(), "No outbound queue, dropping"),
        }
    }

    /// Send to every connection
    pub fn all(&self, msg: ServerMsg) {
        let msg = Arc::new(msg);
        for (id, outbound) in &self.clients {
            deliver(*id, outbound, &msg);
        }
    }

    /// Send to every connection except `sender`
    pub fn all_except(&self, sender: Uuid, msg: ServerMsg) {
        let msg = Arc::new(msg);
        for (id, outbound) in self.clients.iter().filter(|(id, _)| **id != sender) {
            deliver(*id, outbound, &msg);
        }
    }
}

fn deliver(id: Uuid, outbound: &Outbound, msg: &Arc<ServerMsg>) {
    match outbound.try_send(Arc::clone(msg)) {
        Ok(()) => {}
        Err(TrySendError::Full(msg)) => {
            warn!(
                participant_id = %id,
                event = msg.event_name(),
                "Outbound queue full, dropping message"
            );
        }
        Err(TrySendError::Closed(msg)) => {
            debug!(
                participant_id = %id,
                event = msg.event_name(),
                "Outbound queue closed, dropping message"
            );
        }
    }
}
