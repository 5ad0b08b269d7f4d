//! Authoritative arena: participants, combat and fan-out

pub mod arena;
pub mod broadcast;
pub mod combat;
pub mod registry;
pub mod spawn;

pub use arena::{Arena, ArenaCommand, ArenaHandle};
pub use registry::{Participant, SessionRegistry};
