//! Trigger adapters for the Voicegate override engine.
//!
//! These are the components that sit between world events and the
//! [`OverrideRegistry`](voice_engine::OverrideRegistry):
//!
//! - [`OverrideZone`] - a volume that claims participants while they are
//!   inside, with respawn handling and roster reconciliation for
//!   replicated sessions
//! - [`OverrideDoor`] - a doorway trigger that turns enter/exit crossings
//!   into zone membership changes based on movement direction
//! - [`SyncedRoster`] - the ordered membership sequence exchanged with
//!   the replication layer
//!
//! Adapters surface every engine failure to the caller; none of them
//! panic or swallow errors.

pub mod door;
pub mod roster;
pub mod zone;

pub use door::{DoorCrossing, OverrideDoor};
pub use roster::SyncedRoster;
pub use zone::{OverrideZone, ReconcileOutcome, RespawnPolicy};
