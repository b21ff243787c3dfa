//! Actor model for the Space Controller.
//!
//! A single `SpaceActor` per session owns the override engine and applies
//! every mutation in mailbox order, giving the synchronous engine its
//! single-writer discipline.

pub mod messages;
pub mod space;

pub use messages::{
    AudibilityView, DisconnectSummary, ResolvedView, RespawnSetting, RespawnSummary,
    RosterSyncSummary, SpaceMessage, SpaceState, ZoneCreated, ZoneSpec, ZoneSummary,
};
pub use space::{SpaceActor, SpaceActorHandle};
