//! Engine error types.
//!
//! Every fallible engine operation reports failure through these types and
//! leaves the affected membership state untouched. Stale memberships are
//! not an error: they are compacted during removal passes.

use common::{OverrideId, ParticipantId};
use thiserror::Error;

/// Errors returned by registry and override operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// The referenced participant is not currently connected.
    #[error("participant {0} is not connected")]
    InvalidParticipant(ParticipantId),

    /// The override handle does not refer to a live, registered override.
    ///
    /// This is the failure mode for an override whose resolver collaborator
    /// is unreachable: an unregistered override cannot affect anyone.
    #[error("override {0} is not registered")]
    UnknownOverride(OverrideId),
}
