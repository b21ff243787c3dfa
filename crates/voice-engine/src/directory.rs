//! Participant validity lookup.

use common::ParticipantId;

/// Source of truth for which participants are currently connected.
///
/// Injected into the registry at construction. The engine never assumes an
/// identifier it holds is still valid; every mutating operation revalidates
/// through this trait, and removal passes use it to purge stale entries.
pub trait ParticipantDirectory: Send + Sync {
    /// Whether the participant is currently connected to the session.
    fn is_connected(&self, participant: ParticipantId) -> bool;

    /// The local viewer's own identifier, if this process has one.
    ///
    /// Client embeddings return the local player here so reverb routing can
    /// follow the local viewer in and out of overrides. Server-side
    /// deployments return `None`.
    fn local_participant(&self) -> Option<ParticipantId>;
}
