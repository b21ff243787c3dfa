//! Session participant roster.
//!
//! The production [`ParticipantDirectory`]: tracks which participants the
//! session currently considers connected. The controller is a server-side
//! authority with no viewer of its own, so there is never a local
//! participant and reverb routing stays inert here.

use common::ParticipantId;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use voice_engine::ParticipantDirectory;

/// Cloneable, shared connection-state roster for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionRoster {
    inner: Arc<RwLock<HashSet<ParticipantId>>>,
}

impl SessionRoster {
    /// Empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a participant as connected. Returns whether they were new.
    pub fn connect(&self, participant: ParticipantId) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(participant)
    }

    /// Mark a participant as disconnected. Returns whether they were
    /// connected.
    pub fn disconnect(&self, participant: ParticipantId) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&participant)
    }

    /// Number of connected participants.
    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ParticipantDirectory for SessionRoster {
    fn is_connected(&self, participant: ParticipantId) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&participant)
    }

    fn local_participant(&self) -> Option<ParticipantId> {
        None
    }
}
