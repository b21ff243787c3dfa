//! In-memory participant directory for tests.

use common::ParticipantId;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use voice_engine::ParticipantDirectory;

#[derive(Debug, Default)]
struct Inner {
    connected: HashSet<ParticipantId>,
    local: Option<ParticipantId>,
}

/// Cloneable fake of the session's participant directory.
///
/// Clones share state, so a handle kept by the test can connect and
/// disconnect participants while the registry under test holds another.
#[derive(Debug, Clone, Default)]
pub struct TestDirectory {
    inner: Arc<RwLock<Inner>>,
}

impl TestDirectory {
    /// Empty directory: nobody connected, no local participant.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory with the given participants already connected.
    #[must_use]
    pub fn with_connected(raw_ids: &[u32]) -> Self {
        let dir = Self::new();
        for raw in raw_ids {
            dir.connect(ParticipantId(*raw));
        }
        dir
    }

    /// Mark a participant as connected.
    pub fn connect(&self, participant: ParticipantId) {
        self.write().connected.insert(participant);
    }

    /// Mark a participant as disconnected.
    pub fn disconnect(&self, participant: ParticipantId) {
        let mut inner = self.write();
        inner.connected.remove(&participant);
        if inner.local == Some(participant) {
            inner.local = None;
        }
    }

    /// Declare the local viewer. Connects the participant as a side effect.
    pub fn set_local(&self, participant: ParticipantId) {
        let mut inner = self.write();
        inner.connected.insert(participant);
        inner.local = Some(participant);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ParticipantDirectory for TestDirectory {
    fn is_connected(&self, participant: ParticipantId) -> bool {
        self.read().connected.contains(&participant)
    }

    fn local_participant(&self) -> Option<ParticipantId> {
        self.read().local
    }
}
