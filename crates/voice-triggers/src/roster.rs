//! Replicated membership roster.
//!
//! The replication layer distributes a zone's affected participants as an
//! ordered id sequence and calls back on change. `SyncedRoster` is that
//! sequence: captured from the authoritative override on the owning side,
//! applied through [`OverrideZone::reconcile`] on receivers.
//!
//! [`OverrideZone::reconcile`]: crate::zone::OverrideZone::reconcile

use common::{OverrideId, ParticipantId};
use serde::{Deserialize, Serialize};
use voice_engine::{EngineError, OverrideRegistry};

/// Ordered, duplicate-free membership sequence for replication.
///
/// Construction normalizes the sequence to ascending order, so equality
/// is membership equality and a replicated payload cannot smuggle in an
/// unsorted or duplicated view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ParticipantId>", into = "Vec<ParticipantId>")]
pub struct SyncedRoster {
    members: Vec<ParticipantId>,
}

impl SyncedRoster {
    /// Empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize an id sequence into a roster.
    #[must_use]
    pub fn from_members(mut members: Vec<ParticipantId>) -> Self {
        members.sort_unstable();
        members.dedup();
        Self { members }
    }

    /// Capture the current affected set of an override for replication.
    ///
    /// # Errors
    ///
    /// `UnknownOverride` if the handle is not live.
    pub fn capture(
        registry: &OverrideRegistry,
        override_id: OverrideId,
    ) -> Result<Self, EngineError> {
        // Already ascending; normalization is a no-op but keeps the
        // invariant in one place.
        Ok(Self::from_members(registry.members(override_id)?))
    }

    /// Replace this roster with an incoming one.
    ///
    /// Returns whether the membership actually differed, so callers can
    /// skip redundant reconcile passes and replication writes.
    pub fn replace(&mut self, incoming: SyncedRoster) -> bool {
        if self.members == incoming.members {
            return false;
        }
        self.members = incoming.members;
        true
    }

    /// The members in ascending order.
    #[must_use]
    pub fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl From<Vec<ParticipantId>> for SyncedRoster {
    fn from(members: Vec<ParticipantId>) -> Self {
        Self::from_members(members)
    }
}

impl From<SyncedRoster> for Vec<ParticipantId> {
    fn from(roster: SyncedRoster) -> Self {
        roster.members
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ve_test_utils::fixtures::{participant, plain_override};
    use ve_test_utils::TestDirectory;

    #[test]
    fn test_from_members_normalizes() {
        let roster = SyncedRoster::from_members(vec![
            participant(5),
            participant(1),
            participant(5),
            participant(3),
        ]);
        assert_eq!(
            roster.members(),
            &[participant(1), participant(3), participant(5)]
        );
    }

    #[test]
    fn test_capture_matches_membership() {
        let dir = TestDirectory::with_connected(&[4, 2]);
        let mut registry = OverrideRegistry::new(Arc::new(dir.clone()));
        let id = registry.register(plain_override("zone", 1));
        registry.add_participant(id, participant(4)).unwrap();
        registry.add_participant(id, participant(2)).unwrap();

        let roster = SyncedRoster::capture(&registry, id).unwrap();
        assert_eq!(roster.members(), &[participant(2), participant(4)]);
    }

    #[test]
    fn test_replace_detects_change() {
        let mut roster = SyncedRoster::from_members(vec![participant(1)]);

        // Same membership in a different arrival order is not a change.
        assert!(!roster.replace(SyncedRoster::from_members(vec![participant(1)])));
        assert!(roster.replace(SyncedRoster::from_members(vec![
            participant(1),
            participant(2)
        ])));
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_serde_wire_format_is_a_plain_sequence() {
        let roster = SyncedRoster::from_members(vec![participant(3), participant(1)]);
        let json = serde_json::to_string(&roster).unwrap();
        assert_eq!(json, "[1,3]");

        // Unsorted wire payloads normalize on receipt.
        let received: SyncedRoster = serde_json::from_str("[9,1,9,4]").unwrap();
        assert_eq!(
            received.members(),
            &[participant(1), participant(4), participant(9)]
        );
    }
}
