//! Common identifier types for Voicegate components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session-unique identifier for a connected participant.
///
/// Identifiers are assigned by the session host and are not reused while a
/// session is live. A held `ParticipantId` may still be logically stale
/// (the participant disconnected) and must be revalidated against the
/// session's participant directory before use.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a registered override.
///
/// Assigned by the registry from a monotonically increasing sequence, so a
/// lower id always means an earlier registration. Equal-priority conflicts
/// are resolved in favor of the lower id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OverrideId(pub u64);

impl fmt::Display for OverrideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Privacy channel tag.
///
/// Overrides sharing the same channel form a mutual-audibility group.
/// Absence of a channel (`Option::None`) disables grouping for that
/// override.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PrivacyChannel(pub u32);

impl fmt::Display for PrivacyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_id_ordering() {
        assert!(ParticipantId(1) < ParticipantId(2));
        assert_eq!(ParticipantId(7), ParticipantId(7));
    }

    #[test]
    fn test_override_id_registration_order() {
        // Lower id means earlier registration.
        assert!(OverrideId(0) < OverrideId(1));
    }

    #[test]
    fn test_ids_serde_roundtrip() {
        let id = ParticipantId(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: ParticipantId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        let channel = PrivacyChannel(3);
        let json = serde_json::to_string(&channel).unwrap();
        let back: PrivacyChannel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, channel);
    }
}
