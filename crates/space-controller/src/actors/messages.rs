//! Message types for the space actor mailbox.
//!
//! All communication with the actor uses strongly-typed message passing
//! via `tokio::sync::mpsc`; request-reply uses `tokio::sync::oneshot`.

use crate::errors::ScError;
use common::ParticipantId;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;
use voice_engine::OverrideParameters;
use voice_triggers::{RespawnPolicy, SyncedRoster};

/// Messages sent to the `SpaceActor`.
#[derive(Debug)]
pub enum SpaceMessage {
    /// A participant connected to the session.
    ConnectParticipant {
        participant: ParticipantId,
        /// True if the participant was not connected before.
        respond_to: oneshot::Sender<bool>,
    },

    /// A participant disconnected; their memberships are purged.
    DisconnectParticipant {
        participant: ParticipantId,
        respond_to: oneshot::Sender<DisconnectSummary>,
    },

    /// A participant respawned; zones apply their respawn policy.
    RespawnParticipant {
        participant: ParticipantId,
        respond_to: oneshot::Sender<Result<RespawnSummary, ScError>>,
    },

    /// Create a zone (registers its override).
    CreateZone {
        spec: ZoneSpec,
        respond_to: oneshot::Sender<Result<ZoneCreated, ScError>>,
    },

    /// Remove a zone (clears and unregisters its override).
    RemoveZone {
        zone_id: Uuid,
        respond_to: oneshot::Sender<Result<(), ScError>>,
    },

    /// A participant entered a zone volume.
    ZoneEnter {
        zone_id: Uuid,
        participant: ParticipantId,
        respond_to: oneshot::Sender<Result<bool, ScError>>,
    },

    /// A participant left a zone volume.
    ZoneExit {
        zone_id: Uuid,
        participant: ParticipantId,
        respond_to: oneshot::Sender<Result<bool, ScError>>,
    },

    /// The replication layer pushed a zone roster; reconcile to match.
    SyncRoster {
        zone_id: Uuid,
        roster: SyncedRoster,
        respond_to: oneshot::Sender<Result<RosterSyncSummary, ScError>>,
    },

    /// Resolve the winning override for a participant.
    GetResolved {
        participant: ParticipantId,
        respond_to: oneshot::Sender<ResolvedView>,
    },

    /// Privacy verdict for a (listener, speaker) pair.
    GetAudibility {
        listener: ParticipantId,
        speaker: ParticipantId,
        respond_to: oneshot::Sender<AudibilityView>,
    },

    /// Current session state (for debugging/health).
    GetState {
        respond_to: oneshot::Sender<SpaceState>,
    },
}

// ----------------------------------------------------------------------------
// Supporting Types
// ----------------------------------------------------------------------------

/// Zone definition accepted by the API and the preload file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    /// Human-readable zone name.
    pub name: String,
    /// Resolution priority; higher wins, ties go to the earlier zone.
    pub priority: i32,
    /// Optional privacy channel id.
    #[serde(default)]
    pub privacy_channel: Option<u32>,
    /// Whether privacy-group members stop hearing outsiders.
    #[serde(default)]
    pub mute_outsiders: bool,
    /// What a respawn does to membership.
    #[serde(default)]
    pub respawn_policy: RespawnSetting,
    /// Audio parameters; unspecified fields use engine defaults.
    #[serde(default)]
    pub parameters: OverrideParameters,
}

/// Serializable mirror of [`RespawnPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespawnSetting {
    /// Respawning keeps the participant in the zone.
    #[default]
    Stay,
    /// Respawning removes the participant from the zone.
    Exit,
}

impl From<RespawnSetting> for RespawnPolicy {
    fn from(setting: RespawnSetting) -> Self {
        match setting {
            RespawnSetting::Stay => RespawnPolicy::StayInZone,
            RespawnSetting::Exit => RespawnPolicy::ExitZone,
        }
    }
}

/// Result of creating a zone.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneCreated {
    /// Assigned zone id.
    pub zone_id: Uuid,
}

/// Result of a disconnect purge.
#[derive(Debug, Clone, Serialize)]
pub struct DisconnectSummary {
    /// Whether the participant was connected.
    pub was_connected: bool,
    /// How many overrides the participant was purged from.
    pub purged_overrides: usize,
}

/// Result of applying respawn policies.
#[derive(Debug, Clone, Serialize)]
pub struct RespawnSummary {
    /// How many zones the participant left.
    pub exited_zones: usize,
}

/// Result of a roster reconcile pass.
#[derive(Debug, Clone, Serialize)]
pub struct RosterSyncSummary {
    /// Whether the pushed roster differed from the local view.
    pub changed: bool,
    /// Participants added to match.
    pub added: usize,
    /// Participants removed to match.
    pub removed: usize,
    /// Roster entries not locally connected yet.
    pub skipped: usize,
}

/// The winning override for a participant, or defaults.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedView {
    /// The participant queried.
    pub participant: ParticipantId,
    /// Winning zone, `None` when default parameters apply.
    pub zone_id: Option<Uuid>,
    /// Winning zone name.
    pub zone_name: Option<String>,
    /// Winning priority.
    pub priority: Option<i32>,
    /// Parameters to apply, `None` for defaults.
    pub parameters: Option<OverrideParameters>,
}

/// Privacy verdict for a (listener, speaker) pair.
#[derive(Debug, Clone, Serialize)]
pub struct AudibilityView {
    pub listener: ParticipantId,
    pub speaker: ParticipantId,
    /// True when the listener's privacy group mutes the speaker.
    pub muted: bool,
}

/// Summary of one zone for state inspection.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneSummary {
    pub zone_id: Uuid,
    pub name: String,
    pub priority: i32,
    pub privacy_channel: Option<u32>,
    pub mute_outsiders: bool,
    /// Affected participants, ascending.
    pub members: Vec<ParticipantId>,
}

/// Current state of the session (for debugging/health).
#[derive(Debug, Clone, Serialize)]
pub struct SpaceState {
    /// Session instance id.
    pub session_id: String,
    /// Connected participant count.
    pub participant_count: usize,
    /// Live zones in registration order.
    pub zones: Vec<ZoneSummary>,
    /// Session creation timestamp (unix seconds).
    pub created_at: i64,
}
