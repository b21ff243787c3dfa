//! Override zone adapter.
//!
//! A zone claims participants for one registered override while they are
//! inside its volume. The zone does not own membership state - the
//! override's affected set is authoritative - it only translates world
//! events into registry calls and tracks whether the local viewer is
//! currently inside.

use common::{OverrideId, ParticipantId};
use std::collections::BTreeSet;
use tracing::{debug, warn};
use voice_engine::{EngineError, OverrideRegistry};

/// What a respawn does to zone membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RespawnPolicy {
    /// Respawning inside the world keeps the participant in the zone.
    #[default]
    StayInZone,
    /// Respawning removes the participant from the zone (the spawn point
    /// is outside it).
    ExitZone,
}

/// Result of reconciling local membership against a replicated roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    /// Participants added to match the roster.
    pub added: usize,
    /// Participants removed to match the roster.
    pub removed: usize,
    /// Roster entries skipped because they are not locally connected yet.
    pub skipped: usize,
}

/// A trigger volume bound to one registered override.
#[derive(Debug)]
pub struct OverrideZone {
    name: String,
    override_id: OverrideId,
    respawn_policy: RespawnPolicy,
    local_inside: bool,
}

impl OverrideZone {
    /// Bind a zone to a registered override.
    #[must_use]
    pub fn new(name: impl Into<String>, override_id: OverrideId) -> Self {
        Self {
            name: name.into(),
            override_id,
            respawn_policy: RespawnPolicy::StayInZone,
            local_inside: false,
        }
    }

    /// Configure respawn handling.
    #[must_use]
    pub fn with_respawn_policy(mut self, policy: RespawnPolicy) -> Self {
        self.respawn_policy = policy;
        self
    }

    /// Zone name, used for logging and the service API.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle of the override this zone drives.
    #[must_use]
    pub fn override_id(&self) -> OverrideId {
        self.override_id
    }

    /// Whether the local viewer is currently inside the zone.
    #[must_use]
    pub fn is_local_inside(&self) -> bool {
        self.local_inside
    }

    /// A participant entered the zone volume.
    ///
    /// Idempotent like the underlying engine operation: re-entering while
    /// already inside is `Ok(false)`.
    ///
    /// # Errors
    ///
    /// Propagates engine failures; the zone state is untouched on error.
    pub fn enter(
        &mut self,
        registry: &mut OverrideRegistry,
        participant: ParticipantId,
    ) -> Result<bool, EngineError> {
        let added = registry.add_participant(self.override_id, participant)?;
        if registry.local_participant() == Some(participant) {
            self.local_inside = true;
        }
        debug!(
            target: "vt.zone",
            zone = %self.name,
            participant = %participant,
            added,
            "Zone enter"
        );
        Ok(added)
    }

    /// A participant left the zone volume.
    ///
    /// # Errors
    ///
    /// Propagates engine failures; the zone state is untouched on error.
    pub fn exit(
        &mut self,
        registry: &mut OverrideRegistry,
        participant: ParticipantId,
    ) -> Result<bool, EngineError> {
        let removed = registry.remove_participant(self.override_id, participant)?;
        if registry.local_participant() == Some(participant) {
            self.local_inside = false;
        }
        debug!(
            target: "vt.zone",
            zone = %self.name,
            participant = %participant,
            removed,
            "Zone exit"
        );
        Ok(removed)
    }

    /// Whether a connected participant is currently claimed by the zone.
    #[must_use]
    pub fn contains(&self, registry: &OverrideRegistry, participant: ParticipantId) -> bool {
        registry
            .is_affected(self.override_id, participant)
            .unwrap_or(false)
    }

    /// A participant respawned.
    ///
    /// Under [`RespawnPolicy::ExitZone`] the participant leaves the zone;
    /// otherwise nothing happens. Returns whether a removal occurred.
    ///
    /// # Errors
    ///
    /// Propagates engine failures from the removal.
    pub fn on_respawn(
        &mut self,
        registry: &mut OverrideRegistry,
        participant: ParticipantId,
    ) -> Result<bool, EngineError> {
        match self.respawn_policy {
            RespawnPolicy::StayInZone => Ok(false),
            RespawnPolicy::ExitZone => self.exit(registry, participant),
        }
    }

    /// Reconcile local membership to a replicated roster.
    ///
    /// Adds roster members missing locally and removes local members
    /// absent from the roster. Roster entries that are not locally
    /// connected yet are skipped and will converge on a later refresh;
    /// everything else diverging is an engine failure and aborts.
    ///
    /// # Errors
    ///
    /// `UnknownOverride` if the zone's override is no longer live.
    pub fn reconcile(
        &mut self,
        registry: &mut OverrideRegistry,
        roster: &[ParticipantId],
    ) -> Result<ReconcileOutcome, EngineError> {
        let current: BTreeSet<ParticipantId> =
            registry.members(self.override_id)?.into_iter().collect();
        let target: BTreeSet<ParticipantId> = roster.iter().copied().collect();

        let mut outcome = ReconcileOutcome::default();

        for participant in target.difference(&current).copied() {
            match self.enter(registry, participant) {
                Ok(true) => outcome.added += 1,
                Ok(false) => {}
                Err(EngineError::InvalidParticipant(p)) => {
                    // The remote peer learned of this participant before
                    // we did; a later refresh converges.
                    warn!(
                        target: "vt.zone",
                        zone = %self.name,
                        participant = %p,
                        "Roster entry not locally connected, skipping"
                    );
                    outcome.skipped += 1;
                }
                Err(other) => return Err(other),
            }
        }

        for participant in current.difference(&target).copied() {
            if self.exit(registry, participant)? {
                outcome.removed += 1;
            }
        }

        debug!(
            target: "vt.zone",
            zone = %self.name,
            added = outcome.added,
            removed = outcome.removed,
            skipped = outcome.skipped,
            "Roster reconciled"
        );
        Ok(outcome)
    }
}
