//! Authoritative override registry and priority resolver.
//!
//! One registry instance exists per session process, constructed with the
//! session's [`ParticipantDirectory`] and torn down with the session - no
//! implicit globals. It owns every registered [`VoiceOverride`] and is the
//! only mutation path into their affected sets; trigger adapters and the
//! replication layer hold [`OverrideId`] handles.
//!
//! # Resolution
//!
//! For a participant, the resolved override is the one with the maximum
//! priority among live overrides whose affected set contains them. Equal
//! priorities are won by the earliest-registered override (the lower
//! `OverrideId`); this tie-break is a stable, tested contract, not an
//! artifact of iteration order.
//!
//! # Consistency
//!
//! The registry is logically single-threaded: mutations and queries run
//! synchronously in response to discrete world events, and resolution is
//! recomputed reactively on every locally applied membership change.
//! Replicated peers may briefly diverge; queries are always consistent
//! with the latest locally applied state.

use crate::directory::ParticipantDirectory;
use crate::errors::EngineError;
use crate::events::{MembershipEvent, MembershipObserver, RemovalReason};
use crate::overrides::VoiceOverride;
use common::{OverrideId, ParticipantId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Privacy verdict for a (listener, speaker) pair.
///
/// `Unrestricted` means normal audibility rules (distance, occlusion,
/// directionality) apply; the privacy partition imposes nothing extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audibility {
    /// No privacy restriction between the two participants.
    Unrestricted,
    /// The listener's privacy group bars them from hearing the speaker.
    PrivacyMuted,
}

impl Audibility {
    /// Whether the verdict mutes the speaker for this listener.
    #[must_use]
    pub fn is_muted(self) -> bool {
        matches!(self, Audibility::PrivacyMuted)
    }
}

/// The set of live overrides plus the resolution and privacy logic.
pub struct OverrideRegistry {
    /// Connection-state source of truth, injected at construction.
    directory: Arc<dyn ParticipantDirectory>,
    /// Live overrides keyed by registration sequence. `BTreeMap` iteration
    /// order is registration order, which the tie-break relies on.
    overrides: BTreeMap<OverrideId, VoiceOverride>,
    /// Next registration sequence number.
    next_id: u64,
    /// Observers notified synchronously, in subscription order.
    observers: Vec<Box<dyn MembershipObserver>>,
}

impl OverrideRegistry {
    /// Create an empty registry for one session.
    #[must_use]
    pub fn new(directory: Arc<dyn ParticipantDirectory>) -> Self {
        Self {
            directory,
            overrides: BTreeMap::new(),
            next_id: 0,
            observers: Vec::new(),
        }
    }

    /// Register an override, making it live.
    ///
    /// The returned handle doubles as the registration sequence number:
    /// lower handles registered earlier and win equal-priority conflicts.
    pub fn register(&mut self, ovr: VoiceOverride) -> OverrideId {
        let id = OverrideId(self.next_id);
        self.next_id += 1;
        info!(
            target: "ve.registry",
            override_id = %id,
            name = %ovr.name(),
            priority = ovr.priority(),
            "Override registered"
        );
        self.overrides.insert(id, ovr);
        id
    }

    /// Clear an override and remove it from the live set.
    ///
    /// # Errors
    ///
    /// `UnknownOverride` if the handle is not live.
    pub fn unregister(&mut self, id: OverrideId) -> Result<(), EngineError> {
        self.clear(id)?;
        self.overrides.remove(&id);
        info!(target: "ve.registry", override_id = %id, "Override unregistered");
        Ok(())
    }

    /// Add a participant to an override's affected set.
    ///
    /// Idempotent: re-adding an already-affected participant returns
    /// `Ok(false)` without mutation or notification. On the first
    /// successful addition of the local viewer the override's reverb
    /// routing is activated.
    ///
    /// # Errors
    ///
    /// - `UnknownOverride` if the handle is not live
    /// - `InvalidParticipant` if the participant is not connected
    ///
    /// State is untouched on every error path.
    pub fn add_participant(
        &mut self,
        id: OverrideId,
        participant: ParticipantId,
    ) -> Result<bool, EngineError> {
        if !self.overrides.contains_key(&id) {
            return Err(EngineError::UnknownOverride(id));
        }
        if !self.directory.is_connected(participant) {
            return Err(EngineError::InvalidParticipant(participant));
        }

        let resolved_before = self.resolve(participant);
        let local = self.directory.local_participant();

        let newly_added = match self.overrides.get_mut(&id) {
            Some(ovr) => {
                let newly_added = ovr.insert_member(participant);
                if newly_added && local == Some(participant) {
                    ovr.activate_reverb();
                }
                newly_added
            }
            None => return Err(EngineError::UnknownOverride(id)),
        };

        if !newly_added {
            return Ok(false);
        }

        debug!(
            target: "ve.registry",
            override_id = %id,
            participant = %participant,
            "Participant affected"
        );

        self.notify(MembershipEvent::MemberAdded {
            override_id: id,
            participant,
        });
        self.emit_resolution_change(participant, resolved_before);
        Ok(true)
    }

    /// Remove a participant from an override's affected set.
    ///
    /// Returns whether a removal actually occurred; removing an unaffected
    /// participant is `Ok(false)`. The same pass compacts entries that no
    /// longer correspond to connected participants. Removing the local
    /// viewer deactivates the override's reverb routing. Safe to call with
    /// a stale/disconnected identifier.
    ///
    /// # Errors
    ///
    /// `UnknownOverride` if the handle is not live.
    pub fn remove_participant(
        &mut self,
        id: OverrideId,
        participant: ParticipantId,
    ) -> Result<bool, EngineError> {
        let Some(ovr) = self.overrides.get(&id) else {
            return Err(EngineError::UnknownOverride(id));
        };

        let directory = Arc::clone(&self.directory);
        let stale: Vec<ParticipantId> = ovr
            .members_iter()
            .filter(|m| *m != participant && !directory.is_connected(*m))
            .collect();

        let mut resolved_before = Vec::with_capacity(stale.len() + 1);
        for p in stale.iter().copied().chain(std::iter::once(participant)) {
            resolved_before.push((p, self.resolve(p)));
        }

        let local = directory.local_participant();
        let removed = match self.overrides.get_mut(&id) {
            Some(ovr) => {
                let removed = ovr.remove_member(participant);
                if removed && local == Some(participant) {
                    ovr.deactivate_reverb();
                }
                for s in stale.iter().copied() {
                    ovr.remove_member(s);
                    if local == Some(s) {
                        ovr.deactivate_reverb();
                    }
                }
                removed
            }
            None => return Err(EngineError::UnknownOverride(id)),
        };

        if removed {
            debug!(
                target: "ve.registry",
                override_id = %id,
                participant = %participant,
                purged = stale.len(),
                "Participant removed"
            );
            self.notify(MembershipEvent::MemberRemoved {
                override_id: id,
                participant,
                reason: RemovalReason::Explicit,
            });
        }
        for s in stale.iter().copied() {
            self.notify(MembershipEvent::MemberRemoved {
                override_id: id,
                participant: s,
                reason: RemovalReason::StalePurge,
            });
        }
        for (p, before) in resolved_before {
            self.emit_resolution_change(p, before);
        }

        Ok(removed)
    }

    /// Empty an override's affected set.
    ///
    /// Deactivates reverb, removes every member (observers are notified
    /// per member), and recomputes resolution for each. Best-effort: there
    /// is no atomicity guarantee if an observer panics mid-clear.
    ///
    /// # Errors
    ///
    /// `UnknownOverride` if the handle is not live.
    pub fn clear(&mut self, id: OverrideId) -> Result<(), EngineError> {
        let Some(ovr) = self.overrides.get(&id) else {
            return Err(EngineError::UnknownOverride(id));
        };

        let members = ovr.members();
        let mut resolved_before = Vec::with_capacity(members.len());
        for p in members.iter().copied() {
            resolved_before.push((p, self.resolve(p)));
        }

        match self.overrides.get_mut(&id) {
            Some(ovr) => {
                ovr.deactivate_reverb();
                ovr.take_members();
            }
            None => return Err(EngineError::UnknownOverride(id)),
        }

        info!(
            target: "ve.registry",
            override_id = %id,
            removed = members.len(),
            "Override cleared"
        );

        for p in members.iter().copied() {
            self.notify(MembershipEvent::MemberRemoved {
                override_id: id,
                participant: p,
                reason: RemovalReason::Cleared,
            });
        }
        for (p, before) in resolved_before {
            self.emit_resolution_change(p, before);
        }
        self.notify(MembershipEvent::OverrideCleared { override_id: id });

        Ok(())
    }

    /// Remove a disconnected participant from every live override.
    ///
    /// Called when the session learns of a disconnect; stale entries left
    /// behind are otherwise compacted lazily during removal passes.
    /// Returns how many overrides were affected.
    pub fn purge_participant(&mut self, participant: ParticipantId) -> usize {
        let resolved_before = self.resolve(participant);
        let local = self.directory.local_participant();

        let affected: Vec<OverrideId> = self
            .overrides
            .iter()
            .filter(|(_, ovr)| ovr.is_affected(participant))
            .map(|(id, _)| *id)
            .collect();

        for id in affected.iter() {
            if let Some(ovr) = self.overrides.get_mut(id) {
                ovr.remove_member(participant);
                if local == Some(participant) {
                    ovr.deactivate_reverb();
                }
            }
        }

        if !affected.is_empty() {
            info!(
                target: "ve.registry",
                participant = %participant,
                overrides = affected.len(),
                "Disconnected participant purged"
            );
        }

        for id in affected.iter() {
            self.notify(MembershipEvent::MemberRemoved {
                override_id: *id,
                participant,
                reason: RemovalReason::Disconnected,
            });
        }
        if !affected.is_empty() {
            self.emit_resolution_change(participant, resolved_before);
        }

        affected.len()
    }

    /// Change an override's priority, re-resolving every member.
    ///
    /// # Errors
    ///
    /// `UnknownOverride` if the handle is not live.
    pub fn set_priority(&mut self, id: OverrideId, priority: i32) -> Result<(), EngineError> {
        let Some(ovr) = self.overrides.get(&id) else {
            return Err(EngineError::UnknownOverride(id));
        };

        let members = ovr.members();
        let mut resolved_before = Vec::with_capacity(members.len());
        for p in members.iter().copied() {
            resolved_before.push((p, self.resolve(p)));
        }

        match self.overrides.get_mut(&id) {
            Some(ovr) => ovr.set_priority(priority),
            None => return Err(EngineError::UnknownOverride(id)),
        }

        debug!(
            target: "ve.registry",
            override_id = %id,
            priority,
            "Override priority changed"
        );

        for (p, before) in resolved_before {
            self.emit_resolution_change(p, before);
        }
        Ok(())
    }

    /// The winning override handle for a participant, if any.
    #[must_use]
    pub fn resolved_override_id(&self, participant: ParticipantId) -> Option<OverrideId> {
        self.resolve(participant)
    }

    /// The winning override for a participant, if any.
    #[must_use]
    pub fn resolved_override(&self, participant: ParticipantId) -> Option<&VoiceOverride> {
        self.resolve(participant)
            .and_then(|id| self.overrides.get(&id))
    }

    /// Whether at least one live override affects the participant.
    #[must_use]
    pub fn has_overrides(&self, participant: ParticipantId) -> bool {
        self.overrides
            .values()
            .any(|ovr| ovr.is_affected(participant))
    }

    /// Whether a connected participant is affected by the given override.
    ///
    /// `Ok(false)` for a disconnected participant, matching the original
    /// behavior of treating invalid players as unaffected.
    ///
    /// # Errors
    ///
    /// `UnknownOverride` if the handle is not live.
    pub fn is_affected(
        &self,
        id: OverrideId,
        participant: ParticipantId,
    ) -> Result<bool, EngineError> {
        let ovr = self
            .overrides
            .get(&id)
            .ok_or(EngineError::UnknownOverride(id))?;
        if !self.directory.is_connected(participant) {
            return Ok(false);
        }
        Ok(ovr.is_affected(participant))
    }

    /// Defensive snapshot of an override's affected participants.
    ///
    /// Ascending order, suitable for replication; may contain stale ids.
    ///
    /// # Errors
    ///
    /// `UnknownOverride` if the handle is not live.
    pub fn members(&self, id: OverrideId) -> Result<Vec<ParticipantId>, EngineError> {
        self.overrides
            .get(&id)
            .map(VoiceOverride::members)
            .ok_or(EngineError::UnknownOverride(id))
    }

    /// Read access to a live override.
    #[must_use]
    pub fn get(&self, id: OverrideId) -> Option<&VoiceOverride> {
        self.overrides.get(&id)
    }

    /// Iterate live overrides in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (OverrideId, &VoiceOverride)> {
        self.overrides.iter().map(|(id, ovr)| (*id, ovr))
    }

    /// Number of live overrides.
    #[must_use]
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Privacy verdict for whether `listener` may hear `speaker`.
    ///
    /// Channels come from each side's resolved override:
    ///
    /// 1. both channels set and equal - the pair shares a privacy group
    ///    and hears each other unrestricted;
    /// 2. the listener's resolved override has a channel and
    ///    `mute_outsiders` - the speaker is outside the listener's group
    ///    (different channel or none at all) and is muted;
    /// 3. anything else - normal audibility rules, in particular a
    ///    listener without a privacy channel is never privacy-muted.
    #[must_use]
    pub fn audibility(&self, listener: ParticipantId, speaker: ParticipantId) -> Audibility {
        let listener_override = self.resolved_override(listener);
        let speaker_channel = self
            .resolved_override(speaker)
            .and_then(VoiceOverride::privacy_channel);
        let listener_channel = listener_override.and_then(VoiceOverride::privacy_channel);

        match (listener_channel, speaker_channel) {
            (Some(lp), Some(sp)) if lp == sp => Audibility::Unrestricted,
            (Some(_), _) => {
                if listener_override.is_some_and(VoiceOverride::mute_outsiders) {
                    Audibility::PrivacyMuted
                } else {
                    Audibility::Unrestricted
                }
            }
            _ => Audibility::Unrestricted,
        }
    }

    /// The local viewer's identifier, as reported by the directory.
    #[must_use]
    pub fn local_participant(&self) -> Option<ParticipantId> {
        self.directory.local_participant()
    }

    /// Subscribe an observer to membership and resolution changes.
    ///
    /// Observers are notified synchronously, in subscription order, on
    /// every change. Subscription order is therefore part of the contract.
    pub fn subscribe<O>(&mut self, observer: O)
    where
        O: MembershipObserver + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Max-priority scan in registration order; strictly greater priority
    /// replaces, so the earliest registration holds equal-priority wins.
    fn resolve(&self, participant: ParticipantId) -> Option<OverrideId> {
        let mut best: Option<(OverrideId, i32)> = None;
        for (id, ovr) in &self.overrides {
            if !ovr.is_affected(participant) {
                continue;
            }
            match best {
                Some((_, priority)) if ovr.priority() <= priority => {}
                _ => best = Some((*id, ovr.priority())),
            }
        }
        best.map(|(id, _)| id)
    }

    fn emit_resolution_change(&mut self, participant: ParticipantId, before: Option<OverrideId>) {
        let after = self.resolve(participant);
        if after != before {
            debug!(
                target: "ve.registry",
                participant = %participant,
                resolved = ?after,
                "Resolved override changed"
            );
            self.notify(MembershipEvent::ResolvedChanged {
                participant,
                resolved: after,
            });
        }
    }

    fn notify(&mut self, event: MembershipEvent) {
        for observer in &mut self.observers {
            observer.on_membership_event(&event);
        }
    }
}

impl std::fmt::Debug for OverrideRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideRegistry")
            .field("overrides", &self.overrides.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
