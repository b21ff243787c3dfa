//! `SpaceActor` - per-session actor that owns the override engine.
//!
//! The actor provides the single-writer discipline the synchronous engine
//! expects: every trigger event, replication push, and query goes through
//! its mailbox and is applied in arrival order. One `SpaceActor` exists
//! per session process.

use crate::errors::ScError;
use crate::session::SessionRoster;

use super::messages::{
    AudibilityView, DisconnectSummary, ResolvedView, RespawnSummary, RosterSyncSummary,
    SpaceMessage, SpaceState, ZoneCreated, ZoneSpec, ZoneSummary,
};

use common::{ParticipantId, PrivacyChannel};
use metrics::{counter, gauge};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use voice_engine::{MembershipEvent, OverrideRegistry, VoiceOverride};
use voice_triggers::{OverrideZone, SyncedRoster};

/// Channel buffer size for the space mailbox.
const SPACE_CHANNEL_BUFFER: usize = 500;

/// Handle to a `SpaceActor`.
#[derive(Clone)]
pub struct SpaceActorHandle {
    sender: mpsc::Sender<SpaceMessage>,
    cancel_token: CancellationToken,
}

impl SpaceActorHandle {
    /// Mark a participant as connected. Returns whether they were new.
    ///
    /// # Errors
    ///
    /// `Internal` if the actor is gone.
    pub async fn connect_participant(&self, participant: ParticipantId) -> Result<bool, ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::ConnectParticipant {
            participant,
            respond_to: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Disconnect a participant and purge their memberships.
    ///
    /// # Errors
    ///
    /// `Internal` if the actor is gone.
    pub async fn disconnect_participant(
        &self,
        participant: ParticipantId,
    ) -> Result<DisconnectSummary, ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::DisconnectParticipant {
            participant,
            respond_to: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Apply zone respawn policies to a participant.
    ///
    /// # Errors
    ///
    /// Engine failures from zone exits, or `Internal` if the actor is gone.
    pub async fn respawn_participant(
        &self,
        participant: ParticipantId,
    ) -> Result<RespawnSummary, ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::RespawnParticipant {
            participant,
            respond_to: tx,
        })
        .await?;
        Self::receive(rx).await?
    }

    /// Create a zone from a definition.
    ///
    /// # Errors
    ///
    /// `InvalidZone` for bad parameters, `Internal` if the actor is gone.
    pub async fn create_zone(&self, spec: ZoneSpec) -> Result<ZoneCreated, ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::CreateZone {
            spec,
            respond_to: tx,
        })
        .await?;
        Self::receive(rx).await?
    }

    /// Remove a zone, clearing and unregistering its override.
    ///
    /// # Errors
    ///
    /// `ZoneNotFound`, or `Internal` if the actor is gone.
    pub async fn remove_zone(&self, zone_id: Uuid) -> Result<(), ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::RemoveZone {
            zone_id,
            respond_to: tx,
        })
        .await?;
        Self::receive(rx).await?
    }

    /// A participant entered a zone volume.
    ///
    /// # Errors
    ///
    /// `ZoneNotFound`, engine failures, or `Internal` if the actor is gone.
    pub async fn zone_enter(
        &self,
        zone_id: Uuid,
        participant: ParticipantId,
    ) -> Result<bool, ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::ZoneEnter {
            zone_id,
            participant,
            respond_to: tx,
        })
        .await?;
        Self::receive(rx).await?
    }

    /// A participant left a zone volume.
    ///
    /// # Errors
    ///
    /// `ZoneNotFound`, engine failures, or `Internal` if the actor is gone.
    pub async fn zone_exit(
        &self,
        zone_id: Uuid,
        participant: ParticipantId,
    ) -> Result<bool, ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::ZoneExit {
            zone_id,
            participant,
            respond_to: tx,
        })
        .await?;
        Self::receive(rx).await?
    }

    /// Reconcile a zone to a replicated roster.
    ///
    /// # Errors
    ///
    /// `ZoneNotFound`, engine failures, or `Internal` if the actor is gone.
    pub async fn sync_roster(
        &self,
        zone_id: Uuid,
        roster: SyncedRoster,
    ) -> Result<RosterSyncSummary, ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::SyncRoster {
            zone_id,
            roster,
            respond_to: tx,
        })
        .await?;
        Self::receive(rx).await?
    }

    /// The winning override for a participant.
    ///
    /// # Errors
    ///
    /// `Internal` if the actor is gone.
    pub async fn resolved(&self, participant: ParticipantId) -> Result<ResolvedView, ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::GetResolved {
            participant,
            respond_to: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Privacy verdict for a (listener, speaker) pair.
    ///
    /// # Errors
    ///
    /// `Internal` if the actor is gone.
    pub async fn audibility(
        &self,
        listener: ParticipantId,
        speaker: ParticipantId,
    ) -> Result<AudibilityView, ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::GetAudibility {
            listener,
            speaker,
            respond_to: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Current session state.
    ///
    /// # Errors
    ///
    /// `Internal` if the actor is gone.
    pub async fn state(&self) -> Result<SpaceState, ScError> {
        let (tx, rx) = oneshot::channel();
        self.send(SpaceMessage::GetState { respond_to: tx }).await?;
        Self::receive(rx).await
    }

    /// Cancel the actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Whether the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Child token for tasks tied to the actor's lifetime.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    async fn send(&self, message: SpaceMessage) -> Result<(), ScError> {
        self.sender
            .send(message)
            .await
            .map_err(|e| ScError::Internal(format!("channel send failed: {e}")))
    }

    async fn receive<T>(rx: oneshot::Receiver<T>) -> Result<T, ScError> {
        rx.await
            .map_err(|e| ScError::Internal(format!("response receive failed: {e}")))
    }
}

/// Zone bookkeeping: the trigger adapter plus the roster snapshot exposed
/// to the replication layer.
#[derive(Debug)]
struct ZoneEntry {
    zone: OverrideZone,
    roster: SyncedRoster,
}

/// The `SpaceActor` implementation.
pub struct SpaceActor {
    /// Session instance id.
    session_id: String,
    /// Message receiver.
    receiver: mpsc::Receiver<SpaceMessage>,
    /// Cancellation token.
    cancel_token: CancellationToken,
    /// Connection-state roster; also the engine's participant directory.
    roster: SessionRoster,
    /// The override engine.
    registry: OverrideRegistry,
    /// Zones by id. `BTreeMap` keeps iteration deterministic.
    zones: BTreeMap<Uuid, ZoneEntry>,
    /// Session creation timestamp.
    created_at: i64,
}

impl SpaceActor {
    /// Spawn a new space actor. Returns a handle and the task join handle.
    pub fn spawn(
        session_id: String,
        cancel_token: CancellationToken,
    ) -> (SpaceActorHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(SPACE_CHANNEL_BUFFER);

        let roster = SessionRoster::new();
        let mut registry = OverrideRegistry::new(Arc::new(roster.clone()));
        registry.subscribe(|event: &MembershipEvent| {
            if matches!(event, MembershipEvent::ResolvedChanged { .. }) {
                counter!("sc_resolution_changes_total").increment(1);
            }
        });

        let actor = Self {
            session_id,
            receiver,
            cancel_token: cancel_token.clone(),
            roster,
            registry,
            zones: BTreeMap::new(),
            created_at: chrono::Utc::now().timestamp(),
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = SpaceActorHandle {
            sender,
            cancel_token,
        };

        (handle, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "sc.actor.space", fields(session_id = %self.session_id))]
    async fn run(mut self) {
        info!(
            target: "sc.actor.space",
            session_id = %self.session_id,
            "SpaceActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "sc.actor.space",
                        session_id = %self.session_id,
                        zones = self.zones.len(),
                        "SpaceActor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!(
                                target: "sc.actor.space",
                                session_id = %self.session_id,
                                "SpaceActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "sc.actor.space",
            session_id = %self.session_id,
            "SpaceActor stopped"
        );
    }

    /// Handle a single message.
    fn handle_message(&mut self, message: SpaceMessage) {
        match message {
            SpaceMessage::ConnectParticipant {
                participant,
                respond_to,
            } => {
                let result = self.handle_connect(participant);
                let _ = respond_to.send(result);
            }

            SpaceMessage::DisconnectParticipant {
                participant,
                respond_to,
            } => {
                let result = self.handle_disconnect(participant);
                let _ = respond_to.send(result);
            }

            SpaceMessage::RespawnParticipant {
                participant,
                respond_to,
            } => {
                let result = self.handle_respawn(participant);
                let _ = respond_to.send(result);
            }

            SpaceMessage::CreateZone { spec, respond_to } => {
                let result = self.handle_create_zone(spec);
                let _ = respond_to.send(result);
            }

            SpaceMessage::RemoveZone {
                zone_id,
                respond_to,
            } => {
                let result = self.handle_remove_zone(zone_id);
                let _ = respond_to.send(result);
            }

            SpaceMessage::ZoneEnter {
                zone_id,
                participant,
                respond_to,
            } => {
                let result = self.handle_zone_enter(zone_id, participant);
                let _ = respond_to.send(result);
            }

            SpaceMessage::ZoneExit {
                zone_id,
                participant,
                respond_to,
            } => {
                let result = self.handle_zone_exit(zone_id, participant);
                let _ = respond_to.send(result);
            }

            SpaceMessage::SyncRoster {
                zone_id,
                roster,
                respond_to,
            } => {
                let result = self.handle_sync_roster(zone_id, roster);
                let _ = respond_to.send(result);
            }

            SpaceMessage::GetResolved {
                participant,
                respond_to,
            } => {
                let _ = respond_to.send(self.resolved_view(participant));
            }

            SpaceMessage::GetAudibility {
                listener,
                speaker,
                respond_to,
            } => {
                let verdict = self.registry.audibility(listener, speaker);
                let _ = respond_to.send(AudibilityView {
                    listener,
                    speaker,
                    muted: verdict.is_muted(),
                });
            }

            SpaceMessage::GetState { respond_to } => {
                let _ = respond_to.send(self.state_view());
            }
        }
    }

    fn handle_connect(&mut self, participant: ParticipantId) -> bool {
        let newly_connected = self.roster.connect(participant);
        if newly_connected {
            info!(
                target: "sc.actor.space",
                session_id = %self.session_id,
                participant = %participant,
                "Participant connected"
            );
        }
        self.update_participant_gauge();
        newly_connected
    }

    fn handle_disconnect(&mut self, participant: ParticipantId) -> DisconnectSummary {
        let was_connected = self.roster.disconnect(participant);
        let purged_overrides = self.registry.purge_participant(participant);
        if purged_overrides > 0 {
            counter!("sc_participant_purges_total").increment(1);
        }
        self.refresh_all_rosters();
        self.update_participant_gauge();

        info!(
            target: "sc.actor.space",
            session_id = %self.session_id,
            participant = %participant,
            was_connected,
            purged_overrides,
            "Participant disconnected"
        );

        DisconnectSummary {
            was_connected,
            purged_overrides,
        }
    }

    fn handle_respawn(&mut self, participant: ParticipantId) -> Result<RespawnSummary, ScError> {
        let mut exited_zones = 0;
        let mut refreshed = Vec::new();

        for (zone_id, entry) in self.zones.iter_mut() {
            if entry.zone.on_respawn(&mut self.registry, participant)? {
                exited_zones += 1;
                refreshed.push(*zone_id);
            }
        }
        for zone_id in refreshed {
            self.refresh_roster(zone_id);
        }

        debug!(
            target: "sc.actor.space",
            session_id = %self.session_id,
            participant = %participant,
            exited_zones,
            "Respawn handled"
        );
        Ok(RespawnSummary { exited_zones })
    }

    fn handle_create_zone(&mut self, spec: ZoneSpec) -> Result<ZoneCreated, ScError> {
        let mut ovr = VoiceOverride::new(spec.name.clone(), spec.priority, spec.parameters)?;
        if let Some(channel) = spec.privacy_channel {
            ovr = ovr.with_privacy(PrivacyChannel(channel), spec.mute_outsiders);
        }

        let override_id = self.registry.register(ovr);
        let zone =
            OverrideZone::new(spec.name, override_id).with_respawn_policy(spec.respawn_policy.into());

        let zone_id = Uuid::new_v4();
        self.zones.insert(
            zone_id,
            ZoneEntry {
                zone,
                roster: SyncedRoster::new(),
            },
        );
        counter!("sc_zones_created_total").increment(1);

        info!(
            target: "sc.actor.space",
            session_id = %self.session_id,
            zone_id = %zone_id,
            override_id = %override_id,
            "Zone created"
        );
        Ok(ZoneCreated { zone_id })
    }

    fn handle_remove_zone(&mut self, zone_id: Uuid) -> Result<(), ScError> {
        let entry = self
            .zones
            .remove(&zone_id)
            .ok_or(ScError::ZoneNotFound(zone_id))?;
        self.registry.unregister(entry.zone.override_id())?;
        counter!("sc_zones_removed_total").increment(1);

        info!(
            target: "sc.actor.space",
            session_id = %self.session_id,
            zone_id = %zone_id,
            "Zone removed"
        );
        Ok(())
    }

    fn handle_zone_enter(
        &mut self,
        zone_id: Uuid,
        participant: ParticipantId,
    ) -> Result<bool, ScError> {
        let entry = self
            .zones
            .get_mut(&zone_id)
            .ok_or(ScError::ZoneNotFound(zone_id))?;
        let added = entry.zone.enter(&mut self.registry, participant)?;
        if added {
            counter!("sc_zone_enters_total").increment(1);
        }
        self.refresh_roster(zone_id);
        Ok(added)
    }

    fn handle_zone_exit(
        &mut self,
        zone_id: Uuid,
        participant: ParticipantId,
    ) -> Result<bool, ScError> {
        let entry = self
            .zones
            .get_mut(&zone_id)
            .ok_or(ScError::ZoneNotFound(zone_id))?;
        let removed = entry.zone.exit(&mut self.registry, participant)?;
        if removed {
            counter!("sc_zone_exits_total").increment(1);
        }
        self.refresh_roster(zone_id);
        Ok(removed)
    }

    fn handle_sync_roster(
        &mut self,
        zone_id: Uuid,
        incoming: SyncedRoster,
    ) -> Result<RosterSyncSummary, ScError> {
        let entry = self
            .zones
            .get_mut(&zone_id)
            .ok_or(ScError::ZoneNotFound(zone_id))?;

        if !entry.roster.replace(incoming) {
            return Ok(RosterSyncSummary {
                changed: false,
                added: 0,
                removed: 0,
                skipped: 0,
            });
        }

        let target: Vec<ParticipantId> = entry.roster.members().to_vec();
        let outcome = entry.zone.reconcile(&mut self.registry, &target)?;
        // Store the locally applied view; skipped entries re-sync once the
        // participant connects and the roster is pushed again.
        self.refresh_roster(zone_id);

        Ok(RosterSyncSummary {
            changed: true,
            added: outcome.added,
            removed: outcome.removed,
            skipped: outcome.skipped,
        })
    }

    fn resolved_view(&self, participant: ParticipantId) -> ResolvedView {
        let resolved = self.registry.resolved_override_id(participant);
        match resolved {
            Some(override_id) => {
                let zone = self
                    .zones
                    .iter()
                    .find(|(_, entry)| entry.zone.override_id() == override_id);
                let ovr = self.registry.get(override_id);
                ResolvedView {
                    participant,
                    zone_id: zone.map(|(id, _)| *id),
                    zone_name: zone.map(|(_, entry)| entry.zone.name().to_string()),
                    priority: ovr.map(VoiceOverride::priority),
                    parameters: ovr.map(|o| *o.parameters()),
                }
            }
            None => ResolvedView {
                participant,
                zone_id: None,
                zone_name: None,
                priority: None,
                parameters: None,
            },
        }
    }

    fn state_view(&self) -> SpaceState {
        let zones = self
            .zones
            .iter()
            .filter_map(|(zone_id, entry)| {
                let override_id = entry.zone.override_id();
                let ovr = self.registry.get(override_id)?;
                Some(ZoneSummary {
                    zone_id: *zone_id,
                    name: entry.zone.name().to_string(),
                    priority: ovr.priority(),
                    privacy_channel: ovr.privacy_channel().map(|c| c.0),
                    mute_outsiders: ovr.mute_outsiders(),
                    members: ovr.members(),
                })
            })
            .collect();

        SpaceState {
            session_id: self.session_id.clone(),
            participant_count: self.roster.connected_count(),
            zones,
            created_at: self.created_at,
        }
    }

    /// Recapture a zone's replication roster after a membership change.
    fn refresh_roster(&mut self, zone_id: Uuid) {
        let Some(entry) = self.zones.get_mut(&zone_id) else {
            return;
        };
        match SyncedRoster::capture(&self.registry, entry.zone.override_id()) {
            Ok(roster) => {
                entry.roster = roster;
            }
            Err(e) => {
                warn!(
                    target: "sc.actor.space",
                    zone_id = %zone_id,
                    error = %e,
                    "Failed to refresh zone roster"
                );
            }
        }
    }

    fn refresh_all_rosters(&mut self) {
        let zone_ids: Vec<Uuid> = self.zones.keys().copied().collect();
        for zone_id in zone_ids {
            self.refresh_roster(zone_id);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn update_participant_gauge(&self) {
        gauge!("sc_connected_participants").set(self.roster.connected_count() as f64);
    }
}
