//! Voice override: a named, prioritized parameter bundle plus the set of
//! participants it currently applies to.
//!
//! An override is constructed standalone and only starts affecting
//! participants once registered with an [`OverrideRegistry`]. All
//! membership mutation goes through the registry, which owns every
//! registered override; trigger adapters hold [`OverrideId`] handles.
//!
//! [`OverrideRegistry`]: crate::registry::OverrideRegistry
//! [`OverrideId`]: common::OverrideId

use crate::membership::MembershipSet;
use crate::params::{OverrideParameters, ParameterError};
use common::{ParticipantId, PrivacyChannel};
use std::fmt;
use tracing::debug;

/// Reverb routing attached to an override.
///
/// Activated when the local viewer becomes affected and deactivated when
/// they stop being affected. Implementations talk to the platform audio
/// engine; the override guarantees activation and deactivation are only
/// invoked on actual transitions, never repeatedly.
pub trait ReverbRouting: Send {
    /// Route the local listener through this override's reverb.
    fn activate(&mut self);

    /// Restore default (dry) routing.
    fn deactivate(&mut self);
}

/// A named bundle of audio-shaping parameters, a priority, an optional
/// privacy channel, and the affected participant set.
pub struct VoiceOverride {
    name: String,
    priority: i32,
    parameters: OverrideParameters,
    privacy_channel: Option<PrivacyChannel>,
    mute_outsiders: bool,
    affected: MembershipSet,
    reverb: Option<Box<dyn ReverbRouting>>,
    reverb_active: bool,
}

impl VoiceOverride {
    /// Create an override with validated parameters and no members.
    ///
    /// # Errors
    ///
    /// Returns the parameter validation failure; no override is created.
    pub fn new(
        name: impl Into<String>,
        priority: i32,
        parameters: OverrideParameters,
    ) -> Result<Self, ParameterError> {
        parameters.validate()?;
        Ok(Self {
            name: name.into(),
            priority,
            parameters,
            privacy_channel: None,
            mute_outsiders: false,
            affected: MembershipSet::new(),
            reverb: None,
            reverb_active: false,
        })
    }

    /// Attach a privacy channel.
    ///
    /// Participants resolved to overrides sharing the channel form a
    /// mutual-audibility group. With `mute_outsiders`, members of the
    /// group cannot hear participants outside it.
    #[must_use]
    pub fn with_privacy(mut self, channel: PrivacyChannel, mute_outsiders: bool) -> Self {
        self.privacy_channel = Some(channel);
        self.mute_outsiders = mute_outsiders;
        self
    }

    /// Attach reverb routing, activated while the local viewer is affected.
    #[must_use]
    pub fn with_reverb(mut self, reverb: Box<dyn ReverbRouting>) -> Self {
        self.reverb = Some(reverb);
        self
    }

    /// Override name, used for logging and the service API.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current priority. Higher values win; ties go to the
    /// earliest-registered override.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// The validated audio parameters.
    #[must_use]
    pub fn parameters(&self) -> &OverrideParameters {
        &self.parameters
    }

    /// Privacy channel, if grouping is enabled.
    #[must_use]
    pub fn privacy_channel(&self) -> Option<PrivacyChannel> {
        self.privacy_channel
    }

    /// Whether group members are barred from hearing outsiders.
    #[must_use]
    pub fn mute_outsiders(&self) -> bool {
        self.mute_outsiders
    }

    /// Whether the participant is in the affected set.
    ///
    /// False for an empty set; does not consult connection state - the
    /// registry layers validity on top of this raw membership test.
    #[must_use]
    pub fn is_affected(&self, participant: ParticipantId) -> bool {
        !self.affected.is_empty() && self.affected.contains(participant)
    }

    /// Defensive snapshot of the affected participants, ascending.
    ///
    /// May contain stale (disconnected) identifiers; callers revalidate
    /// before use.
    #[must_use]
    pub fn members(&self) -> Vec<ParticipantId> {
        self.affected.snapshot()
    }

    /// Number of affected participants.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.affected.len()
    }

    pub(crate) fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub(crate) fn insert_member(&mut self, participant: ParticipantId) -> bool {
        self.affected.insert(participant)
    }

    pub(crate) fn remove_member(&mut self, participant: ParticipantId) -> bool {
        self.affected.remove(participant)
    }

    pub(crate) fn take_members(&mut self) -> Vec<ParticipantId> {
        self.affected.take_all()
    }

    pub(crate) fn members_iter(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        self.affected.iter()
    }

    /// Activate reverb routing. No-op when already active or when no
    /// routing is attached.
    pub(crate) fn activate_reverb(&mut self) {
        if self.reverb_active {
            return;
        }
        if let Some(reverb) = self.reverb.as_mut() {
            reverb.activate();
            self.reverb_active = true;
            debug!(target: "ve.override", name = %self.name, "Reverb activated");
        }
    }

    /// Deactivate reverb routing. No-op when already inactive.
    pub(crate) fn deactivate_reverb(&mut self) {
        if !self.reverb_active {
            return;
        }
        if let Some(reverb) = self.reverb.as_mut() {
            reverb.deactivate();
            self.reverb_active = false;
            debug!(target: "ve.override", name = %self.name, "Reverb deactivated");
        }
    }

    #[cfg(test)]
    pub(crate) fn reverb_active(&self) -> bool {
        self.reverb_active
    }
}

impl fmt::Debug for VoiceOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceOverride")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("privacy_channel", &self.privacy_channel)
            .field("mute_outsiders", &self.mute_outsiders)
            .field("members", &self.affected.len())
            .field("has_reverb", &self.reverb.is_some())
            .field("reverb_active", &self.reverb_active)
            .finish()
    }
}
