//! Fixture builders for engine tests.

use common::{ParticipantId, PrivacyChannel};
use voice_engine::{OverrideParameters, VoiceOverride};

/// Shorthand participant constructor.
#[must_use]
pub fn participant(raw: u32) -> ParticipantId {
    ParticipantId(raw)
}

/// An override with default parameters and no privacy settings.
///
/// # Panics
///
/// Panics if default parameters fail validation, which would be a bug in
/// the engine defaults.
#[must_use]
pub fn plain_override(name: &str, priority: i32) -> VoiceOverride {
    VoiceOverride::new(name, priority, OverrideParameters::default())
        .expect("default parameters must validate")
}

/// An override configured as a privacy booth on the given channel.
#[must_use]
pub fn privacy_override(
    name: &str,
    priority: i32,
    channel: u32,
    mute_outsiders: bool,
) -> VoiceOverride {
    plain_override(name, priority).with_privacy(PrivacyChannel(channel), mute_outsiders)
}

/// Parameters for a muffled room behind a closed door.
#[must_use]
pub fn muffled_parameters() -> OverrideParameters {
    OverrideParameters {
        occlusion_factor: 0.2,
        voice_distance_far: 10.0,
        voice_gain: 10.0,
        enable_voice_lowpass: true,
        ..OverrideParameters::default()
    }
}
