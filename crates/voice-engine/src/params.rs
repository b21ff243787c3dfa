//! Audio-shaping parameter bundle.
//!
//! Plain numeric/boolean configuration, validated at assignment time.
//! None of these fields participate in priority resolution; they are what
//! the resolved override hands to the audio-parameter consumer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for a parameter field.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum ParameterError {
    /// Field is outside its documented range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Field is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

/// The audio parameters applied to participants affected by an override.
///
/// Defaults match a neutral indoor voice configuration: mild occlusion,
/// moderate directionality, 25 m voice falloff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideParameters {
    /// Occlusion by world geometry. 1.0 disables occlusion, 0.0 reduces
    /// the audible range to the current distance.
    pub occlusion_factor: f32,
    /// Occlusion by another participant's avatar standing in between.
    pub player_occlusion_factor: f32,
    /// How much facing away from a speaker quiets them, 0.0 to 1.0.
    pub listener_directionality: f32,
    /// How much a speaker facing away from the listener is quieted.
    pub player_directionality: f32,
    /// Muffle voices near the edge of their audible range.
    pub enable_voice_lowpass: bool,
    /// Distance below which voice volume stays at maximum, in meters.
    pub voice_distance_near: f32,
    /// Distance beyond which a voice cannot be heard, in meters.
    pub voice_distance_far: f32,
    /// Additional voice gain in decibel.
    pub voice_gain: f32,
    /// Range in which the voice is not spatialized, in meters.
    pub voice_volumetric_radius: f32,
    /// Force avatar audio sources to be spatialized.
    pub force_avatar_spatial_audio: bool,
    /// Honor custom audio curves on avatar audio sources.
    pub allow_avatar_custom_curves: bool,
    /// Distance at which avatar audio starts to fall off, in meters.
    pub avatar_near_radius: f32,
    /// Maximum distance at which avatar audio can be heard, in meters.
    pub avatar_far_radius: f32,
    /// Avatar audio gain in decibel.
    pub avatar_gain: f32,
    /// Range in which avatar audio is not spatialized, in meters.
    pub avatar_volumetric_radius: f32,
}

impl Default for OverrideParameters {
    fn default() -> Self {
        Self {
            occlusion_factor: 0.7,
            player_occlusion_factor: 0.85,
            listener_directionality: 0.5,
            player_directionality: 0.3,
            enable_voice_lowpass: true,
            voice_distance_near: 0.0,
            voice_distance_far: 25.0,
            voice_gain: 15.0,
            voice_volumetric_radius: 0.0,
            force_avatar_spatial_audio: false,
            allow_avatar_custom_curves: true,
            avatar_near_radius: 40.0,
            avatar_far_radius: 40.0,
            avatar_gain: 10.0,
            avatar_volumetric_radius: 0.0,
        }
    }
}

/// Documented per-field ranges.
const RANGES: &[(&str, fn(&OverrideParameters) -> f32, f32, f32)] = &[
    ("occlusion_factor", |p| p.occlusion_factor, 0.0, 1.0),
    (
        "player_occlusion_factor",
        |p| p.player_occlusion_factor,
        0.0,
        1.0,
    ),
    (
        "listener_directionality",
        |p| p.listener_directionality,
        0.0,
        1.0,
    ),
    (
        "player_directionality",
        |p| p.player_directionality,
        0.0,
        1.0,
    ),
    (
        "voice_distance_near",
        |p| p.voice_distance_near,
        0.0,
        1_000_000.0,
    ),
    (
        "voice_distance_far",
        |p| p.voice_distance_far,
        0.0,
        1_000_000.0,
    ),
    ("voice_gain", |p| p.voice_gain, 0.0, 24.0),
    (
        "voice_volumetric_radius",
        |p| p.voice_volumetric_radius,
        0.0,
        1_000.0,
    ),
    ("avatar_near_radius", |p| p.avatar_near_radius, 0.0, f32::MAX),
    ("avatar_far_radius", |p| p.avatar_far_radius, 0.0, f32::MAX),
    ("avatar_gain", |p| p.avatar_gain, 0.0, 10.0),
    (
        "avatar_volumetric_radius",
        |p| p.avatar_volumetric_radius,
        0.0,
        f32::MAX,
    ),
];

impl OverrideParameters {
    /// Validate every field against its documented range.
    ///
    /// # Errors
    ///
    /// Returns the first offending field, NaN/infinite values before range
    /// violations.
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (field, get, min, max) in RANGES.iter().copied() {
            let value = get(self);
            if !value.is_finite() {
                return Err(ParameterError::NotFinite { field });
            }
            if value < min || value > max {
                return Err(ParameterError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(OverrideParameters::default().validate(), Ok(()));
    }

    #[test]
    fn test_out_of_range_field_is_named() {
        let params = OverrideParameters {
            voice_gain: 30.0,
            ..OverrideParameters::default()
        };

        assert_eq!(
            params.validate(),
            Err(ParameterError::OutOfRange {
                field: "voice_gain",
                value: 30.0,
                min: 0.0,
                max: 24.0,
            })
        );
    }

    #[test]
    fn test_negative_factor_rejected() {
        let params = OverrideParameters {
            occlusion_factor: -0.1,
            ..OverrideParameters::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ParameterError::OutOfRange {
                field: "occlusion_factor",
                ..
            })
        ));
    }

    #[test]
    fn test_nan_rejected_before_range() {
        let params = OverrideParameters {
            avatar_gain: f32::NAN,
            ..OverrideParameters::default()
        };
        assert_eq!(
            params.validate(),
            Err(ParameterError::NotFinite {
                field: "avatar_gain"
            })
        );
    }

    #[test]
    fn test_serde_partial_payload_fills_defaults() {
        let params: OverrideParameters =
            serde_json::from_str(r#"{"voice_distance_far": 5.0}"#).unwrap();
        assert_eq!(params.voice_distance_far, 5.0);
        assert_eq!(params.voice_gain, 15.0);
        assert!(params.enable_voice_lowpass);
    }
}
