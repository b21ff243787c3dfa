//! End-to-end resolution tests for the override engine.
//!
//! Exercises the full registry surface the way trigger adapters drive it:
//! zone enter/exit, competing priorities, privacy booths, reverb routing,
//! and disconnect churn.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use common::ParticipantId;
use std::sync::Arc;
use ve_test_utils::fixtures::{muffled_parameters, participant, plain_override, privacy_override};
use ve_test_utils::{ReverbProbe, TestDirectory};
use voice_engine::{Audibility, EngineError, OverrideRegistry, VoiceOverride};

fn registry_with(dir: &TestDirectory) -> OverrideRegistry {
    OverrideRegistry::new(Arc::new(dir.clone()))
}

#[test]
fn test_zone_enter_exit_round_trip() {
    let dir = TestDirectory::with_connected(&[1]);
    let mut registry = registry_with(&dir);
    let zone = registry.register(plain_override("zone", 5));
    let p = participant(1);

    // Enter: affected, and the zone wins resolution.
    assert_eq!(registry.add_participant(zone, p), Ok(true));
    assert_eq!(registry.is_affected(zone, p), Ok(true));
    assert_eq!(registry.resolved_override_id(p), Some(zone));
    assert!(registry.has_overrides(p));

    // Exit: back to defaults.
    assert_eq!(registry.remove_participant(zone, p), Ok(true));
    assert_eq!(registry.is_affected(zone, p), Ok(false));
    assert_eq!(registry.resolved_override_id(p), None);
    assert!(!registry.has_overrides(p));
}

#[test]
fn test_competing_overrides_resolve_by_priority() {
    let dir = TestDirectory::with_connected(&[1]);
    let mut registry = registry_with(&dir);
    let p = participant(1);

    let a = registry.register(plain_override("a", 1));
    let b = registry.register(plain_override("b", 5));
    registry.add_participant(a, p).unwrap();
    registry.add_participant(b, p).unwrap();

    assert_eq!(registry.resolved_override_id(p), Some(b));
    registry.remove_participant(b, p).unwrap();
    assert_eq!(registry.resolved_override_id(p), Some(a));
    registry.remove_participant(a, p).unwrap();
    assert_eq!(registry.resolved_override_id(p), None);
}

#[test]
fn test_tie_break_is_stable_across_queries_and_churn() {
    let dir = TestDirectory::with_connected(&[1]);
    let mut registry = registry_with(&dir);
    let p = participant(1);

    let early = registry.register(plain_override("early", 4));
    let late = registry.register(plain_override("late", 4));

    // Membership order must not matter, only registration order.
    registry.add_participant(late, p).unwrap();
    registry.add_participant(early, p).unwrap();

    for _ in 0..10 {
        assert_eq!(registry.resolved_override_id(p), Some(early));
    }

    // Leaving and re-entering the late zone changes nothing.
    registry.remove_participant(late, p).unwrap();
    registry.add_participant(late, p).unwrap();
    assert_eq!(registry.resolved_override_id(p), Some(early));
}

#[test]
fn test_resolved_parameters_come_from_the_winner() {
    let dir = TestDirectory::with_connected(&[1]);
    let mut registry = registry_with(&dir);
    let p = participant(1);

    let hall = registry.register(plain_override("hall", 1));
    let cellar = registry.register(
        VoiceOverride::new("cellar", 9, muffled_parameters()).unwrap(),
    );
    registry.add_participant(hall, p).unwrap();
    registry.add_participant(cellar, p).unwrap();

    let resolved = registry.resolved_override(p).unwrap();
    assert_eq!(resolved.name(), "cellar");
    assert_eq!(resolved.parameters().voice_distance_far, 10.0);
}

#[test]
fn test_privacy_partition_follows_listener_group() {
    let dir = TestDirectory::with_connected(&[1, 2]);
    let mut registry = registry_with(&dir);
    let listener = participant(1);
    let speaker = participant(2);

    let booth = registry.register(privacy_override("booth", 5, 1, true));
    let lobby = registry.register(privacy_override("lobby", 5, 2, false));
    registry.add_participant(booth, listener).unwrap();
    registry.add_participant(lobby, speaker).unwrap();

    // Different channels: the booth listener cannot hear the speaker.
    assert_eq!(
        registry.audibility(listener, speaker),
        Audibility::PrivacyMuted
    );

    // Moving the speaker into the same channel opens the group back up.
    registry.unregister(lobby).unwrap();
    let annex = registry.register(privacy_override("annex", 5, 1, true));
    registry.add_participant(annex, speaker).unwrap();
    assert_eq!(
        registry.audibility(listener, speaker),
        Audibility::Unrestricted
    );
}

#[test]
fn test_privacy_mutes_unaffected_speaker_for_booth_listener() {
    let dir = TestDirectory::with_connected(&[1, 2]);
    let mut registry = registry_with(&dir);
    let listener = participant(1);
    let speaker = participant(2);

    let booth = registry.register(privacy_override("booth", 5, 1, true));
    registry.add_participant(booth, listener).unwrap();

    // Speaker has no override at all.
    assert!(registry.audibility(listener, speaker).is_muted());
    // The unaffected listener still hears the booth member normally.
    assert!(!registry.audibility(speaker, listener).is_muted());
}

#[test]
fn test_reverb_round_trip_with_repeated_adds() {
    let dir = TestDirectory::new();
    dir.set_local(participant(1));

    let probe = ReverbProbe::new();
    let monitor = probe.monitor();

    let mut registry = OverrideRegistry::new(Arc::new(dir.clone()));
    let cave = registry
        .register(plain_override("cave", 1).with_reverb(Box::new(probe)));
    let local = participant(1);

    registry.add_participant(cave, local).unwrap();
    registry.add_participant(cave, local).unwrap();
    assert_eq!(monitor.activations(), 1);
    assert!(monitor.is_active());

    registry.remove_participant(cave, local).unwrap();
    assert_eq!(monitor.deactivations(), 1);
    assert!(!monitor.is_active());

    registry.add_participant(cave, local).unwrap();
    assert_eq!(monitor.activations(), 2);
    assert!(monitor.is_active());
}

#[test]
fn test_clear_deactivates_reverb_and_notifies() {
    let dir = TestDirectory::with_connected(&[2]);
    dir.set_local(participant(1));

    let probe = ReverbProbe::new();
    let monitor = probe.monitor();

    let mut registry = OverrideRegistry::new(Arc::new(dir.clone()));
    let cave = registry
        .register(plain_override("cave", 1).with_reverb(Box::new(probe)));

    registry.add_participant(cave, participant(1)).unwrap();
    registry.add_participant(cave, participant(2)).unwrap();
    assert!(monitor.is_active());

    registry.clear(cave).unwrap();
    assert!(!monitor.is_active());
    assert_eq!(registry.members(cave).unwrap(), Vec::new());
    assert_eq!(registry.resolved_override_id(participant(1)), None);
    assert_eq!(registry.resolved_override_id(participant(2)), None);
}

#[test]
fn test_disconnect_churn_keeps_membership_clean() {
    let dir = TestDirectory::with_connected(&[1, 2, 3]);
    let mut registry = registry_with(&dir);
    let zone = registry.register(plain_override("zone", 2));

    for raw in [1, 2, 3] {
        registry.add_participant(zone, participant(raw)).unwrap();
    }

    // Participant 2 silently disconnects; membership is stale until the
    // next removal pass.
    dir.disconnect(participant(2));
    assert!(registry.members(zone).unwrap().contains(&participant(2)));

    // The removal pass for participant 3 compacts the stale entry too.
    registry.remove_participant(zone, participant(3)).unwrap();
    assert_eq!(registry.members(zone).unwrap(), vec![participant(1)]);
    assert_eq!(registry.is_affected(zone, participant(2)), Ok(false));

    // A reconnect with the same id starts from Unaffected again.
    dir.connect(participant(2));
    assert_eq!(registry.add_participant(zone, participant(2)), Ok(true));
}

#[test]
fn test_mutations_with_stale_ids_never_corrupt_state() {
    let dir = TestDirectory::with_connected(&[1]);
    let mut registry = registry_with(&dir);
    let zone = registry.register(plain_override("zone", 1));
    registry.add_participant(zone, participant(1)).unwrap();

    // Adding a disconnected participant fails cleanly.
    assert_eq!(
        registry.add_participant(zone, participant(9)),
        Err(EngineError::InvalidParticipant(participant(9)))
    );
    // Removing one that was never affected is a clean no-op.
    assert_eq!(registry.remove_participant(zone, participant(9)), Ok(false));

    let snapshot = registry.members(zone).unwrap();
    assert_eq!(snapshot, vec![participant(1)]);
}
