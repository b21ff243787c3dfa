//! Session-level flows through the space actor.
//!
//! Drives the actor the way trigger adapters and the replication layer
//! would: overlapping zones, privacy booths, replicated roster pushes,
//! respawns, and disconnect churn.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use common::ParticipantId;
use space_controller::actors::{RespawnSetting, SpaceActor, SpaceActorHandle, ZoneSpec};
use tokio_util::sync::CancellationToken;
use voice_engine::OverrideParameters;
use voice_triggers::SyncedRoster;

fn spec(name: &str, priority: i32) -> ZoneSpec {
    ZoneSpec {
        name: name.to_string(),
        priority,
        privacy_channel: None,
        mute_outsiders: false,
        respawn_policy: RespawnSetting::Stay,
        parameters: OverrideParameters::default(),
    }
}

async fn session_with_participants(raw_ids: &[u32]) -> SpaceActorHandle {
    let (handle, _task) = SpaceActor::spawn("space-test".to_string(), CancellationToken::new());
    for raw in raw_ids {
        handle
            .connect_participant(ParticipantId(*raw))
            .await
            .unwrap();
    }
    handle
}

#[tokio::test]
async fn test_overlapping_zones_resolve_deterministically() {
    let handle = session_with_participants(&[1]).await;
    let p = ParticipantId(1);

    let hall = handle.create_zone(spec("hall", 1)).await.unwrap();
    let booth = handle.create_zone(spec("booth", 5)).await.unwrap();
    // Same priority as the hall, registered later: must never win a tie.
    let annex = handle.create_zone(spec("annex", 1)).await.unwrap();

    handle.zone_enter(hall.zone_id, p).await.unwrap();
    handle.zone_enter(annex.zone_id, p).await.unwrap();
    let resolved = handle.resolved(p).await.unwrap();
    assert_eq!(resolved.zone_id, Some(hall.zone_id));

    handle.zone_enter(booth.zone_id, p).await.unwrap();
    let resolved = handle.resolved(p).await.unwrap();
    assert_eq!(resolved.zone_id, Some(booth.zone_id));

    handle.zone_exit(booth.zone_id, p).await.unwrap();
    let resolved = handle.resolved(p).await.unwrap();
    assert_eq!(resolved.zone_id, Some(hall.zone_id));

    handle.cancel();
}

#[tokio::test]
async fn test_privacy_booth_flow() {
    let handle = session_with_participants(&[1, 2]).await;
    let listener = ParticipantId(1);
    let speaker = ParticipantId(2);

    let mut booth_spec = spec("booth", 5);
    booth_spec.privacy_channel = Some(1);
    booth_spec.mute_outsiders = true;
    let booth = handle.create_zone(booth_spec).await.unwrap();

    // Nobody in the booth yet: unrestricted both ways.
    assert!(!handle.audibility(listener, speaker).await.unwrap().muted);

    handle.zone_enter(booth.zone_id, listener).await.unwrap();
    assert!(handle.audibility(listener, speaker).await.unwrap().muted);
    assert!(!handle.audibility(speaker, listener).await.unwrap().muted);

    // The speaker joins the same booth: group hears itself.
    handle.zone_enter(booth.zone_id, speaker).await.unwrap();
    assert!(!handle.audibility(listener, speaker).await.unwrap().muted);

    handle.cancel();
}

#[tokio::test]
async fn test_roster_push_converges_membership() {
    let handle = session_with_participants(&[1, 2, 3]).await;
    let zone = handle.create_zone(spec("stage", 4)).await.unwrap();

    handle.zone_enter(zone.zone_id, ParticipantId(1)).await.unwrap();

    // Remote authority says 2 and 3 are in the zone, 1 is not.
    let summary = handle
        .sync_roster(
            zone.zone_id,
            SyncedRoster::from_members(vec![ParticipantId(2), ParticipantId(3)]),
        )
        .await
        .unwrap();
    assert!(summary.changed);
    assert_eq!(summary.added, 2);
    assert_eq!(summary.removed, 1);
    assert_eq!(summary.skipped, 0);

    let state = handle.state().await.unwrap();
    let stage = state
        .zones
        .iter()
        .find(|z| z.zone_id == zone.zone_id)
        .unwrap();
    assert_eq!(stage.members, vec![ParticipantId(2), ParticipantId(3)]);

    // Pushing the identical roster again is a no-op.
    let summary = handle
        .sync_roster(
            zone.zone_id,
            SyncedRoster::from_members(vec![ParticipantId(2), ParticipantId(3)]),
        )
        .await
        .unwrap();
    assert!(!summary.changed);

    handle.cancel();
}

#[tokio::test]
async fn test_roster_push_skips_unknown_participants() {
    let handle = session_with_participants(&[1]).await;
    let zone = handle.create_zone(spec("stage", 4)).await.unwrap();

    // Participant 9 is known to the remote peer but not to us yet.
    let summary = handle
        .sync_roster(
            zone.zone_id,
            SyncedRoster::from_members(vec![ParticipantId(1), ParticipantId(9)]),
        )
        .await
        .unwrap();
    assert_eq!(summary.added, 1);
    assert_eq!(summary.skipped, 1);

    // Once 9 connects, the next push converges.
    handle.connect_participant(ParticipantId(9)).await.unwrap();
    let summary = handle
        .sync_roster(
            zone.zone_id,
            SyncedRoster::from_members(vec![ParticipantId(1), ParticipantId(9)]),
        )
        .await
        .unwrap();
    assert!(summary.changed);
    assert_eq!(summary.added, 1);
    assert_eq!(summary.skipped, 0);

    handle.cancel();
}

#[tokio::test]
async fn test_respawn_exits_only_flagged_zones() {
    let handle = session_with_participants(&[1]).await;
    let p = ParticipantId(1);

    let mut arena_spec = spec("arena", 3);
    arena_spec.respawn_policy = RespawnSetting::Exit;
    let arena = handle.create_zone(arena_spec).await.unwrap();
    let lounge = handle.create_zone(spec("lounge", 2)).await.unwrap();

    handle.zone_enter(arena.zone_id, p).await.unwrap();
    handle.zone_enter(lounge.zone_id, p).await.unwrap();

    let summary = handle.respawn_participant(p).await.unwrap();
    assert_eq!(summary.exited_zones, 1);

    let resolved = handle.resolved(p).await.unwrap();
    assert_eq!(resolved.zone_id, Some(lounge.zone_id));

    // A second respawn changes nothing.
    let summary = handle.respawn_participant(p).await.unwrap();
    assert_eq!(summary.exited_zones, 0);

    handle.cancel();
}

#[tokio::test]
async fn test_disconnect_reconnect_cycle() {
    let handle = session_with_participants(&[1]).await;
    let p = ParticipantId(1);
    let zone = handle.create_zone(spec("stage", 4)).await.unwrap();

    handle.zone_enter(zone.zone_id, p).await.unwrap();
    let summary = handle.disconnect_participant(p).await.unwrap();
    assert!(summary.was_connected);
    assert_eq!(summary.purged_overrides, 1);

    // Zone events for the disconnected participant fail cleanly.
    let result = handle.zone_enter(zone.zone_id, p).await;
    assert!(result.is_err());

    // Reconnecting starts from a clean slate.
    assert!(handle.connect_participant(p).await.unwrap());
    assert!(handle.zone_enter(zone.zone_id, p).await.unwrap());
    let resolved = handle.resolved(p).await.unwrap();
    assert_eq!(resolved.zone_id, Some(zone.zone_id));

    handle.cancel();
}

#[tokio::test]
async fn test_resolved_parameters_surface_zone_config() {
    let handle = session_with_participants(&[1]).await;

    let mut cellar_spec = spec("cellar", 8);
    cellar_spec.parameters = OverrideParameters {
        voice_distance_far: 8.0,
        occlusion_factor: 0.1,
        ..OverrideParameters::default()
    };
    let cellar = handle.create_zone(cellar_spec).await.unwrap();
    handle
        .zone_enter(cellar.zone_id, ParticipantId(1))
        .await
        .unwrap();

    let resolved = handle.resolved(ParticipantId(1)).await.unwrap();
    let params = resolved.parameters.unwrap();
    assert_eq!(params.voice_distance_far, 8.0);
    assert_eq!(params.occlusion_factor, 0.1);

    handle.cancel();
}
