//! Zone lifecycle, membership, and replication handlers.
//!
//! - `POST /v1/zones` - create a zone
//! - `DELETE /v1/zones/{zone_id}` - remove a zone
//! - `POST /v1/zones/{zone_id}/enter` - trigger enter event
//! - `POST /v1/zones/{zone_id}/exit` - trigger exit event
//! - `PUT /v1/zones/{zone_id}/roster` - replicated roster push
//! - `GET /v1/state` - session state snapshot

use crate::actors::{RosterSyncSummary, SpaceState, ZoneCreated, ZoneSpec};
use crate::errors::ScError;
use crate::routes::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use common::ParticipantId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use voice_triggers::SyncedRoster;

/// Request body for zone enter/exit events.
#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    /// The participant crossing the trigger.
    pub participant: u32,
}

/// Response for zone enter/exit events.
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    /// Whether membership actually changed (idempotent repeats are false).
    pub changed: bool,
}

/// Handler for `POST /v1/zones`.
#[instrument(skip(state, spec), fields(zone_name = %spec.name))]
pub async fn create_zone(
    State(state): State<Arc<AppState>>,
    Json(spec): Json<ZoneSpec>,
) -> Result<(StatusCode, Json<ZoneCreated>), ScError> {
    let created = state.actor.create_zone(spec).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Handler for `DELETE /v1/zones/{zone_id}`.
#[instrument(skip(state))]
pub async fn remove_zone(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<Uuid>,
) -> Result<StatusCode, ScError> {
    state.actor.remove_zone(zone_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /v1/zones/{zone_id}/enter`.
#[instrument(skip(state))]
pub async fn zone_enter(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<Uuid>,
    Json(request): Json<MembershipRequest>,
) -> Result<Json<MembershipResponse>, ScError> {
    let changed = state
        .actor
        .zone_enter(zone_id, ParticipantId(request.participant))
        .await?;
    Ok(Json(MembershipResponse { changed }))
}

/// Handler for `POST /v1/zones/{zone_id}/exit`.
#[instrument(skip(state))]
pub async fn zone_exit(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<Uuid>,
    Json(request): Json<MembershipRequest>,
) -> Result<Json<MembershipResponse>, ScError> {
    let changed = state
        .actor
        .zone_exit(zone_id, ParticipantId(request.participant))
        .await?;
    Ok(Json(MembershipResponse { changed }))
}

/// Handler for `PUT /v1/zones/{zone_id}/roster`.
///
/// The body is a plain id array, the same sequence the replication layer
/// distributes; local membership reconciles to match it.
#[instrument(skip(state, roster))]
pub async fn sync_roster(
    State(state): State<Arc<AppState>>,
    Path(zone_id): Path<Uuid>,
    Json(roster): Json<SyncedRoster>,
) -> Result<Json<RosterSyncSummary>, ScError> {
    let summary = state.actor.sync_roster(zone_id, roster).await?;
    Ok(Json(summary))
}

/// Handler for `GET /v1/state`.
#[instrument(skip(state))]
pub async fn get_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SpaceState>, ScError> {
    let snapshot = state.actor.state().await?;
    Ok(Json(snapshot))
}
