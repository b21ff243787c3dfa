//! Participant lifecycle and query handlers.
//!
//! - `POST /v1/participants` - participant connected
//! - `DELETE /v1/participants/{id}` - participant disconnected
//! - `POST /v1/participants/{id}/respawn` - participant respawned
//! - `GET /v1/participants/{id}/resolved` - winning override
//! - `GET /v1/audibility` - privacy verdict for a listener/speaker pair

use crate::actors::{AudibilityView, DisconnectSummary, ResolvedView, RespawnSummary};
use crate::errors::ScError;
use crate::routes::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use common::ParticipantId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Request body for `POST /v1/participants`.
#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    /// Session-unique participant id.
    pub id: u32,
}

/// Response for `POST /v1/participants`.
#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub participant: ParticipantId,
    /// False when the participant was already connected.
    pub newly_connected: bool,
}

/// Query string for `GET /v1/audibility`.
#[derive(Debug, Deserialize)]
pub struct AudibilityQuery {
    pub listener: u32,
    pub speaker: u32,
}

/// Handler for `POST /v1/participants`.
#[instrument(skip(state))]
pub async fn connect_participant(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConnectRequest>,
) -> Result<(StatusCode, Json<ConnectResponse>), ScError> {
    let participant = ParticipantId(request.id);
    let newly_connected = state.actor.connect_participant(participant).await?;
    Ok((
        StatusCode::CREATED,
        Json(ConnectResponse {
            participant,
            newly_connected,
        }),
    ))
}

/// Handler for `DELETE /v1/participants/{id}`.
#[instrument(skip(state))]
pub async fn disconnect_participant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<DisconnectSummary>, ScError> {
    let summary = state
        .actor
        .disconnect_participant(ParticipantId(id))
        .await?;
    Ok(Json(summary))
}

/// Handler for `POST /v1/participants/{id}/respawn`.
#[instrument(skip(state))]
pub async fn respawn_participant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<RespawnSummary>, ScError> {
    let summary = state.actor.respawn_participant(ParticipantId(id)).await?;
    Ok(Json(summary))
}

/// Handler for `GET /v1/participants/{id}/resolved`.
#[instrument(skip(state))]
pub async fn get_resolved(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<ResolvedView>, ScError> {
    let view = state.actor.resolved(ParticipantId(id)).await?;
    Ok(Json(view))
}

/// Handler for `GET /v1/audibility`.
#[instrument(skip(state))]
pub async fn get_audibility(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AudibilityQuery>,
) -> Result<Json<AudibilityView>, ScError> {
    let view = state
        .actor
        .audibility(ParticipantId(query.listener), ParticipantId(query.speaker))
        .await?;
    Ok(Json(view))
}
