//! Space Controller Service Library
//!
//! The Space Controller is the authoritative spatial-audio override
//! resolver for one shared session. It owns the override engine, accepts
//! world events from trigger adapters (zone enter/exit, respawn,
//! disconnect) and roster pushes from the replication layer, and answers
//! resolution and privacy queries for the audio-parameter consumer.
//!
//! # Architecture
//!
//! ```text
//! SpaceActor (one per session process)
//! ├── owns the OverrideRegistry (voice-engine)
//! ├── owns the SessionRoster (participant directory)
//! └── owns OverrideZone adapters keyed by zone id (voice-triggers)
//! HTTP API (axum)
//! ├── /v1/participants - connect/disconnect/respawn/resolved
//! ├── /v1/zones        - create/remove/enter/exit/roster
//! └── /v1/audibility, /v1/state
//! ```
//!
//! The engine itself is synchronous; the actor mailbox serializes all
//! access so mutations apply in arrival order, matching the engine's
//! single-writer model.
//!
//! # Modules
//!
//! - [`actors`] - the space actor and its message types
//! - [`config`] - service configuration from environment
//! - [`errors`] - error types with HTTP status mapping
//! - [`handlers`] / [`routes`] - the HTTP surface
//! - [`observability`] - health probes
//! - [`session`] - the session participant roster

pub mod actors;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod observability;
pub mod routes;
pub mod session;
