//! HTTP request handlers for the Space Controller.

pub mod participants;
pub mod zones;

pub use participants::{
    connect_participant, disconnect_participant, get_audibility, get_resolved,
    respawn_participant,
};
pub use zones::{create_zone, get_state, remove_zone, sync_roster, zone_enter, zone_exit};
