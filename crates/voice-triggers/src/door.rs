//! Doorway trigger with directional crossing detection.
//!
//! A door is a thin trigger volume in a wall opening. Walking through it
//! in one direction enters the room's zone, the other direction leaves
//! it; stepping into the trigger and backing out the same side does
//! neither. The decision uses the participant's position when leaving the
//! trigger, relative to the door center, against the configured exit
//! direction.

use common::ParticipantId;
use nalgebra::Vector3;
use std::collections::HashMap;
use tracing::{debug, warn};
use voice_engine::{EngineError, OverrideRegistry};

use crate::zone::OverrideZone;

/// Outcome of a trigger-exit crossing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorCrossing {
    /// The participant crossed to the inside and joined the zone.
    Entered,
    /// The participant crossed to the outside and left the zone.
    Exited,
    /// The participant backed out the way they came; membership unchanged.
    Indeterminate,
}

/// A doorway bound to an [`OverrideZone`].
///
/// Positions are door-local: the caller transforms world positions into
/// the door's coordinate frame, with the origin at the door center. The
/// exit direction points to the outside of the room.
#[derive(Debug)]
pub struct OverrideDoor {
    name: String,
    exit_direction: Vector3<f32>,
    /// Door-local position of each participant currently in the trigger,
    /// recorded on trigger enter.
    in_trigger: HashMap<ParticipantId, Vector3<f32>>,
}

impl OverrideDoor {
    /// Create a door with the default exit direction (+Z, "forward").
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exit_direction: Vector3::new(0.0, 0.0, 1.0),
            in_trigger: HashMap::new(),
        }
    }

    /// Override the direction pointing out of the room.
    ///
    /// A zero vector disables crossing detection entirely: every pass
    /// through the trigger is indeterminate.
    #[must_use]
    pub fn with_exit_direction(mut self, direction: Vector3<f32>) -> Self {
        self.exit_direction = direction;
        self
    }

    /// Door name, used for logging.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a position on trigger-leave counts as having entered the
    /// room (it lies on the inside of the door plane).
    #[must_use]
    pub fn has_entered(&self, leave_position: Vector3<f32>) -> bool {
        crossed(leave_position, -self.exit_direction)
    }

    /// Whether a position on trigger-leave counts as having exited the
    /// room (it lies on the outside of the door plane).
    #[must_use]
    pub fn has_exited(&self, leave_position: Vector3<f32>) -> bool {
        crossed(leave_position, self.exit_direction)
    }

    /// Whether the participant is currently inside the door trigger.
    #[must_use]
    pub fn is_in_trigger(&self, participant: ParticipantId) -> bool {
        self.in_trigger.contains_key(&participant)
    }

    /// A participant stepped into the door trigger at the given
    /// door-local position.
    pub fn on_trigger_enter(&mut self, participant: ParticipantId, position: Vector3<f32>) {
        self.in_trigger.insert(participant, position);
        debug!(
            target: "vt.door",
            door = %self.name,
            participant = %participant,
            "Trigger entered"
        );
    }

    /// A participant left the door trigger; decide the crossing and drive
    /// the zone accordingly.
    ///
    /// # Errors
    ///
    /// Propagates engine failures from the zone membership change. The
    /// trigger-tracking entry is consumed either way, so a stuck
    /// participant cannot wedge the door.
    pub fn on_trigger_exit(
        &mut self,
        registry: &mut OverrideRegistry,
        zone: &mut OverrideZone,
        participant: ParticipantId,
        position: Vector3<f32>,
    ) -> Result<DoorCrossing, EngineError> {
        if self.in_trigger.remove(&participant).is_none() {
            warn!(
                target: "vt.door",
                door = %self.name,
                participant = %participant,
                "Trigger exit without matching enter"
            );
        }

        let crossing = if self.has_entered(position) {
            zone.enter(registry, participant)?;
            DoorCrossing::Entered
        } else if self.has_exited(position) {
            zone.exit(registry, participant)?;
            DoorCrossing::Exited
        } else {
            DoorCrossing::Indeterminate
        };

        debug!(
            target: "vt.door",
            door = %self.name,
            participant = %participant,
            crossing = ?crossing,
            "Trigger left"
        );
        Ok(crossing)
    }

    /// Drop trigger tracking for a participant (disconnect handling).
    pub fn forget(&mut self, participant: ParticipantId) {
        self.in_trigger.remove(&participant);
    }
}

/// A position counts as crossed when it lies on the side the direction
/// points to. Zero directions never cross.
fn crossed(position: Vector3<f32>, direction: Vector3<f32>) -> bool {
    direction.norm_squared() > f32::EPSILON && direction.dot(&position) > 0.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use ve_test_utils::fixtures::{participant, plain_override};
    use ve_test_utils::TestDirectory;

    const FORWARD: Vector3<f32> = Vector3::new(0.0, 0.0, 1.0);
    const BACK: Vector3<f32> = Vector3::new(0.0, 0.0, -1.0);
    const UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);
    const DOWN: Vector3<f32> = Vector3::new(0.0, -1.0, 0.0);
    const ZERO: Vector3<f32> = Vector3::new(0.0, 0.0, 0.0);

    #[test]
    fn test_crossing_truth_table_forward_exit() {
        // Exit direction forward: the room is behind the door.
        let door = OverrideDoor::new("door");

        assert!(door.has_entered(BACK));
        assert!(!door.has_entered(FORWARD));
        assert!(!door.has_entered(ZERO));

        assert!(door.has_exited(FORWARD));
        assert!(!door.has_exited(BACK));
        assert!(!door.has_exited(ZERO));
    }

    #[test]
    fn test_crossing_truth_table_vertical_exit() {
        let hatch = OverrideDoor::new("hatch").with_exit_direction(UP);

        assert!(hatch.has_entered(DOWN));
        assert!(!hatch.has_entered(UP));
        assert!(hatch.has_exited(UP));
        assert!(!hatch.has_exited(DOWN));
    }

    #[test]
    fn test_zero_exit_direction_never_crosses() {
        let door = OverrideDoor::new("door").with_exit_direction(ZERO);

        for position in [FORWARD, BACK, UP, DOWN, ZERO] {
            assert!(!door.has_entered(position));
            assert!(!door.has_exited(position));
        }
    }

    #[test]
    fn test_walk_through_enters_and_leaves_zone() {
        let dir = TestDirectory::with_connected(&[1]);
        let mut registry = OverrideRegistry::new(Arc::new(dir.clone()));
        let id = registry.register(plain_override("room", 5));
        let mut zone = OverrideZone::new("room", id);
        let mut door = OverrideDoor::new("room-door");
        let p = participant(1);

        // Walk in from the front, leave the trigger on the inside.
        door.on_trigger_enter(p, FORWARD);
        assert!(door.is_in_trigger(p));
        let crossing = door.on_trigger_exit(&mut registry, &mut zone, p, BACK).unwrap();
        assert_eq!(crossing, DoorCrossing::Entered);
        assert!(!door.is_in_trigger(p));
        assert!(zone.contains(&registry, p));

        // Walk back out.
        door.on_trigger_enter(p, BACK);
        let crossing = door
            .on_trigger_exit(&mut registry, &mut zone, p, FORWARD)
            .unwrap();
        assert_eq!(crossing, DoorCrossing::Exited);
        assert!(!zone.contains(&registry, p));
    }

    #[test]
    fn test_backing_out_same_side_changes_nothing() {
        let dir = TestDirectory::with_connected(&[1]);
        let mut registry = OverrideRegistry::new(Arc::new(dir.clone()));
        let id = registry.register(plain_override("room", 5));
        let mut zone = OverrideZone::new("room", id);
        let mut door = OverrideDoor::new("room-door");
        let p = participant(1);

        door.on_trigger_enter(p, FORWARD);
        let crossing = door.on_trigger_exit(&mut registry, &mut zone, p, ZERO).unwrap();
        assert_eq!(crossing, DoorCrossing::Indeterminate);
        assert!(!zone.contains(&registry, p));
    }

    #[test]
    fn test_crossing_error_still_consumes_tracking() {
        let dir = TestDirectory::with_connected(&[1]);
        let mut registry = OverrideRegistry::new(Arc::new(dir.clone()));
        let id = registry.register(plain_override("room", 5));
        let mut zone = OverrideZone::new("room", id);
        let mut door = OverrideDoor::new("room-door");
        let p = participant(1);

        registry.unregister(id).unwrap();
        door.on_trigger_enter(p, FORWARD);
        assert!(door
            .on_trigger_exit(&mut registry, &mut zone, p, BACK)
            .is_err());
        assert!(!door.is_in_trigger(p));
    }
}
