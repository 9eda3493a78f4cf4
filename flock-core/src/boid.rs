use flock_shared::{BoidRole, Position3, TransformUpdate};

use crate::vector::Vector3D;

/// A single boid entity
#[derive(Debug, Clone, PartialEq)]
pub struct BoidState {
    pub position: Vector3D,
    pub velocity: Vector3D,
    /// Force accumulated for the current tick, cleared on integration
    pub force: Vector3D,
    pub max_speed: f32,
    pub role: BoidRole,
    pub destination: Option<Vector3D>,
    pub has_reached_destination: bool,
    /// Facing angle in radians, follows the velocity
    pub orientation: f32,
}

impl BoidState {
    pub fn new(position: Vector3D, velocity: Vector3D, max_speed: f32) -> Self {
        Self {
            position,
            velocity,
            force: Vector3D::zero(),
            max_speed,
            role: BoidRole::Follower,
            destination: None,
            has_reached_destination: false,
            orientation: 0.0,
        }
    }

    pub fn with_role(mut self, role: BoidRole) -> Self {
        self.role = role;
        self
    }

    pub fn is_leader(&self) -> bool {
        self.role == BoidRole::Leader
    }

    pub fn is_outcast(&self) -> bool {
        self.role == BoidRole::Outcast
    }

    pub fn apply_force(&mut self, force: Vector3D) {
        self.force += force;
    }

    /// Point the boid somewhere new; clears the reached flag
    pub fn set_destination(&mut self, destination: Option<Vector3D>) {
        self.destination = destination;
        self.has_reached_destination = false;
    }

    /// Destination still worth steering towards
    pub fn pending_destination(&self) -> Option<Vector3D> {
        self.destination.filter(|_| !self.has_reached_destination)
    }

    pub fn transform(&self, id: usize) -> TransformUpdate {
        TransformUpdate {
            id,
            position: Position3::from(self.position),
            orientation: self.orientation,
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boid_creation() {
        let boid = BoidState::new(
            Vector3D::new(10.0, 20.0, 0.0),
            Vector3D::new(1.0, 1.0, 0.0),
            5.0,
        );

        assert_eq!(boid.position, Vector3D::new(10.0, 20.0, 0.0));
        assert_eq!(boid.velocity, Vector3D::new(1.0, 1.0, 0.0));
        assert!(boid.force.is_zero());
        assert_eq!(boid.role, BoidRole::Follower);
    }

    #[test]
    fn test_apply_force_accumulates() {
        let mut boid = BoidState::new(Vector3D::zero(), Vector3D::zero(), 1.0);
        boid.apply_force(Vector3D::new(1.0, 0.0, 0.0));
        boid.apply_force(Vector3D::new(0.0, 2.0, 0.0));
        assert_eq!(boid.force, Vector3D::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_reached_destination_is_not_pending() {
        let mut boid = BoidState::new(Vector3D::zero(), Vector3D::zero(), 1.0);
        boid.set_destination(Some(Vector3D::new(5.0, 5.0, 0.0)));
        assert!(boid.pending_destination().is_some());

        boid.has_reached_destination = true;
        assert!(boid.pending_destination().is_none());

        boid.set_destination(Some(Vector3D::new(1.0, 1.0, 0.0)));
        assert!(!boid.has_reached_destination);
    }
}
