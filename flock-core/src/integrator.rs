use flock_shared::{BoundaryMode, FlockConfig};

use crate::behavior;
use crate::boid::BoidState;
use crate::math;
use crate::vector::Vector3D;

/// Explicit Euler step plus speed clamp into `[min_speed, max_speed]` and
/// boundary policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Integrator;

impl Integrator {
    /// Advance `boid` by `dt` seconds using its accumulated force, which is
    /// consumed.
    pub fn advance(boid: &mut BoidState, dt: f32, config: &FlockConfig) {
        boid.velocity += boid.force * dt;
        boid.position += boid.velocity * dt;
        boid.force = Vector3D::zero();

        boid.velocity = boid.velocity.limit(boid.max_speed);
        // A stalled boid is pushed off along its facing
        let min_speed = config.min_speed.min(boid.max_speed);
        if min_speed > 0.0 && boid.velocity.magnitude() < min_speed {
            boid.velocity = behavior::heading(boid) * min_speed;
        }

        let extents = Vector3D::from(config.world_extents);
        match config.boundary {
            BoundaryMode::Wrap => {
                boid.position.x = wrap_axis(boid.position.x, extents.x);
                boid.position.y = wrap_axis(boid.position.y, extents.y);
                boid.position.z = wrap_axis(boid.position.z, extents.z);
            }
            BoundaryMode::Clamp => {
                boid.position.x = clamp_axis(boid.position.x, extents.x);
                boid.position.y = clamp_axis(boid.position.y, extents.y);
                boid.position.z = clamp_axis(boid.position.z, extents.z);
            }
        }

        if !boid.velocity.is_zero() {
            boid.orientation = facing_angle(boid.velocity);
        }
    }
}

/// Facing angle in radians, zero when moving along +y
pub fn facing_angle(velocity: Vector3D) -> f32 {
    math::atan2f(-velocity.x, velocity.y)
}

/// Axes with a non-positive extent are unbounded
#[inline]
fn wrap_axis(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return value;
    }
    let mut value = value;
    if value < 0.0 {
        value += extent;
    }
    if value >= extent {
        value -= extent;
    }
    value
}

#[inline]
fn clamp_axis(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return value;
    }
    if value < 0.0 {
        0.0
    } else if value >= extent {
        extent
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_shared::Position3;

    fn config(boundary: BoundaryMode) -> FlockConfig {
        FlockConfig {
            boundary,
            world_extents: Position3::new(100.0, 50.0, 0.0),
            ..FlockConfig::default()
        }
    }

    #[test]
    fn test_euler_step_consumes_force() {
        let mut boid = BoidState::new(Vector3D::planar(10.0, 10.0), Vector3D::zero(), 100.0);
        boid.apply_force(Vector3D::planar(2.0, 0.0));

        Integrator::advance(&mut boid, 0.5, &config(BoundaryMode::Wrap));

        assert_eq!(boid.velocity, Vector3D::planar(1.0, 0.0));
        assert_eq!(boid.position, Vector3D::planar(10.5, 10.0));
        assert!(boid.force.is_zero());
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut boid = BoidState::new(Vector3D::planar(10.0, 10.0), Vector3D::planar(30.0, 40.0), 5.0);
        Integrator::advance(&mut boid, 0.01, &config(BoundaryMode::Wrap));

        assert!(boid.velocity.magnitude() <= 5.0 + 1e-5);
        assert!((boid.velocity.x - 3.0).abs() < 1e-5);
        assert!((boid.velocity.y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_min_speed_floor() {
        let config = FlockConfig {
            min_speed: 4.0,
            ..config(BoundaryMode::Wrap)
        };

        let mut slow = BoidState::new(Vector3D::planar(10.0, 10.0), Vector3D::planar(0.0, 1.0), 10.0);
        Integrator::advance(&mut slow, 0.1, &config);
        assert!((slow.velocity - Vector3D::planar(0.0, 4.0)).magnitude() < 1e-5);

        // Stationary boids leave along their facing (orientation zero is +y)
        let mut still = BoidState::new(Vector3D::planar(10.0, 10.0), Vector3D::zero(), 10.0);
        Integrator::advance(&mut still, 0.1, &config);
        assert!((still.velocity - Vector3D::planar(0.0, 4.0)).magnitude() < 1e-5);

        // Never above the boid's own max speed
        let mut capped = BoidState::new(Vector3D::planar(10.0, 10.0), Vector3D::planar(1.0, 0.0), 2.0);
        Integrator::advance(&mut capped, 0.1, &config);
        assert!((capped.velocity.magnitude() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_wrap_boundary() {
        let config = config(BoundaryMode::Wrap);

        let mut below = BoidState::new(Vector3D::planar(0.5, 25.0), Vector3D::planar(-1.0, 0.0), 10.0);
        Integrator::advance(&mut below, 1.0, &config);
        assert_eq!(below.position.x, 99.5);

        let mut above = BoidState::new(Vector3D::planar(10.0, 49.5), Vector3D::planar(0.0, 1.0), 10.0);
        Integrator::advance(&mut above, 1.0, &config);
        assert_eq!(above.position.y, 0.5);

        // Already in bounds: wrapping again changes nothing
        let before = above.position;
        above.velocity = Vector3D::zero();
        Integrator::advance(&mut above, 1.0, &config);
        assert_eq!(above.position, before);
    }

    #[test]
    fn test_clamp_boundary_keeps_velocity() {
        let config = config(BoundaryMode::Clamp);

        let mut boid = BoidState::new(Vector3D::planar(99.0, 1.0), Vector3D::planar(5.0, -5.0), 10.0);
        Integrator::advance(&mut boid, 1.0, &config);

        assert_eq!(boid.position, Vector3D::planar(100.0, 0.0));
        assert_eq!(boid.velocity, Vector3D::planar(5.0, -5.0));
    }

    #[test]
    fn test_unbounded_axis() {
        let mut boid = BoidState::new(Vector3D::new(1.0, 1.0, -3.0), Vector3D::new(0.0, 0.0, -1.0), 10.0);
        Integrator::advance(&mut boid, 1.0, &config(BoundaryMode::Clamp));
        assert_eq!(boid.position.z, -4.0);
    }

    #[test]
    fn test_orientation_follows_velocity() {
        let config = config(BoundaryMode::Wrap);
        let mut boid = BoidState::new(Vector3D::planar(10.0, 10.0), Vector3D::planar(1.0, 0.0), 10.0);
        Integrator::advance(&mut boid, 0.1, &config);
        assert!((boid.orientation + core::f32::consts::FRAC_PI_2).abs() < 1e-5);

        boid.velocity = Vector3D::zero();
        Integrator::advance(&mut boid, 0.1, &config);
        assert!((boid.orientation + core::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }
}
