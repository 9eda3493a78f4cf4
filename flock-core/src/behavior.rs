//! Individual steering rules. Each returns its already-weighted
//! contribution; [`crate::ForceModel`] decides which ones run and sums them.

use flock_shared::FlockConfig;

use crate::boid::BoidState;
use crate::math;
use crate::vector::Vector3D;
use crate::world::WorldQuery;

/// Leaders count once plain and once scaled by `leader_strength`
#[inline]
fn leader_weighted(value: Vector3D, other: &BoidState, config: &FlockConfig) -> Vector3D {
    if config.enable_leaders && other.is_leader() {
        value * (1.0 + config.leader_strength)
    } else {
        value
    }
}

/// Steer towards the average neighbour position.
///
/// Only the first `max_neighbors` neighbours feed the average. With falloff
/// enabled the strength shrinks as that share of the neighbourhood grows,
/// reaching zero once every neighbour has been counted.
pub fn cohesion<'a, I>(boid: &BoidState, others: I, config: &FlockConfig) -> Vector3D
where
    I: ExactSizeIterator<Item = &'a BoidState>,
{
    let in_range = others.len();
    let cap = config.max_neighbors.unwrap_or(in_range);

    let mut sum = Vector3D::zero();
    let mut found = 0usize;
    for other in others.take(cap) {
        sum += leader_weighted(other.position, other, config);
        found += 1;
    }

    if found == 0 {
        return Vector3D::zero();
    }

    let average = sum / found as f32;
    let direction = average - boid.position;

    let mut steering = Vector3D::zero();
    if boid.is_leader() {
        steering += direction.normalize() * config.leader_strength;
    }

    let strength = if config.enable_cohesion_falloff {
        config.cohesion_falloff_strength * (1.0 - found as f32 / in_range as f32)
    } else {
        config.cohesion_strength
    };

    steering + direction * strength
}

/// Steer towards the average neighbour velocity
pub fn alignment<'a, I>(boid: &BoidState, others: I, config: &FlockConfig) -> Vector3D
where
    I: ExactSizeIterator<Item = &'a BoidState>,
{
    let in_range = others.len();
    let cap = config.max_neighbors.unwrap_or(in_range);

    let mut sum = Vector3D::zero();
    let mut found = 0usize;
    for other in others.take(cap) {
        sum += leader_weighted(other.velocity, other, config);
        found += 1;
    }

    if found == 0 {
        return Vector3D::zero();
    }

    let average = sum / found as f32;
    (average - boid.velocity) * config.alignment_strength
}

/// Push away from every neighbour inside the sight radius. Contributions are
/// summed, so denser clusters push harder.
pub fn separation<'a, I>(boid: &BoidState, others: I, config: &FlockConfig) -> Vector3D
where
    I: Iterator<Item = &'a BoidState>,
{
    let mut steering = Vector3D::zero();

    for other in others {
        let distance = boid.position.distance(&other.position);
        if distance < config.sight_radius {
            let direction = boid.position - other.position;
            if other.is_outcast() {
                steering += direction.normalize() * config.outcast_strength;
            }
            steering += direction * config.separation_strength;
        }
    }

    steering
}

/// Steering force that turns the current velocity towards `offset` at full
/// speed, clamped to `max_steering_force`
pub fn steer_towards(boid: &BoidState, offset: Vector3D, config: &FlockConfig) -> Vector3D {
    let desired = offset.normalize() * boid.max_speed;
    (desired - boid.velocity).limit(config.max_steering_force)
}

/// Head for the boid's destination until it has been reached
pub fn seek_destination(boid: &BoidState, config: &FlockConfig) -> Vector3D {
    match boid.pending_destination() {
        Some(destination) => {
            steer_towards(boid, destination - boid.position, config) * config.destination_strength
        }
        None => Vector3D::zero(),
    }
}

/// Pull back towards the bounds center once the boid nears the bounds radius
pub fn bounds_avoidance(boid: &BoidState, config: &FlockConfig) -> Vector3D {
    let offset = Vector3D::from(config.bounds_center) - boid.position;
    if offset.magnitude() >= config.bounds_radius * 0.9 {
        offset.normalize() * config.bounds_avoidance_strength
    } else {
        Vector3D::zero()
    }
}

/// Unit vector the boid is facing. Falls back to the stored orientation
/// when the boid is stationary.
pub fn heading(boid: &BoidState) -> Vector3D {
    let forward = boid.velocity.normalize();
    if forward.is_zero() {
        let (sin, cos) = math::sin_cos(boid.orientation);
        Vector3D::planar(-sin, cos)
    } else {
        forward
    }
}

/// Whether `point` lies within `fov_angle` degrees of the boid's heading.
/// A point on top of the boid is always seen.
pub fn in_field_of_view(boid: &BoidState, point: Vector3D, config: &FlockConfig) -> bool {
    if config.fov_angle >= 180.0 {
        return true;
    }
    let offset = (point - boid.position).normalize();
    if offset.is_zero() {
        return true;
    }
    let (_, cos_limit) = math::sin_cos(config.fov_angle.to_radians());
    heading(boid).dot(&offset) >= cos_limit
}

/// Right, up and forward axes of the boid's local frame
fn local_frame(forward: Vector3D) -> (Vector3D, Vector3D, Vector3D) {
    let mut right = forward.cross(&Vector3D::UP).normalize();
    if right.is_zero() {
        right = Vector3D::new(1.0, 0.0, 0.0);
    }
    let up = right.cross(&forward);
    (right, up, forward)
}

/// When the path ahead is blocked, pick a heading-relative escape direction:
/// the first probe with a clear line wins, otherwise the probe whose hit is
/// farthest away.
pub fn obstacle_avoidance(
    boid: &BoidState,
    world: &dyn WorldQuery,
    probes: &[Vector3D],
    config: &FlockConfig,
) -> Vector3D {
    let forward = heading(boid);
    if forward.is_zero() {
        return Vector3D::zero();
    }

    let reach = config.obstacle_probe_distance;
    let mask = config.obstacle_layer_mask;
    if world.cast_ray(boid.position, forward, reach, mask).is_none() {
        return Vector3D::zero();
    }

    let (right, up, forward) = local_frame(forward);
    let mut farthest = f32::MIN;
    let mut selected = Vector3D::zero();

    for probe in probes {
        let local = probe.normalize();
        let direction = right * local.x + up * local.y + forward * local.z;
        match world.cast_ray(boid.position, direction, reach, mask) {
            Some(hit) => {
                let dist = hit.point.distance_squared(&boid.position);
                if dist > farthest {
                    farthest = dist;
                    selected = direction;
                }
            }
            None => {
                selected = direction;
                break;
            }
        }
    }

    selected.normalize() * config.obstacle_avoidance_strength
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SphereObstacles;
    use alloc::vec;
    use alloc::vec::Vec;
    use flock_shared::BoidRole;

    fn boid_at(x: f32, y: f32) -> BoidState {
        BoidState::new(Vector3D::planar(x, y), Vector3D::zero(), 10.0)
    }

    fn approx(a: Vector3D, b: Vector3D) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn test_cohesion_points_at_single_neighbor() {
        let me = boid_at(0.0, 0.0);
        let other = boid_at(3.0, 4.0);
        let config = FlockConfig::default();

        let force = cohesion(&me, [&other].into_iter(), &config);
        assert!(approx(force.normalize(), Vector3D::planar(0.6, 0.8)));
        assert!(approx(force, Vector3D::planar(3.0, 4.0) * config.cohesion_strength));
    }

    #[test]
    fn test_cohesion_with_no_neighbors_is_zero() {
        let me = boid_at(0.0, 0.0);
        let none: Vec<&BoidState> = Vec::new();
        assert!(cohesion(&me, none.into_iter(), &FlockConfig::default()).is_zero());
    }

    #[test]
    fn test_cohesion_weights_leaders() {
        let me = boid_at(0.0, 0.0);
        let leader = boid_at(4.0, 0.0).with_role(BoidRole::Leader);
        let follower = boid_at(0.0, 4.0);
        let config = FlockConfig {
            enable_leaders: true,
            leader_strength: 1.0,
            ..FlockConfig::default()
        };

        // (4*2 + 0, 0 + 4) / 2
        let force = cohesion(&me, [&leader, &follower].into_iter(), &config);
        assert!(approx(force, Vector3D::planar(4.0, 2.0)));
    }

    #[test]
    fn test_leader_gets_extra_cohesion_pull() {
        let me = boid_at(0.0, 0.0).with_role(BoidRole::Leader);
        let other = boid_at(2.0, 0.0);
        let config = FlockConfig {
            leader_strength: 3.0,
            ..FlockConfig::default()
        };

        let force = cohesion(&me, [&other].into_iter(), &config);
        assert!(approx(force, Vector3D::planar(3.0 + 2.0, 0.0)));
    }

    #[test]
    fn test_cohesion_falloff_decays_with_found_share() {
        let me = boid_at(0.0, 0.0);
        let a = boid_at(2.0, 0.0);
        let b = boid_at(100.0, 0.0);
        let c = boid_at(100.0, 0.0);
        let d = boid_at(100.0, 0.0);
        let config = FlockConfig {
            enable_cohesion_falloff: true,
            cohesion_falloff_strength: 0.5,
            max_neighbors: Some(1),
            ..FlockConfig::default()
        };

        // one of four neighbours counted: 0.5 * (1 - 1/4)
        let force = cohesion(&me, [&a, &b, &c, &d].into_iter(), &config);
        assert!(approx(force, Vector3D::planar(2.0 * 0.375, 0.0)));

        let uncapped = FlockConfig {
            max_neighbors: None,
            ..config
        };
        assert!(cohesion(&me, [&a, &b].into_iter(), &uncapped).is_zero());
    }

    #[test]
    fn test_alignment_matches_average_velocity() {
        let mut me = boid_at(0.0, 0.0);
        me.velocity = Vector3D::planar(1.0, 0.0);
        let mut a = boid_at(1.0, 0.0);
        a.velocity = Vector3D::planar(0.0, 2.0);
        let mut b = boid_at(2.0, 0.0);
        b.velocity = Vector3D::planar(2.0, 0.0);
        let config = FlockConfig {
            alignment_strength: 0.5,
            ..FlockConfig::default()
        };

        let force = alignment(&me, [&a, &b].into_iter(), &config);
        assert!(approx(force, Vector3D::planar(0.0, 0.5)));
    }

    #[test]
    fn test_separation_sums_without_averaging() {
        let me = boid_at(0.0, 0.0);
        let a = boid_at(1.0, 0.0);
        let b = boid_at(2.0, 0.0);
        let config = FlockConfig::default();

        let force = separation(&me, [&a, &b].into_iter(), &config);
        assert!(approx(force, Vector3D::planar(-3.0, 0.0)));
    }

    #[test]
    fn test_separation_same_position_is_not_nan() {
        let me = boid_at(5.0, 5.0);
        let twin = boid_at(5.0, 5.0).with_role(BoidRole::Outcast);
        let force = separation(&me, [&twin].into_iter(), &FlockConfig::default());
        assert!(force.is_finite());
        assert!(force.is_zero());
    }

    #[test]
    fn test_outcast_pushes_harder() {
        let me = boid_at(0.0, 0.0);
        let outcast = boid_at(2.0, 0.0).with_role(BoidRole::Outcast);
        let config = FlockConfig {
            outcast_strength: 5.0,
            ..FlockConfig::default()
        };

        let force = separation(&me, [&outcast].into_iter(), &config);
        assert!(approx(force, Vector3D::planar(-5.0 - 2.0, 0.0)));
    }

    #[test]
    fn test_separation_ignores_boids_beyond_sight() {
        let me = boid_at(0.0, 0.0);
        let far = boid_at(10.0, 0.0);
        let config = FlockConfig {
            sight_radius: 10.0,
            ..FlockConfig::default()
        };
        assert!(separation(&me, [&far].into_iter(), &config).is_zero());
    }

    #[test]
    fn test_steer_towards_is_clamped() {
        let me = boid_at(0.0, 0.0);
        let config = FlockConfig {
            max_steering_force: 1.5,
            ..FlockConfig::default()
        };
        let force = steer_towards(&me, Vector3D::planar(100.0, 0.0), &config);
        assert!(approx(force, Vector3D::planar(1.5, 0.0)));
    }

    #[test]
    fn test_seek_stops_once_reached() {
        let mut me = boid_at(0.0, 0.0);
        let config = FlockConfig::default();
        me.set_destination(Some(Vector3D::planar(0.0, 50.0)));
        assert!(seek_destination(&me, &config).y > 0.0);

        me.has_reached_destination = true;
        assert!(seek_destination(&me, &config).is_zero());
    }

    #[test]
    fn test_bounds_avoidance_threshold() {
        let config = FlockConfig {
            bounds_center: flock_shared::Position3::new(0.0, 0.0, 0.0),
            bounds_radius: 10.0,
            bounds_avoidance_strength: 2.0,
            ..FlockConfig::default()
        };
        assert!(bounds_avoidance(&boid_at(8.0, 0.0), &config).is_zero());
        let pull = bounds_avoidance(&boid_at(9.0, 0.0), &config);
        assert!(approx(pull, Vector3D::planar(-2.0, 0.0)));
    }

    #[test]
    fn test_field_of_view_cone() {
        let mut me = boid_at(0.0, 0.0);
        me.velocity = Vector3D::planar(0.0, 1.0);
        let config = FlockConfig {
            fov_angle: 90.0,
            ..FlockConfig::default()
        };

        assert!(in_field_of_view(&me, Vector3D::planar(0.0, 5.0), &config));
        assert!(in_field_of_view(&me, Vector3D::planar(3.0, 0.0), &config));
        assert!(in_field_of_view(&me, Vector3D::zero(), &config));
        assert!(!in_field_of_view(&me, Vector3D::planar(1.0, -1.0), &config));

        let narrow = FlockConfig {
            fov_angle: 30.0,
            ..config
        };
        assert!(in_field_of_view(&me, Vector3D::planar(1.0, 5.0), &narrow));
        assert!(!in_field_of_view(&me, Vector3D::planar(5.0, 5.0), &narrow));

        let all_round = FlockConfig {
            fov_angle: 180.0,
            ..narrow
        };
        assert!(in_field_of_view(&me, Vector3D::planar(0.0, -5.0), &all_round));
    }

    #[test]
    fn test_heading_falls_back_to_orientation() {
        let mut me = boid_at(0.0, 0.0);
        me.orientation = -core::f32::consts::FRAC_PI_2;
        assert!(approx(heading(&me), Vector3D::planar(1.0, 0.0)));
    }

    #[test]
    fn test_obstacle_avoidance_picks_first_clear_probe() {
        let mut me = boid_at(0.0, 0.0);
        me.velocity = Vector3D::planar(0.0, 1.0);
        // Wall ahead and to the right
        let world = SphereObstacles::new()
            .with_sphere(Vector3D::planar(0.0, 5.0), 2.0, 1)
            .with_sphere(Vector3D::planar(5.0, 0.0), 2.0, 1);
        let probes = vec![
            Vector3D::new(1.0, 0.0, 0.0),
            Vector3D::new(-1.0, 0.0, 0.0),
        ];
        let config = FlockConfig {
            obstacle_avoidance_strength: 3.0,
            ..FlockConfig::default()
        };

        let force = obstacle_avoidance(&me, &world, &probes, &config);
        assert!(approx(force, Vector3D::planar(-3.0, 0.0)));
    }

    #[test]
    fn test_obstacle_avoidance_prefers_farthest_hit() {
        let mut me = boid_at(0.0, 0.0);
        me.velocity = Vector3D::planar(0.0, 1.0);
        let world = SphereObstacles::new()
            .with_sphere(Vector3D::planar(0.0, 5.0), 2.0, 1)
            .with_sphere(Vector3D::planar(4.0, 0.0), 1.0, 1)
            .with_sphere(Vector3D::planar(-8.0, 0.0), 1.0, 1);
        let probes = vec![
            Vector3D::new(1.0, 0.0, 0.0),
            Vector3D::new(-1.0, 0.0, 0.0),
        ];
        let config = FlockConfig {
            obstacle_avoidance_strength: 1.0,
            ..FlockConfig::default()
        };

        let force = obstacle_avoidance(&me, &world, &probes, &config);
        assert!(approx(force, Vector3D::planar(-1.0, 0.0)));
    }

    #[test]
    fn test_clear_path_needs_no_avoidance() {
        let mut me = boid_at(0.0, 0.0);
        me.velocity = Vector3D::planar(0.0, 1.0);
        let world = SphereObstacles::new().with_sphere(Vector3D::planar(0.0, -5.0), 2.0, 1);
        let probes = [Vector3D::new(1.0, 0.0, 0.0)];
        assert!(obstacle_avoidance(&me, &world, &probes, &FlockConfig::default()).is_zero());
    }
}
