//! Collaborators outside the simulation: the world geometry the boids steer
//! around, and the sink that receives their resulting transforms.

use alloc::vec::Vec;

use flock_shared::TransformUpdate;

use crate::math;
use crate::vector::Vector3D;

/// Where a cast ray first touched world geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vector3D,
    pub distance: f32,
}

/// Ray queries against world geometry, used by obstacle avoidance
pub trait WorldQuery {
    /// First hit along `direction` (need not be normalized) within
    /// `max_distance` of `origin`, considering only geometry whose layer
    /// intersects `layer_mask`.
    fn cast_ray(
        &self,
        origin: Vector3D,
        direction: Vector3D,
        max_distance: f32,
        layer_mask: u32,
    ) -> Option<RayHit>;
}

/// An empty world
#[derive(Debug, Clone, Copy, Default)]
pub struct NoObstacles;

impl WorldQuery for NoObstacles {
    fn cast_ray(&self, _: Vector3D, _: Vector3D, _: f32, _: u32) -> Option<RayHit> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereObstacle {
    pub center: Vector3D,
    pub radius: f32,
    pub layer: u32,
}

/// World made of spheres, intersected analytically
#[derive(Debug, Clone, Default)]
pub struct SphereObstacles {
    pub obstacles: Vec<SphereObstacle>,
}

impl SphereObstacles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sphere(mut self, center: Vector3D, radius: f32, layer: u32) -> Self {
        self.obstacles.push(SphereObstacle {
            center,
            radius,
            layer,
        });
        self
    }
}

impl WorldQuery for SphereObstacles {
    fn cast_ray(
        &self,
        origin: Vector3D,
        direction: Vector3D,
        max_distance: f32,
        layer_mask: u32,
    ) -> Option<RayHit> {
        let dir = direction.normalize();
        if dir.is_zero() {
            return None;
        }

        let mut nearest: Option<f32> = None;
        for obstacle in self.obstacles.iter().filter(|o| o.layer & layer_mask != 0) {
            let offset = origin - obstacle.center;
            let b = offset.dot(&dir);
            let c = offset.magnitude_squared() - obstacle.radius * obstacle.radius;
            let discriminant = b * b - c;
            if discriminant < 0.0 {
                continue;
            }
            let root = math::sqrtf(discriminant);
            // Origin inside the sphere counts as an immediate hit
            let t = if c <= 0.0 { 0.0 } else { -b - root };
            if t < 0.0 || t > max_distance {
                continue;
            }
            if nearest.map_or(true, |n| t < n) {
                nearest = Some(t);
            }
        }

        nearest.map(|distance| RayHit {
            point: origin + dir * distance,
            distance,
        })
    }
}

/// Receives each boid's placement once per tick
pub trait TransformSink {
    fn publish(&mut self, update: TransformUpdate);
}

/// Discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TransformSink for NullSink {
    fn publish(&mut self, _: TransformUpdate) {}
}

impl TransformSink for Vec<TransformUpdate> {
    fn publish(&mut self, update: TransformUpdate) {
        self.push(update);
    }
}
