use alloc::vec::Vec;

use flock_shared::FlockConfig;
use thiserror::Error;

use crate::behavior;
use crate::boid::BoidState;
use crate::vector::Vector3D;
use crate::world::WorldQuery;

/// Upper bound on heading-relative obstacle probes
pub const MAX_PROBES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("too many obstacle probes: {0} (maximum {max})", max = MAX_PROBES)]
    TooMany(usize),
    #[error("obstacle probes must be non-zero vectors")]
    ZeroLength,
}

/// Sums every enabled steering rule into a single force. Holds nothing but
/// the obstacle probe directions, so one instance can serve any number of
/// flocks.
#[derive(Debug, Clone)]
pub struct ForceModel {
    probes: heapless::Vec<Vector3D, MAX_PROBES>,
}

impl Default for ForceModel {
    fn default() -> Self {
        let mut probes = heapless::Vec::new();
        // right, left, up, down in the boid's local frame
        for probe in [
            Vector3D::new(1.0, 0.0, 0.0),
            Vector3D::new(-1.0, 0.0, 0.0),
            Vector3D::new(0.0, 1.0, 0.0),
            Vector3D::new(0.0, -1.0, 0.0),
        ] {
            let _ = probes.push(probe);
        }
        Self { probes }
    }
}

impl ForceModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the obstacle probes. Directions are in the boid's local frame
    /// (x right, y up, z forward) and are tried in order.
    pub fn with_probes(directions: &[Vector3D]) -> Result<Self, ProbeError> {
        if directions.iter().any(Vector3D::is_zero) {
            return Err(ProbeError::ZeroLength);
        }
        let probes = heapless::Vec::from_slice(directions)
            .map_err(|_| ProbeError::TooMany(directions.len()))?;
        Ok(Self { probes })
    }

    pub fn probes(&self) -> &[Vector3D] {
        &self.probes
    }

    /// Drop the ids in `neighbors` that fall outside the boid's field of
    /// view. Does nothing unless `enable_field_of_view` is set.
    pub fn retain_visible(
        &self,
        boid: &BoidState,
        flock: &[BoidState],
        neighbors: &mut Vec<usize>,
        config: &FlockConfig,
    ) {
        if config.enable_field_of_view {
            neighbors.retain(|&j| behavior::in_field_of_view(boid, flock[j].position, config));
        }
    }

    /// Net steering force for `boid` given its neighbours. Reads its inputs
    /// only; `world` is consulted for obstacle avoidance when supplied.
    pub fn compute<'a, I>(
        &self,
        boid: &BoidState,
        neighbors: I,
        config: &FlockConfig,
        world: Option<&dyn WorldQuery>,
    ) -> Vector3D
    where
        I: ExactSizeIterator<Item = &'a BoidState> + Clone,
    {
        let mut force = Vector3D::zero();

        if neighbors.len() > 0 {
            if config.enable_cohesion {
                force += behavior::cohesion(boid, neighbors.clone(), config);
            }
            if config.enable_alignment {
                force += behavior::alignment(boid, neighbors.clone(), config);
            }
            if config.enable_separation {
                force += behavior::separation(boid, neighbors, config);
            }
        }

        if config.enable_destination_seeking {
            force += behavior::seek_destination(boid, config);
        }
        if config.enable_bounds_avoidance {
            force += behavior::bounds_avoidance(boid, config);
        }
        if config.enable_obstacle_avoidance {
            if let Some(world) = world {
                force += behavior::obstacle_avoidance(boid, world, &self.probes, config);
            }
        }

        force
    }
}
