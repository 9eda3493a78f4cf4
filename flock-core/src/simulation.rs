use std::f32::consts::TAU;
use std::vec::Vec;

use flock_shared::{BoidRole, ConfigError, FlockConfig, FlockStatus, SettingsUpdate, TransformUpdate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::boid::BoidState;
use crate::force::ForceModel;
use crate::integrator::Integrator;
use crate::math;
use crate::spatial::{LinearIndex, SpatialIndex};
use crate::vector::Vector3D;
use crate::world::{NullSink, TransformSink, WorldQuery};

/// Outcome of bringing the flock to its target size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulationChange {
    pub spawned: usize,
    pub despawned: usize,
}

/// Owns a flock and advances it one fixed step at a time.
///
/// Every tick first computes all steering forces from the pre-tick state,
/// then integrates every boid, so the result does not depend on the order in
/// which boids are stored.
pub struct FlockSimulation<I: SpatialIndex = LinearIndex> {
    boids: Vec<BoidState>,
    config: FlockConfig,
    index: I,
    model: ForceModel,
    rng: StdRng,
    tick: u64,
    // per-tick buffers
    positions: Vec<Vector3D>,
    neighbors: Vec<usize>,
    forces: Vec<Vector3D>,
}

impl FlockSimulation<LinearIndex> {
    pub fn new(config: FlockConfig) -> Result<Self, ConfigError> {
        Self::with_index(config, LinearIndex::new())
    }
}

impl<I: SpatialIndex> FlockSimulation<I> {
    pub fn with_index(config: FlockConfig, index: I) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            boids: Vec::new(),
            config,
            index,
            model: ForceModel::default(),
            rng,
            tick: 0,
            positions: Vec::new(),
            neighbors: Vec::new(),
            forces: Vec::new(),
        })
    }

    pub fn with_force_model(mut self, model: ForceModel) -> Self {
        self.model = model;
        self
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    /// Swap in new tunables between ticks. An invalid config is rejected and
    /// the current one stays in effect.
    pub fn set_config(&mut self, config: FlockConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if config.max_speed != self.config.max_speed {
            for boid in &mut self.boids {
                boid.max_speed = config.max_speed;
            }
        }
        self.config = config;
        Ok(())
    }

    pub fn apply_settings(&mut self, update: SettingsUpdate) -> Result<(), ConfigError> {
        self.set_config(update.config)
    }

    pub fn boids(&self) -> &[BoidState] {
        &self.boids
    }

    pub fn boid_mut(&mut self, id: usize) -> Option<&mut BoidState> {
        self.boids.get_mut(id)
    }

    /// Add a boid as-is; it takes part from the next tick
    pub fn insert_boid(&mut self, boid: BoidState) -> usize {
        self.boids.push(boid);
        self.boids.len() - 1
    }

    pub fn set_destination(&mut self, id: usize, destination: Option<Vector3D>) -> bool {
        match self.boids.get_mut(id) {
            Some(boid) => {
                boid.set_destination(destination);
                true
            }
            None => false,
        }
    }

    pub fn leader_count(&self) -> usize {
        self.boids.iter().filter(|b| b.is_leader()).count()
    }

    pub fn outcast_count(&self) -> usize {
        self.boids.iter().filter(|b| b.is_outcast()).count()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn status(&self) -> FlockStatus {
        FlockStatus {
            tick: self.tick,
            boid_count: self.boids.len(),
            leader_count: self.leader_count(),
            outcast_count: self.outcast_count(),
        }
    }

    pub fn transforms(&self) -> impl Iterator<Item = TransformUpdate> + '_ {
        self.boids
            .iter()
            .enumerate()
            .map(|(id, boid)| boid.transform(id))
    }

    /// Spawn or despawn (from the tail) until the flock matches
    /// `target_population`
    pub fn reconcile_population(&mut self) -> PopulationChange {
        let target = self.config.target_population;
        let current = self.boids.len();

        if current > target {
            self.boids.truncate(target);
            let despawned = current - target;
            log::debug!("despawned {} boids", despawned);
            return PopulationChange {
                spawned: 0,
                despawned,
            };
        }

        let missing = target - current;
        if missing == 0 {
            return PopulationChange::default();
        }

        let mut leaders = self.leader_count();
        let mut outcasts = self.outcast_count();
        self.boids.reserve(missing);
        for _ in 0..missing {
            let mut boid = self.spawn_boid();
            boid.role = self.draw_role(leaders, outcasts);
            match boid.role {
                BoidRole::Leader => leaders += 1,
                BoidRole::Outcast => outcasts += 1,
                BoidRole::Follower => {}
            }
            self.boids.push(boid);
        }

        log::debug!(
            "spawned {} boids ({} leaders, {} outcasts in flock)",
            missing,
            leaders,
            outcasts
        );
        PopulationChange {
            spawned: missing,
            despawned: 0,
        }
    }

    fn spawn_boid(&mut self) -> BoidState {
        let extents = Vector3D::from(self.config.world_extents);
        let position = Vector3D::new(
            spawn_coordinate(&mut self.rng, extents.x),
            spawn_coordinate(&mut self.rng, extents.y),
            spawn_coordinate(&mut self.rng, extents.z),
        );
        let heading: f32 = self.rng.gen_range(0.0..TAU);
        let (sin, cos) = math::sin_cos(heading);
        let velocity = Vector3D::planar(cos, sin) * self.config.boid_speed;

        let mut boid = BoidState::new(position, velocity, self.config.max_speed);
        if !velocity.is_zero() {
            boid.orientation = crate::integrator::facing_angle(velocity);
        }
        boid
    }

    /// Independent coin flips for leader then outcast, each only while its
    /// cap has room. An outcast draw replaces a leader draw.
    fn draw_role(&mut self, leaders: usize, outcasts: usize) -> BoidRole {
        let mut role = BoidRole::Follower;
        if self.config.enable_leaders
            && leaders < self.config.maximum_leaders
            && self.rng.gen_bool(0.5)
        {
            role = BoidRole::Leader;
        }
        if self.config.enable_outcasts
            && outcasts < self.config.maximum_outcasts
            && self.rng.gen_bool(0.5)
        {
            role = BoidRole::Outcast;
        }
        role
    }

    pub fn tick(&mut self, dt: f32) {
        self.tick_with(dt, None, &mut NullSink);
    }

    /// One full step: reconcile the population, compute every boid's force
    /// from the current snapshot, integrate, then publish transforms.
    pub fn tick_with(
        &mut self,
        dt: f32,
        world: Option<&dyn WorldQuery>,
        sink: &mut dyn TransformSink,
    ) {
        if !dt.is_finite() || dt < 0.0 {
            log::warn!("ignoring tick with invalid dt {}", dt);
            return;
        }

        self.reconcile_population();

        self.positions.clear();
        self.positions.extend(self.boids.iter().map(|b| b.position));
        self.index.rebuild(&self.positions);

        self.forces.clear();
        for (i, boid) in self.boids.iter().enumerate() {
            self.index
                .query(boid.position, self.config.sight_radius, Some(i), &mut self.neighbors);
            self.model
                .retain_visible(boid, &self.boids, &mut self.neighbors, &self.config);
            let flock = &self.boids;
            let neighbors = self.neighbors.iter().map(|&j| &flock[j]);
            self.forces
                .push(self.model.compute(boid, neighbors, &self.config, world));
        }

        for (boid, force) in self.boids.iter_mut().zip(&self.forces) {
            boid.apply_force(*force);
            Integrator::advance(boid, dt, &self.config);

            if let Some(destination) = boid.pending_destination() {
                if boid.position.distance(&destination) <= self.config.arrival_radius {
                    boid.has_reached_destination = true;
                }
            }
        }

        self.tick += 1;

        for (id, boid) in self.boids.iter().enumerate() {
            sink.publish(boid.transform(id));
        }
    }
}

/// Uniform position along one axis, one unit clear of either edge when the
/// world is wide enough
fn spawn_coordinate(rng: &mut StdRng, extent: f32) -> f32 {
    if extent > 2.0 {
        rng.gen_range(1.0..extent - 1.0)
    } else if extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}
