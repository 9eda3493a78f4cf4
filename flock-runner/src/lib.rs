//! Headless driver for `flock-core`: config loading with hot reload, ASCII
//! grid maps for pathfinding, and a JSON lines transform sink.

pub mod config;
pub mod map;
pub mod sink;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use flock_core::{
    FlockSimulation, FlockStatus, SettingsUpdate, SphereObstacles, Vector3D, WorldQuery,
};

pub use config::{load_config, ConfigWatcher};
pub use map::{parse_point, GridMap, MapError};
pub use sink::JsonLinesSink;

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub ticks: u64,
    pub dt: f32,
    pub seed: Option<u64>,
    pub watch: bool,
    pub emit: bool,
    pub obstacles: Vec<(f32, f32, f32)>,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            ticks: 600,
            dt: 1.0 / 60.0,
            seed: None,
            watch: false,
            emit: false,
            obstacles: Vec::new(),
        }
    }
}

/// Parse an obstacle given as `x,y,radius`
pub fn parse_obstacle(s: &str) -> Result<(f32, f32, f32), MapError> {
    let invalid = || MapError::InvalidObstacle(s.to_string());
    let mut parts = s.split(',').map(|p| p.trim().parse::<f32>());
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(r)), None) if r > 0.0 => Ok((x, y, r)),
        _ => Err(invalid()),
    }
}

/// Run a flock for `options.ticks` steps. Transforms are written to `out`
/// as JSON lines when `options.emit` is set.
pub fn simulate<W: Write>(config_path: &Path, options: &SimulateOptions, out: W) -> Result<FlockStatus> {
    let mut config = load_config(config_path)?;
    if options.seed.is_some() {
        config.seed = options.seed;
    }

    let mut watcher = ConfigWatcher::new(config_path);
    let mut sim = FlockSimulation::new(config).context("Invalid flock configuration")?;

    let world = options
        .obstacles
        .iter()
        .fold(SphereObstacles::new(), |world, &(x, y, r)| {
            world.with_sphere(Vector3D::planar(x, y), r, 1)
        });
    let world: Option<&dyn WorldQuery> = if world.obstacles.is_empty() {
        None
    } else {
        Some(&world)
    };

    let mut sink = JsonLinesSink::new(out);
    log::info!(
        "Simulating {} boids for {} ticks (dt = {})",
        sim.config().target_population,
        options.ticks,
        options.dt
    );

    for _ in 0..options.ticks {
        if options.watch {
            if let Some(mut config) = watcher.poll() {
                config.seed = sim.config().seed;
                match sim.apply_settings(SettingsUpdate { config }) {
                    Ok(()) => log::info!("Reloaded {}", config_path.display()),
                    Err(e) => log::warn!("Keeping previous config: {}", e),
                }
            }
        }

        if options.emit {
            sim.tick_with(options.dt, world, &mut sink);
        } else {
            sim.tick_with(options.dt, world, &mut flock_core::NullSink);
        }
    }

    sink.finish().context("Failed to write transforms")?;

    let status = sim.status();
    log::info!(
        "Finished after {} ticks: {} boids, {} leaders, {} outcasts",
        status.tick,
        status.boid_count,
        status.leader_count,
        status.outcast_count
    );
    Ok(status)
}

/// Shortest path across a map file, as grid cells from `from` (exclusive) to
/// `to` (inclusive). `None` when `to` cannot be reached.
pub fn find_route(
    map: &GridMap,
    from: (usize, usize),
    to: (usize, usize),
    diagonal: bool,
) -> Result<Option<Vec<(usize, usize)>>> {
    let graph = map.to_graph(diagonal);
    let start = graph
        .node_at(from.0, from.1)
        .with_context(|| format!("Start {},{} is outside the map", from.0, from.1))?;
    let goal = graph
        .node_at(to.0, to.1)
        .with_context(|| format!("Goal {},{} is outside the map", to.0, to.1))?;

    Ok(flock_core::find_path(&graph, start, goal)
        .map(|path| path.into_iter().map(|id| map.cell_of(id)).collect()))
}
