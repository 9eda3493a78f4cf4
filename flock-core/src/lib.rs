#![cfg_attr(not(feature = "std"), no_std)]

//! Boid flocking and grid pathfinding.
//!
//! The flocking half is built from small pieces that can be used on their
//! own: a [`SpatialIndex`] answers neighbour queries, the [`ForceModel`]
//! turns a neighbourhood into a steering force, and the [`Integrator`]
//! applies it. [`FlockSimulation`] (requires `std`) ties them together into
//! a fixed-step tick loop.
//!
//! The [`pathfinding`] module is independent: A* over a [`Graph`] of points.

extern crate alloc;

pub mod behavior;
mod boid;
mod force;
mod integrator;
mod math;
pub mod pathfinding;
#[cfg(feature = "std")]
mod simulation;
mod spatial;
mod vector;
mod world;

pub use boid::BoidState;
pub use force::{ForceModel, ProbeError, MAX_PROBES};
pub use integrator::{facing_angle, Integrator};
pub use pathfinding::{find_path, AStar, Graph, NodeId, PathNode};
#[cfg(feature = "std")]
pub use simulation::{FlockSimulation, PopulationChange};
pub use spatial::{IndexError, LinearIndex, SpatialIndex, UniformGridIndex};
pub use vector::Vector3D;
pub use world::{
    NoObstacles, NullSink, RayHit, SphereObstacle, SphereObstacles, TransformSink, WorldQuery,
};

pub use flock_shared::{
    BoidRole, BoundaryMode, ConfigError, FlockConfig, FlockStatus, Position3, SettingsUpdate,
    TransformUpdate,
};
