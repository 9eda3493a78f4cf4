#![cfg_attr(not(feature = "std"), no_std)]

//! Data model shared between the flock core and whatever hosts it:
//! configuration, per-boid transform updates and status reports.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A 3D point in world coordinates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Position3 {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Position3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Calculate distance to another position
    pub fn distance_to(&self, other: &Position3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        libm::sqrtf(dx * dx + dy * dy + dz * dz)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// What happens to a boid that leaves the world extents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// Re-enter from the opposite edge
    #[default]
    Wrap,
    /// Hard stop at the edge, velocity is left alone
    #[serde(alias = "collide")]
    Clamp,
}

/// Role of a boid within the flock. Leaders weigh more in their
/// neighbours' averages, outcasts push their neighbours away.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoidRole {
    #[default]
    Follower,
    Leader,
    Outcast,
}

/// Rejected configuration values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("`{0}` must be a finite number")]
    NotFinite(&'static str),
    #[error("`{0}` must not be negative")]
    Negative(&'static str),
    #[error("`{0}` must be greater than zero")]
    NotPositive(&'static str),
    #[error("`min_speed` must not exceed `max_speed`")]
    SpeedRange,
}

/// Flock tunables. Immutable for the duration of a tick, may be replaced
/// between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    // World
    pub world_extents: Position3,
    pub boundary: BoundaryMode,
    pub target_population: usize,
    pub seed: Option<u64>,

    // Boids
    pub boid_speed: f32,
    /// Floor applied after the `max_speed` clamp; zero disables it
    pub min_speed: f32,
    pub max_speed: f32,
    pub sight_radius: f32,
    /// Half-angle in degrees around the heading within which neighbours are
    /// seen, when `enable_field_of_view` is set
    pub fov_angle: f32,
    /// Caps how many neighbours feed the cohesion and alignment averages
    pub max_neighbors: Option<usize>,
    pub maximum_leaders: usize,
    pub maximum_outcasts: usize,

    // Behaviour switches
    pub enable_cohesion: bool,
    pub enable_cohesion_falloff: bool,
    pub enable_separation: bool,
    pub enable_alignment: bool,
    pub enable_leaders: bool,
    pub enable_outcasts: bool,
    pub enable_destination_seeking: bool,
    pub enable_bounds_avoidance: bool,
    pub enable_obstacle_avoidance: bool,
    pub enable_field_of_view: bool,

    // Strengths
    pub cohesion_strength: f32,
    pub cohesion_falloff_strength: f32,
    pub separation_strength: f32,
    pub alignment_strength: f32,
    pub leader_strength: f32,
    pub outcast_strength: f32,
    pub destination_strength: f32,
    pub bounds_avoidance_strength: f32,
    pub obstacle_avoidance_strength: f32,

    // Steering
    pub max_steering_force: f32,
    pub arrival_radius: f32,
    pub bounds_center: Position3,
    pub bounds_radius: f32,
    pub obstacle_probe_distance: f32,
    pub obstacle_layer_mask: u32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            world_extents: Position3::new(100.0, 100.0, 0.0),
            boundary: BoundaryMode::Wrap,
            target_population: 10,
            seed: None,

            boid_speed: 20.0,
            min_speed: 0.0,
            max_speed: 100.0,
            sight_radius: 10.0,
            fov_angle: 120.0,
            max_neighbors: None,
            maximum_leaders: 15,
            maximum_outcasts: 15,

            enable_cohesion: true,
            enable_cohesion_falloff: false,
            enable_separation: true,
            enable_alignment: true,
            enable_leaders: false,
            enable_outcasts: false,
            enable_destination_seeking: false,
            enable_bounds_avoidance: false,
            enable_obstacle_avoidance: false,
            enable_field_of_view: false,

            cohesion_strength: 1.0,
            cohesion_falloff_strength: 0.5,
            separation_strength: 1.0,
            alignment_strength: 1.0,
            leader_strength: 1.0,
            outcast_strength: 1.0,
            destination_strength: 2.0,
            bounds_avoidance_strength: 10.0,
            obstacle_avoidance_strength: 20.0,

            max_steering_force: 8.0,
            arrival_radius: 1.0,
            bounds_center: Position3::new(50.0, 50.0, 0.0),
            bounds_radius: 20.0,
            obstacle_probe_distance: 10.0,
            obstacle_layer_mask: u32::MAX,
        }
    }
}

impl FlockConfig {
    /// Check every numeric tunable. Strength weights may be negative
    /// (an inverted behaviour is still a behaviour); distances and speeds
    /// may not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.world_extents.is_finite() {
            return Err(ConfigError::NotFinite("world_extents"));
        }
        if !self.bounds_center.is_finite() {
            return Err(ConfigError::NotFinite("bounds_center"));
        }

        let strengths = [
            ("cohesion_strength", self.cohesion_strength),
            ("cohesion_falloff_strength", self.cohesion_falloff_strength),
            ("separation_strength", self.separation_strength),
            ("alignment_strength", self.alignment_strength),
            ("leader_strength", self.leader_strength),
            ("outcast_strength", self.outcast_strength),
            ("destination_strength", self.destination_strength),
            ("bounds_avoidance_strength", self.bounds_avoidance_strength),
            ("obstacle_avoidance_strength", self.obstacle_avoidance_strength),
        ];
        for (name, value) in strengths {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite(name));
            }
        }

        let distances = [
            ("boid_speed", self.boid_speed),
            ("min_speed", self.min_speed),
            ("fov_angle", self.fov_angle),
            ("sight_radius", self.sight_radius),
            ("max_steering_force", self.max_steering_force),
            ("arrival_radius", self.arrival_radius),
            ("bounds_radius", self.bounds_radius),
            ("obstacle_probe_distance", self.obstacle_probe_distance),
        ];
        for (name, value) in distances {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite(name));
            }
            if value < 0.0 {
                return Err(ConfigError::Negative(name));
            }
        }

        if !self.max_speed.is_finite() {
            return Err(ConfigError::NotFinite("max_speed"));
        }
        if self.max_speed <= 0.0 {
            return Err(ConfigError::NotPositive("max_speed"));
        }
        if self.min_speed > self.max_speed {
            return Err(ConfigError::SpeedRange);
        }
        if self.max_neighbors == Some(0) {
            return Err(ConfigError::NotPositive("max_neighbors"));
        }

        Ok(())
    }

    /// Parse a (possibly partial) JSON document; missing fields keep their defaults
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[cfg(feature = "std")]
    pub fn to_json_pretty(&self) -> Result<std::string::String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Settings replacement message, applied between ticks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub config: FlockConfig,
}

/// Resulting placement of one boid after a tick, for whatever renders it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TransformUpdate {
    pub id: usize,
    pub position: Position3,
    /// Facing angle in radians
    pub orientation: f32,
    pub role: BoidRole,
}

/// Snapshot of the flock population
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FlockStatus {
    pub tick: u64,
    pub boid_count: usize,
    pub leader_count: usize,
    pub outcast_count: usize,
}
