//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario. A scenario consists of:
//!
//! - [`EngineConfig`]     – kernel toggles (Barnes–Hut, collisions, softening, box, ...)
//! - [`ParametersConfig`] – numerical parameters and physical constants
//! - [`ParticleConfig`]   – initial state for each particle
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! Every section and almost every field is optional; missing values fall
//! back to the kernel defaults.
//!
//! # YAML format
//! An example scenario matching these types:
//!
//! ```yaml
//! engine:
//!   barnes_hut: true        # false -> exact pairwise forces
//!   theta: 0.5
//!   collide: true
//!   softening: false
//!   box_border: true        # false -> particles fly freely
//!   add_instantly: false    # false -> insertions wait for the next step
//!   spontaneous: false      # random electron/positron pair creation
//!   draw_all_paths: false
//!
//! parameters:
//!   t_end: 10.0             # total simulation time
//!   h0: 0.1                 # step size
//!   time_step: 1.0          # time scale on top of h0
//!   G: 0.1                  # gravitational constant
//!   K: 10.0                 # coulomb constant
//!   min_distance: 1.0
//!   min_hard_distance: 0.25
//!   eps2: 0.1               # softening epsilon^2
//!   max_velocity: 10.0
//!   box_half_size: 100.0
//!   seed: 42
//!
//! particles:
//!   - kind: star
//!     x: [ -50.0, 0.0, 0.0 ]
//!     m: 10.0
//!   - kind: electron
//!     x: [ 10.0, 0.0, 0.0 ]
//!     v: [ 0.0, 1.0, 0.0 ]
//! ```
//!
//! The kernel maps this configuration into its own runtime types, see
//! [`crate::simulation::scenario`].

use serde::Deserialize;

use crate::simulation::barnes_hut::DEFAULT_THETA;
use crate::simulation::params::Parameters;
use crate::simulation::particle::ParticleKind;

/// Kernel toggles, each independently settable
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub barnes_hut: bool, // `true` - tree approximation, `false` - direct N^2 summation
    pub theta: Option<f64>, // opening angle, smaller is more accurate
    pub collide: bool, // collision detection and resolution
    pub softening: bool, // softened force denominator
    pub box_border: bool, // bounce off the box instead of flying freely
    pub add_instantly: bool, // insertion policy
    pub spontaneous: bool, // spontaneous electron/positron pairs
    pub draw_all_paths: bool, // trail recording for every particle
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            barnes_hut: true,
            theta: Some(DEFAULT_THETA),
            collide: true,
            softening: false,
            box_border: true,
            add_instantly: false,
            spontaneous: false,
            draw_all_paths: false,
        }
    }
}

/// Global numerical and physical parameters for a scenario
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ParametersConfig {
    pub t_end: f64, // time end
    pub h0: f64, // time step size
    pub time_step: f64, // time scale
    #[serde(rename = "G")]
    pub g: f64, // gravitational constant
    #[serde(rename = "K")]
    pub k: f64, // coulomb constant
    pub min_distance: f64, // distance floor / contact threshold
    pub min_hard_distance: f64, // hadron contact threshold
    pub eps2: f64, // softening - prevent singular forces at very small separations
    pub max_velocity: f64, // velocity cap
    pub restitution: f64, // fraction of velocity kept after a bounce
    pub photon_reflection_limit: u32, // bounces before a photon disappears
    pub box_half_size: f64, // half edge of the simulated cube
    pub scale_factor: f64, // box scale
    pub spontaneous_rate: f64, // pair creation chance per step
    pub max_path_len: usize, // trail length
    pub seed: u64, // deterministic seed to make runs reproducable
}

impl Default for ParametersConfig {
    fn default() -> Self {
        let p = Parameters::default();
        Self {
            t_end: p.t_end,
            h0: p.h0,
            time_step: p.time_step,
            g: p.g,
            k: p.k,
            min_distance: p.min_distance,
            min_hard_distance: p.min_hard_distance,
            eps2: p.softening,
            max_velocity: p.max_velocity,
            restitution: p.restitution,
            photon_reflection_limit: p.photon_reflection_limit,
            box_half_size: p.box_half_size,
            scale_factor: p.scale_factor,
            spontaneous_rate: p.spontaneous_rate,
            max_path_len: p.max_path_len,
            seed: p.seed,
        }
    }
}

/// Configuration for a single particle's initial state.
/// Mass, charge and radius default to the kind's own values.
#[derive(Deserialize, Debug, Clone)]
pub struct ParticleConfig {
    pub kind: ParticleKind,
    pub x: Vec<f64>, // initial position
    #[serde(default)]
    pub v: Option<Vec<f64>>, // initial velocity, at rest when absent
    #[serde(default)]
    pub m: Option<f64>,
    #[serde(default)]
    pub q: Option<f64>,
    #[serde(default)]
    pub radius: Option<f64>,
    #[serde(default)]
    pub draw_path: bool,
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig, // kernel toggles
    #[serde(default)]
    pub parameters: ParametersConfig, // global numerical and physical parameters
    #[serde(default)]
    pub particles: Vec<ParticleConfig>, // initial particle population
}
