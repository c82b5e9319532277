//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds runtime settings:
//! - step size, end time and time scale (`h0`, `t_end`, `time_step`),
//! - force constants and distance thresholds (`g`, `k`, `min_distance`, ...),
//! - velocity cap, restitution and photon bounce limit,
//! - box geometry (`box_half_size`, `scale_factor`),
//! - spontaneous pair creation rate and random seed

use super::particle::STAR_MASS_THRESHOLD;

#[derive(Debug, Clone)]
pub struct Parameters {
    pub t_end: f64, // time end
    pub h0: f64, // step size
    pub time_step: f64, // time scale applied on top of h0
    pub g: f64, // gravitational constant
    pub k: f64, // coulomb constant
    pub min_distance: f64, // distance floor and contact threshold
    pub min_hard_distance: f64, // contact threshold for hadron/hadron gluon emission
    pub softening: f64, // softening epsilon^2
    pub max_velocity: f64, // speed of light
    pub restitution: f64, // fraction of velocity kept after a wall bounce
    pub photon_reflection_limit: u32, // bounces before a photon is retired
    pub star_mass_threshold: f64, // planet -> star promotion
    pub box_half_size: f64, // half edge of the simulated cube at scale 1
    pub scale_factor: f64, // multiplies box_half_size
    pub spontaneous_rate: f64, // chance per step of an electron/positron pair
    pub max_path_len: usize, // trail length
    pub seed: u64, // deterministic seed
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            t_end: 10.0,
            h0: 0.1,
            time_step: 1.0,
            g: 0.1,
            k: 10.0,
            min_distance: 1.0,
            min_hard_distance: 0.25,
            softening: 0.1,
            max_velocity: 10.0,
            restitution: 0.1,
            photon_reflection_limit: 3,
            star_mass_threshold: STAR_MASS_THRESHOLD,
            box_half_size: 100.0,
            scale_factor: 1.0,
            spontaneous_rate: 0.01,
            max_path_len: 256,
            seed: 42,
        }
    }
}

impl Parameters {
    /// Time advanced by one step: `h0 * time_step`.
    pub fn step_dt(&self) -> f64 {
        self.h0 * self.time_step
    }
}
