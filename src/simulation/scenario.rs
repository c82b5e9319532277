//! Build a ready-to-run simulation from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a [`Scenario`]:
//! the runtime [`Simulation`] with engine toggles, parameters and the
//! initial particles handed over through the normal insertion path, plus
//! the end time the driver should run to.

use crate::configuration::config::{EngineConfig, ParametersConfig, ParticleConfig, ScenarioConfig};
use crate::error::SimulationError;
use super::barnes_hut::DEFAULT_THETA;
use super::engine::Engine;
use super::kernel::Simulation;
use super::params::Parameters;
use super::particle::Particle;
use super::vector::NVec3;

pub struct Scenario {
    pub simulation: Simulation,
    pub t_end: f64,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, SimulationError> {
        let engine = engine_from_config(&cfg.engine)?;
        let parameters = parameters_from_config(&cfg.parameters)?;
        let t_end = parameters.t_end;

        let mut simulation = Simulation::new(engine, parameters);

        // Particles: map `ParticleConfig` -> runtime `Particle`
        for (i, pc) in cfg.particles.iter().enumerate() {
            let particle = particle_from_config(pc)?;
            if let Err(e) = simulation.insert(particle) {
                log::warn!("scenario particle {} skipped: {}", i, e);
            }
        }

        log::info!(
            "scenario built: {} particles, barnes_hut={}, collide={}, box_border={}",
            simulation.particles().len() + simulation.pending().len(),
            simulation.engine.use_barnes_hut,
            simulation.engine.use_collide,
            simulation.engine.use_box_border
        );

        Ok(Self { simulation, t_end })
    }
}

fn engine_from_config(cfg: &EngineConfig) -> Result<Engine, SimulationError> {
    let theta = cfg.theta.unwrap_or(DEFAULT_THETA);
    if !(theta.is_finite() && theta >= 0.0) {
        return Err(SimulationError::InvalidConfig(format!("theta must be a non-negative number, got {theta}")));
    }
    Ok(Engine {
        use_barnes_hut: cfg.barnes_hut,
        use_collide: cfg.collide,
        use_softening: cfg.softening,
        use_box_border: cfg.box_border,
        add_instantly: cfg.add_instantly,
        use_spontaneous: cfg.spontaneous,
        draw_all_paths: cfg.draw_all_paths,
        theta,
    })
}

fn parameters_from_config(cfg: &ParametersConfig) -> Result<Parameters, SimulationError> {
    if !(cfg.h0.is_finite() && cfg.h0 > 0.0) {
        return Err(SimulationError::InvalidConfig(format!("h0 must be positive, got {}", cfg.h0)));
    }
    let half = cfg.box_half_size * cfg.scale_factor;
    if !(half.is_finite() && half > 0.0) {
        return Err(SimulationError::InvalidConfig(format!(
            "box_half_size * scale_factor must be positive, got {half}"
        )));
    }
    if !(cfg.max_velocity.is_finite() && cfg.max_velocity > 0.0) {
        return Err(SimulationError::InvalidConfig(format!(
            "max_velocity must be positive, got {}",
            cfg.max_velocity
        )));
    }
    if !(cfg.time_step.is_finite() && cfg.time_step > 0.0) {
        return Err(SimulationError::InvalidConfig(format!("time_step must be positive, got {}", cfg.time_step)));
    }
    if !(cfg.min_distance.is_finite() && cfg.min_distance >= 0.0) {
        return Err(SimulationError::InvalidConfig(format!(
            "min_distance must be a non-negative number, got {}",
            cfg.min_distance
        )));
    }
    if !(0.0..=1.0).contains(&cfg.spontaneous_rate) {
        return Err(SimulationError::InvalidConfig(format!(
            "spontaneous_rate must lie in [0, 1], got {}",
            cfg.spontaneous_rate
        )));
    }

    Ok(Parameters {
        t_end: cfg.t_end,
        h0: cfg.h0,
        time_step: cfg.time_step,
        g: cfg.g,
        k: cfg.k,
        min_distance: cfg.min_distance,
        min_hard_distance: cfg.min_hard_distance,
        softening: cfg.eps2,
        max_velocity: cfg.max_velocity,
        restitution: cfg.restitution,
        photon_reflection_limit: cfg.photon_reflection_limit,
        star_mass_threshold: Parameters::default().star_mass_threshold,
        box_half_size: cfg.box_half_size,
        scale_factor: cfg.scale_factor,
        spontaneous_rate: cfg.spontaneous_rate,
        max_path_len: cfg.max_path_len,
        seed: cfg.seed,
    })
}

fn particle_from_config(pc: &ParticleConfig) -> Result<Particle, SimulationError> {
    let mut particle = Particle::new(pc.kind, vec3(&pc.x, "x")?).with_path(pc.draw_path);

    if let Some(v) = &pc.v {
        particle = particle.with_velocity(vec3(v, "v")?);
    }
    if let Some(m) = pc.m {
        particle = particle.with_mass(m);
    }
    if let Some(q) = pc.q {
        particle = particle.with_charge(q);
    }
    if let Some(r) = pc.radius {
        particle = particle.with_radius(r);
    }

    Ok(particle)
}

fn vec3(values: &[f64], field: &str) -> Result<NVec3, SimulationError> {
    match values {
        [x, y, z] => Ok(NVec3::new(*x, *y, *z)),
        _ => Err(SimulationError::InvalidConfig(format!(
            "`{field}` needs 3 components, got {}",
            values.len()
        ))),
    }
}
