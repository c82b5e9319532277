//! Fixed-step integration for the particle kernel
//!
//! One step for one particle:
//! 1. velocity update from the accumulated force (massless particles only
//!    change direction and always travel at `max_velocity`),
//! 2. soft velocity cap for massive particles,
//! 3. position update, bouncing off the bounding box when it is active.

use super::bounding_box::BoundingBox;
use super::params::Parameters;
use super::particle::{Particle, ParticleKind};
use super::vector::{NVec3, VectorExt};

/// Upper bound on wall hits handled within one step.
const MAX_BOUNCES: u32 = 32;

/// Soft relativistic-style cap: `|v| -> max · tanh(|v| / max)`, direction kept.
pub fn soft_cap(velocity: &NVec3, max_velocity: f64) -> NVec3 {
    let speed = velocity.norm();
    if speed == 0.0 || max_velocity <= 0.0 {
        return *velocity;
    }
    *velocity * (max_velocity * (speed / max_velocity).tanh() / speed)
}

/// Cap the particle's velocity according to its kind of motion: massless
/// particles move at exactly `max_velocity`, massive ones get [`soft_cap`].
pub fn apply_velocity_cap(p: &mut Particle, max_velocity: f64) {
    if p.is_massless() {
        p.velocity.normalize_safe();
        p.velocity *= max_velocity;
    } else {
        p.velocity = soft_cap(&p.velocity, max_velocity);
    }
}

/// Velocity update from the force accumulated this step.
pub fn integrate_velocity(p: &mut Particle, params: &Parameters) {
    if p.is_massless() {
        p.velocity += p.force;
    } else {
        let dt = params.step_dt();
        let force = p.force;
        p.velocity.scale_add(&force, dt / p.mass);
    }
    apply_velocity_cap(p, params.max_velocity);
}

/// Move `p` by `displacement`, reflecting off the faces of `bbox`.
///
/// Each wall hit moves the particle onto the wall, mirrors the remaining
/// displacement and the velocity across the wall normal and scales both by
/// `restitution`. Returns the number of hits. The final position is always
/// inside the box, whatever the displacement length.
pub fn reflect_in_box(p: &mut Particle, displacement: NVec3, bbox: &BoundingBox, restitution: f64) -> u32 {
    let mut remaining = displacement;
    let mut position = bbox.clamp(&p.position);
    let mut bounces = 0;

    while remaining.norm_squared() > 0.0 && bounces < MAX_BOUNCES {
        match bbox.intersect_segment(&position, &remaining) {
            None => {
                position += remaining;
                break;
            }
            Some(hit) => {
                position = hit.point;
                remaining *= 1.0 - hit.t;
                remaining.reflect(&hit.normal, 1.0);
                remaining *= restitution;
                p.velocity.reflect(&hit.normal, 1.0);
                p.velocity *= restitution;
                bounces += 1;
            }
        }
    }

    p.position = bbox.clamp(&position);
    bounces
}

/// Advance one particle through a full step after forces are known.
///
/// `bbox` is `None` when the box border is disabled and particles fly
/// freely. Photons that exceed the bounce limit are removed.
pub fn advance(p: &mut Particle, bbox: Option<&BoundingBox>, params: &Parameters) {
    integrate_velocity(p, params);

    let displacement = p.velocity * params.step_dt();
    match bbox {
        Some(bbox) => {
            let bounces = reflect_in_box(p, displacement, bbox, params.restitution);
            if bounces > 0 && p.kind == ParticleKind::Photon {
                p.reflections += bounces;
                if p.reflections > params.photon_reflection_limit {
                    p.remove();
                }
            }
        }
        None => p.position += displacement,
    }
}

/// Append the current position to the particle's trail, dropping the oldest
/// points beyond `max_len`.
pub fn record_path(p: &mut Particle, max_len: usize) {
    p.path.push(p.position);
    if p.path.len() > max_len {
        let excess = p.path.len() - max_len;
        p.path.drain(..excess);
    }
}
