//! Collision and interaction resolution
//!
//! Two particles interact when their surfaces come closer than
//! `min_distance`. What happens depends on which side of the bulk/quantum
//! divide they sit on:
//!
//! - bulk + bulk: inelastic merge, possibly promoting a planet to a star
//! - quantum + quantum: absorption, annihilation or emission by kind pair
//! - bulk + quantum, or anything involving dark matter: nothing
//!
//! Resolution only flips `removed` flags and edits particles in place; new
//! particles go to the `spawned` list and join the simulation at the end of
//! the step.

use super::integrator::apply_velocity_cap;
use super::params::Parameters;
use super::particle::{Particle, ParticleKind};
use super::vector::{NVec3, VectorExt};

/// What a call to [`resolve`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    None,
    Merged,
    /// Merge that pushed a planet over the star threshold.
    Promoted,
    Absorbed,
    Annihilated,
    Emitted(ParticleKind),
}

/// Thresholds used during resolution.
#[derive(Debug, Clone, Copy)]
pub struct CollisionParams {
    pub min_distance: f64,
    pub min_hard_distance: f64,
    pub max_velocity: f64,
    pub star_mass_threshold: f64,
}

impl From<&Parameters> for CollisionParams {
    fn from(p: &Parameters) -> Self {
        Self {
            min_distance: p.min_distance,
            min_hard_distance: p.min_hard_distance,
            max_velocity: p.max_velocity,
            star_mass_threshold: p.star_mass_threshold,
        }
    }
}

/// Surface gap between two particles (center distance minus both radii).
pub fn gap(a: &Particle, b: &Particle) -> f64 {
    (b.position - a.position).norm() - (a.radius + b.radius)
}

/// True when the pair has a defined interaction at all, ignoring distance.
pub fn can_interact(a: &Particle, b: &Particle) -> bool {
    a.collides() && b.collides() && a.is_quantum() == b.is_quantum()
}

/// Mass and velocity of the body formed by merging `a` and `b`, before the
/// velocity cap. Momentum is conserved: `(m_a v_a + m_b v_b) / (m_a + m_b)`.
pub fn inelastic_merge(a: &Particle, b: &Particle) -> (f64, NVec3) {
    let mass = a.mass + b.mass;
    if mass == 0.0 {
        return (0.0, (a.velocity + b.velocity) * 0.5);
    }
    let velocity = a.velocity * (a.mass / mass) + b.velocity * (b.mass / mass);
    (mass, velocity)
}

/// Resolve a possible interaction between particles `i` and `j`.
///
/// Removed particles, pairs without a defined interaction and pairs that are
/// not in contact are left alone and yield [`Interaction::None`].
///
/// # Panics
/// If `i == j` or either index is out of bounds.
pub fn resolve(particles: &mut [Particle], i: usize, j: usize, params: &CollisionParams, spawned: &mut Vec<Particle>) -> Interaction {
    let (a, b) = pair_mut(particles, i, j);

    if a.removed || b.removed || !can_interact(a, b) {
        return Interaction::None;
    }
    if gap(a, b) >= params.min_distance {
        return Interaction::None;
    }

    if a.is_quantum() {
        resolve_quantum(a, b, params, spawned)
    } else {
        merge_bulk(a, b, params, spawned)
    }
}

fn merge_bulk(a: &mut Particle, b: &mut Particle, params: &CollisionParams, spawned: &mut Vec<Particle>) -> Interaction {
    let (heavy, light) = if a.mass >= b.mass { (a, b) } else { (b, a) };

    let (mass, velocity) = inelastic_merge(heavy, light);
    let charge = heavy.charge + light.charge;
    light.remove();

    if heavy.kind == ParticleKind::Planet && mass >= params.star_mass_threshold {
        let mut star = Particle::new(ParticleKind::Star, heavy.position)
            .with_mass(mass)
            .with_charge(charge)
            .with_velocity(velocity)
            .with_path(heavy.draw_path);
        apply_velocity_cap(&mut star, params.max_velocity);
        heavy.remove();
        spawned.push(star);
        return Interaction::Promoted;
    }

    if heavy.kind == ParticleKind::Planet {
        // volumes add up
        heavy.radius = (heavy.radius.powi(3) + light.radius.powi(3)).cbrt();
    }
    heavy.set_mass(mass);
    heavy.charge = charge;
    heavy.velocity = velocity;
    apply_velocity_cap(heavy, params.max_velocity);

    Interaction::Merged
}

fn resolve_quantum(a: &mut Particle, b: &mut Particle, params: &CollisionParams, spawned: &mut Vec<Particle>) -> Interaction {
    use ParticleKind::*;

    // separation before anything moves, a -> b
    let separation = b.position - a.position;

    match (a.kind, b.kind) {
        (Photon, Photon) => Interaction::None,
        (Photon, _) if b.charge != 0.0 => absorb(b, a, params),
        (_, Photon) if a.charge != 0.0 => absorb(a, b, params),
        (Electron, Positron) | (Positron, Electron) => annihilate(a, b, &separation, params, spawned),
        (Electron, _) if b.charge != 0.0 => emit_photon(a, &separation, params, spawned),
        (_, Electron) if a.charge != 0.0 => emit_photon(b, &-separation, params, spawned),
        (x, y) if x.is_hadron() && y.is_hadron() => {
            if gap(a, b) >= params.min_hard_distance {
                return Interaction::None;
            }
            emit_gluon(a, b, &separation, params, spawned)
        }
        (Gluon, y) if y.is_hadron() => absorb(b, a, params),
        (x, Gluon) if x.is_hadron() => absorb(a, b, params),
        _ => Interaction::None,
    }
}

/// `absorber` takes over the velocity of `quantum`, which disappears.
fn absorb(absorber: &mut Particle, quantum: &mut Particle, params: &CollisionParams) -> Interaction {
    absorber.velocity += quantum.velocity;
    apply_velocity_cap(absorber, params.max_velocity);
    quantum.remove();
    Interaction::Absorbed
}

/// Electron/positron pair turns into two photons leaving the midpoint in
/// opposite directions, perpendicular to the separation.
fn annihilate(a: &mut Particle, b: &mut Particle, separation: &NVec3, params: &CollisionParams, spawned: &mut Vec<Particle>) -> Interaction {
    let midpoint = (a.position + b.position) * 0.5;

    let mut direction = separation.orthogonal();
    if direction.norm_squared() == 0.0 {
        // coincident pair, any direction will do
        direction = NVec3::x();
    }
    direction.normalize_safe();
    let velocity = direction * params.max_velocity;

    spawned.push(Particle::new(ParticleKind::Photon, midpoint).with_velocity(velocity));
    spawned.push(Particle::new(ParticleKind::Photon, midpoint).with_velocity(-velocity));

    a.remove();
    b.remove();
    Interaction::Annihilated
}

/// Electron passing a charged particle radiates a photon towards it.
/// The photon starts clear of the electron's own contact range.
fn emit_photon(electron: &Particle, separation: &NVec3, params: &CollisionParams, spawned: &mut Vec<Particle>) -> Interaction {
    let mut direction = *separation;
    if direction.norm_squared() == 0.0 {
        return Interaction::None;
    }
    direction.normalize_safe();

    let position = electron.position + direction * (2.0 * params.min_distance);
    spawned.push(Particle::new(ParticleKind::Photon, position).with_velocity(direction * params.max_velocity));
    Interaction::Emitted(ParticleKind::Photon)
}

/// Two hadrons at hard-contact range exchange a gluon.
fn emit_gluon(a: &Particle, b: &Particle, separation: &NVec3, params: &CollisionParams, spawned: &mut Vec<Particle>) -> Interaction {
    let mut direction = *separation;
    if direction.norm_squared() == 0.0 {
        return Interaction::None;
    }
    direction.normalize_safe();

    let midpoint = (a.position + b.position) * 0.5;
    spawned.push(Particle::new(ParticleKind::Gluon, midpoint).with_velocity(direction * params.max_velocity));
    Interaction::Emitted(ParticleKind::Gluon)
}

/// Two distinct mutable particles out of one slice.
fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    assert_ne!(i, j, "a particle cannot interact with itself");
    if i < j {
        let (left, right) = particles.split_at_mut(j);
        (&mut left[i], &mut right[0])
    } else {
        let (left, right) = particles.split_at_mut(i);
        (&mut right[0], &mut left[j])
    }
}
