//! The simulation kernel
//!
//! [`Simulation::step`] runs the whole per-step pipeline synchronously:
//!
//! 1. flush particles queued by deferred insertion,
//! 2. optional spontaneous electron/positron pair creation,
//! 3. contact pass: resolve collisions, using the octree only to find
//!    neighbours in Barnes–Hut mode,
//! 4. force pass over the survivors (tree walk over a tree rebuilt without
//!    the removed particles, or exact pairwise); any non-finite force aborts
//!    the step,
//! 5. integrate velocities and positions, bouncing off the box,
//! 6. record trails, drop removed particles, add particles spawned this step
//!    and rebuild the tree over the compacted list.
//!
//! A particle removed by a collision never acts as a force source, not even
//! inside a far-field aggregate. Between steps the tree is only extended by
//! immediate insertion.

use std::ops::ControlFlow;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::SimulationError;
use super::barnes_hut::{enclosing_cube, Source, SpatialTree};
use super::bounding_box::BoundingBox;
use super::collision::{self, CollisionParams, Interaction};
use super::engine::Engine;
use super::forces::{Coulomb, ForceSet, NewtonianGravity, PointSource};
use super::integrator::{advance, record_path};
use super::params::Parameters;
use super::particle::{Particle, ParticleKind};
use super::vector::{NVec3, VectorExt};

pub struct Simulation {
    pub engine: Engine,
    pub params: Parameters,
    particles: Vec<Particle>,
    pending: Vec<Particle>, // deferred insertions
    spawned: Vec<Particle>, // created during the current force pass
    bbox: BoundingBox,
    tree: Option<SpatialTree>,
    rng: StdRng,
    t: f64,
    steps: u64,
}

impl Simulation {
    /// Empty simulation inside a cube of half edge
    /// `box_half_size * scale_factor` centered on the origin.
    pub fn new(engine: Engine, params: Parameters) -> Self {
        let bbox = BoundingBox::new(NVec3::zeros(), params.box_half_size * params.scale_factor);
        let rng = StdRng::seed_from_u64(params.seed);
        Self {
            engine,
            params,
            particles: Vec::new(),
            pending: Vec::new(),
            spawned: Vec::new(),
            bbox,
            tree: None,
            rng,
            t: 0.0,
            steps: 0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn pending(&self) -> &[Particle] {
        &self.pending
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    /// Tree over the current [`Simulation::particles`], if Barnes–Hut mode
    /// was on for the last step. Bucket indices always point into
    /// `particles()`.
    pub fn tree(&self) -> Option<&SpatialTree> {
        self.tree.as_ref()
    }

    pub fn time(&self) -> f64 {
        self.t
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps
    }

    /// Hand a particle to the simulation.
    ///
    /// With `add_instantly` the particle joins the active set (and the last
    /// built tree) right away; a non-finite position, or one outside the
    /// box or tree bounds, drops it and returns
    /// [`SimulationError::InvalidPosition`]. Otherwise it is queued and
    /// validated at the start of the next step.
    pub fn insert(&mut self, particle: Particle) -> Result<(), SimulationError> {
        if self.engine.add_instantly {
            self.insert_now(particle)
        } else {
            self.pending.push(particle);
            Ok(())
        }
    }

    /// Advance the simulation by one step of `h0 * time_step`.
    ///
    /// Returns [`SimulationError::NonFiniteForce`] without touching any
    /// position or velocity when the force pass blows up.
    pub fn step(&mut self) -> Result<(), SimulationError> {
        self.flush_pending();
        if self.engine.use_spontaneous {
            self.spontaneous_pair();
        }

        self.compute_forces()?;

        let Simulation { engine, params, particles, bbox, .. } = self;
        let border = engine.use_box_border.then_some(&*bbox);
        for p in particles.iter_mut().filter(|p| !p.removed) {
            advance(p, border, params);
            if engine.draw_all_paths || p.draw_path {
                record_path(p, params.max_path_len);
            }
        }

        let before = self.particles.len();
        self.particles.retain(|p| !p.removed);
        let removed = before - self.particles.len();

        let spawned = std::mem::take(&mut self.spawned);
        let added = spawned.len();
        for mut p in spawned {
            if self.engine.use_box_border {
                p.position = self.bbox.clamp(&p.position);
            }
            if p.position.is_valid() {
                self.particles.push(p);
            }
        }

        self.refresh_tree();

        self.t += self.params.step_dt();
        self.steps += 1;
        log::debug!(
            "step {} t={:.4}: {} particles ({} removed, {} spawned)",
            self.steps,
            self.t,
            self.particles.len(),
            removed,
            added
        );
        Ok(())
    }

    /// Reset and recompute the force on every active particle, resolving
    /// collisions first when enabled. Rebuilds the tree in Barnes–Hut mode.
    ///
    /// Particles removed by a collision take no part in the force pass.
    /// Particles created by collisions are kept aside and join the active
    /// set at the end of the next [`Simulation::step`].
    pub fn compute_forces(&mut self) -> Result<(), SimulationError> {
        self.drop_invalid();
        for p in self.particles.iter_mut() {
            p.force = NVec3::zeros();
        }

        if self.engine.use_collide {
            let params = CollisionParams::from(&self.params);
            self.contact_pass(&params);
        }

        let forces = self.force_set();
        if self.engine.use_barnes_hut {
            // built after the contact pass, so removed particles carry no mass
            self.rebuild_tree();
            self.tree_pass(&forces);
        } else {
            self.tree = None;
            self.pairwise_pass(&forces);
        }

        self.check_forces()
    }

    /// Rotate every particle (active and queued) and the box about the
    /// world origin.
    pub fn rotate(&mut self, alpha: f64, beta: f64, gamma: f64) {
        rotate_world(&mut self.particles, &mut self.bbox, alpha, beta, gamma);
        rotate_particles(&mut self.pending, alpha, beta, gamma);
        self.tree = None;
    }

    /// Resize the box to `box_half_size * scale_factor` about its center.
    /// Particles left outside are moved onto the nearest point of the box.
    pub fn set_scale_factor(&mut self, scale_factor: f64) -> Result<(), SimulationError> {
        let half_size = self.params.box_half_size * scale_factor;
        if !(half_size.is_finite() && half_size > 0.0) {
            return Err(SimulationError::InvalidConfig(format!("scale factor {scale_factor} gives an empty box")));
        }
        self.params.scale_factor = scale_factor;
        self.bbox.set_half_size(half_size);
        if self.engine.use_box_border {
            for p in self.particles.iter_mut() {
                p.position = self.bbox.clamp(&p.position);
            }
        }
        self.tree = None;
        Ok(())
    }

    pub fn set_time_step(&mut self, time_step: f64) {
        self.params.time_step = time_step;
    }

    pub fn total_momentum(&self) -> NVec3 {
        self.particles.iter().filter(|p| !p.removed).map(Particle::momentum).sum()
    }

    pub fn total_kinetic_energy(&self) -> f64 {
        self.particles.iter().filter(|p| !p.removed).map(Particle::kinetic_energy).sum()
    }

    // helpers ==============================================================================

    fn force_set(&self) -> ForceSet {
        let mut forces = ForceSet::new(self.params.min_distance)
            .with(NewtonianGravity { g: self.params.g })
            .with(Coulomb { k: self.params.k });
        if self.engine.use_softening {
            forces = forces.softened(self.params.softening);
        }
        if self.engine.use_collide {
            forces = forces.exact_distance();
        }
        forces
    }

    fn validate(&self, particle: &Particle) -> Result<(), SimulationError> {
        let inside = !self.engine.use_box_border || self.bbox.contains(&particle.position);
        if particle.position.is_valid() && inside {
            Ok(())
        } else {
            Err(SimulationError::InvalidPosition { position: particle.position })
        }
    }

    fn insert_now(&mut self, particle: Particle) -> Result<(), SimulationError> {
        if let Err(e) = self.validate(&particle) {
            log::warn!("dropping {:?}: {}", particle.kind, e);
            return Err(e);
        }

        let index = self.particles.len();
        if let Some(tree) = self.tree.as_mut() {
            if let Err(e) = tree.insert(index, &particle) {
                log::warn!("dropping {:?}: {}", particle.kind, e);
                return Err(e);
            }
        }

        self.particles.push(particle);
        Ok(())
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        // The tree is about to be rebuilt anyway
        self.tree = None;
        for p in std::mem::take(&mut self.pending) {
            let _ = self.insert_now(p);
        }
    }

    fn drop_invalid(&mut self) {
        for (i, p) in self.particles.iter_mut().enumerate() {
            if !p.removed && !p.position.is_valid() {
                log::warn!("removing particle {} ({:?}) with invalid position", i, p.kind);
                p.remove();
            }
        }
    }

    fn rebuild_tree(&mut self) {
        let (origin, edge) = if self.engine.use_box_border {
            self.bbox.enclosing_cube()
        } else {
            enclosing_cube(&self.particles)
        };

        let (tree, rejected) = SpatialTree::build(origin, edge, &self.particles);
        for i in rejected {
            log::warn!("removing particle {} ({:?}) outside tree bounds", i, self.particles[i].kind);
            self.particles[i].remove();
        }
        self.tree = Some(tree);
    }

    /// Resolve every pair in contact once, from its lower index.
    ///
    /// In Barnes–Hut mode the tree serves as neighbour search: with an
    /// unbounded opening angle a node is skipped exactly when nothing in it
    /// can be within contact range.
    fn contact_pass(&mut self, params: &CollisionParams) {
        if self.engine.use_barnes_hut {
            self.rebuild_tree();
        } else {
            self.tree = None;
        }

        let Simulation { particles, spawned, tree, .. } = self;
        let max_radius = particles.iter().filter(|p| !p.removed).map(|p| p.radius).fold(0.0, f64::max);
        let reach = params.min_distance + 2.0 * max_radius;

        let mut neighbours = Vec::new();
        for i in 0..particles.len() {
            if particles[i].removed {
                continue;
            }

            neighbours.clear();
            match tree.as_ref() {
                Some(tree) => {
                    let _ = tree.for_each_source(&particles[i].position, f64::INFINITY, Some(reach), &mut |source| {
                        if let Source::Particle(j) = source {
                            if j > i {
                                neighbours.push(j);
                            }
                        }
                        ControlFlow::Continue(())
                    });
                    neighbours.sort_unstable();
                }
                None => neighbours.extend((i + 1)..particles.len()),
            }

            for &j in &neighbours {
                let outcome = collision::resolve(particles, i, j, params, spawned);
                if outcome != Interaction::None {
                    log::debug!("{:?} + {:?}: {:?}", particles[i].kind, particles[j].kind, outcome);
                }
                if particles[i].removed {
                    break;
                }
            }
        }
    }

    /// Rebuild the tree over the compacted particle list so its bucket
    /// indices match `particles`. Particles the tree rejects are dropped.
    fn refresh_tree(&mut self) {
        self.tree = None;
        if !self.engine.use_barnes_hut {
            return;
        }
        self.rebuild_tree();
        if self.particles.iter().any(|p| p.removed) {
            self.particles.retain(|p| !p.removed);
            self.rebuild_tree();
        }
    }

    fn tree_pass(&mut self, forces: &ForceSet) {
        let Simulation { engine, particles, tree, .. } = self;
        let Some(tree) = tree.as_ref() else {
            return;
        };

        for i in 0..particles.len() {
            if particles[i].removed {
                continue;
            }
            let target = PointSource::from(&particles[i]);
            let mut total = NVec3::zeros();
            let _ = tree.for_each_source(&target.position, engine.theta, None, &mut |source| {
                let other = match source {
                    Source::Aggregate { position, mass, charge } => PointSource { position, mass, charge },
                    Source::Particle(j) if j == i || particles[j].removed => return ControlFlow::Continue(()),
                    Source::Particle(j) => PointSource::from(&particles[j]),
                };
                if let Some(f) = forces.force_between(&target, &other) {
                    total += f;
                }
                ControlFlow::Continue(())
            });
            particles[i].force += total;
        }
    }

    fn pairwise_pass(&mut self, forces: &ForceSet) {
        let particles = &mut self.particles;
        let n = particles.len();

        // Loop over each unordered pair (i, j) with i < j
        for i in 0..n {
            if particles[i].removed {
                continue;
            }
            for j in (i + 1)..n {
                if particles[j].removed {
                    continue;
                }
                let a = PointSource::from(&particles[i]);
                let b = PointSource::from(&particles[j]);
                if let Some(f) = forces.force_between(&a, &b) {
                    particles[i].force += f;
                    particles[j].force -= f;
                }
            }
        }
    }

    fn check_forces(&self) -> Result<(), SimulationError> {
        for (index, p) in self.particles.iter().enumerate() {
            if !p.removed && !p.force.is_valid() {
                log::error!("non-finite force on particle {} ({:?}): {:?}", index, p.kind, p.force);
                return Err(SimulationError::NonFiniteForce { index, kind: p.kind });
            }
        }
        Ok(())
    }

    /// Drop an electron/positron pair at a random point of the box, with
    /// probability `spontaneous_rate`.
    fn spontaneous_pair(&mut self) {
        let rate = self.params.spontaneous_rate;
        if !rate.is_finite() || !self.rng.gen_bool(rate.clamp(0.0, 1.0)) {
            return;
        }

        let h = 0.9 * self.bbox.half_size();
        let mut position = self.bbox.center();
        for n in self.bbox.normals() {
            position.scale_add(n, self.rng.gen_range(-h..=h));
        }

        let mut direction = NVec3::new(
            self.rng.gen_range(-1.0..=1.0),
            self.rng.gen_range(-1.0..=1.0),
            self.rng.gen_range(-1.0..=1.0),
        );
        direction.normalize_safe();
        if direction.norm_squared() == 0.0 {
            direction = NVec3::x();
        }

        // far enough apart not to annihilate on the spot
        let offset = direction * self.params.min_distance;
        let velocity = direction * (0.1 * self.params.max_velocity);

        let electron = Particle::new(ParticleKind::Electron, position - offset).with_velocity(-velocity);
        let positron = Particle::new(ParticleKind::Positron, position + offset).with_velocity(velocity);
        log::debug!("spontaneous pair at ({:.2}, {:.2}, {:.2})", position.x, position.y, position.z);

        let _ = self.insert_now(electron);
        let _ = self.insert_now(positron);
    }
}

/// Rotate positions, velocities, forces and trails by `alpha`, `beta`,
/// `gamma` around the world x, y and z axes, in that order.
pub fn rotate_particles(particles: &mut [Particle], alpha: f64, beta: f64, gamma: f64) {
    let rotate = |v: &mut NVec3| {
        v.rotate_around_x(alpha);
        v.rotate_around_y(beta);
        v.rotate_around_z(gamma);
    };
    for p in particles.iter_mut() {
        for v in [&mut p.position, &mut p.velocity, &mut p.force] {
            rotate(v);
        }
        p.path.iter_mut().for_each(rotate);
    }
}

/// Apply one global rotation to the whole world state: every particle and
/// the bounding box turn together, so the physics is unchanged and only the
/// frame moves.
pub fn rotate_world(particles: &mut [Particle], bbox: &mut BoundingBox, alpha: f64, beta: f64, gamma: f64) {
    rotate_particles(particles, alpha, beta, gamma);
    bbox.rotate(alpha, beta, gamma);
}
