//! # Barnes–Hut Octree (3D)
//!
//! This module implements the **Barnes–Hut octree** used to approximate the
//! long-range gravitational and electromagnetic forces between particles.
//! Instead of evaluating all `N²` pairs, distant groups of particles are
//! treated as a single pseudo-particle located at their center of mass,
//! carrying their total mass and total charge.
//!
//! ## Core Concepts
//!
//! - The simulation volume is a cube, recursively subdivided into 8 octants.
//! - Every node owns exactly 8 slots. A slot is either empty, a leaf bucket
//!   or a nested subtree ([`Slot`]).
//! - A leaf bucket holds one *position* and every particle sitting at
//!   exactly that position. Coincident particles share a bucket instead of
//!   forcing endless subdivision.
//! - Each node stores:
//!   - total mass and total charge of everything below it
//!   - center of mass (COM)
//!   - its cube (`origin` corner + `edge_length`)
//!
//! The tree stores particle *indices* into the simulation's active list. It
//! is rebuilt from scratch every step and never mutated after construction
//! except through [`SpatialTree::insert`].
//!
//! ## Octant encoding
//!
//! - Bit 0 (value 1): x ≥ origin.x + edge/2
//! - Bit 1 (value 2): y ≥ origin.y + edge/2
//! - Bit 2 (value 4): z ≥ origin.z + edge/2

use std::ops::ControlFlow;

use crate::error::SimulationError;
use super::bounding_box::BoundingBox;
use super::particle::Particle;
use super::vector::{NVec3, VectorExt};

/// Default opening-angle threshold.
pub const DEFAULT_THETA: f64 = 0.5;

/// Nodes smaller than this are not subdivided further; distinct positions
/// that still collide at this scale share one bucket.
const MIN_EDGE_LENGTH: f64 = 1e-9;

/// One or more particles at exactly the same position.
#[derive(Debug, Clone)]
pub struct LeafBucket {
    pub position: NVec3,
    pub mass: f64,
    pub charge: f64,
    pub bucket: Vec<usize>, // indices into the particle list
}

#[derive(Debug, Default)]
pub enum Slot {
    #[default]
    Empty,
    Leaf(LeafBucket),
    Node(Box<SpatialTree>),
}

/// Something a tree walk hands to its visitor.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// A far-away subtree collapsed to a single point.
    Aggregate { position: NVec3, mass: f64, charge: f64 },
    /// An individual particle from a leaf bucket.
    Particle(usize),
}

/// A node of the octree; the root is a node like any other.
#[derive(Debug)]
pub struct SpatialTree {
    pub origin: NVec3,
    pub edge_length: f64,
    pub center_of_mass: NVec3,
    pub aggregate_mass: f64,
    pub aggregate_charge: f64,
    slots: [Slot; 8],
}

impl SpatialTree {
    /// Create an empty node covering the cube `[origin, origin + edge_length]`.
    ///
    /// # Panics
    /// If `origin` has a non-finite component or `edge_length` is not a
    /// positive finite number. Both are programming errors.
    pub fn new(origin: NVec3, edge_length: f64) -> Self {
        assert!(origin.is_valid(), "octree origin must be finite, got {origin:?}");
        assert!(
            edge_length.is_finite() && edge_length > 0.0,
            "octree edge length must be positive and finite, got {edge_length}"
        );
        Self {
            origin,
            edge_length,
            center_of_mass: NVec3::zeros(),
            aggregate_mass: 0.0,
            aggregate_charge: 0.0,
            slots: Default::default(),
        }
    }

    /// Build a tree over all non-removed particles that fit in the cube.
    ///
    /// Particles that cannot be inserted (non-finite or outside the cube)
    /// are reported back by index so the caller can drop them.
    pub fn build(origin: NVec3, edge_length: f64, particles: &[Particle]) -> (Self, Vec<usize>) {
        let mut tree = Self::new(origin, edge_length);
        let mut rejected = Vec::new();
        for (i, p) in particles.iter().enumerate() {
            if p.removed {
                continue;
            }
            if tree.insert(i, p).is_err() {
                rejected.push(i);
            }
        }
        (tree, rejected)
    }

    pub fn slots(&self) -> &[Slot; 8] {
        &self.slots
    }

    pub fn contains(&self, p: &NVec3) -> bool {
        let max = self.origin + NVec3::repeat(self.edge_length);
        p.is_valid()
            && (0..3).all(|k| p[k] >= self.origin[k] && p[k] <= max[k])
    }

    /// Insert particle `index` into the tree.
    ///
    /// Fails with [`SimulationError::InvalidPosition`] when the position has
    /// a non-finite component or lies outside this node's cube; the tree is
    /// left untouched in that case.
    pub fn insert(&mut self, index: usize, particle: &Particle) -> Result<(), SimulationError> {
        if !self.contains(&particle.position) {
            return Err(SimulationError::InvalidPosition { position: particle.position });
        }
        self.place(LeafBucket {
            position: particle.position,
            mass: particle.mass,
            charge: particle.charge,
            bucket: vec![index],
        });
        Ok(())
    }

    /// Number of particle indices stored below this node.
    pub fn particle_count(&self) -> usize {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Empty => 0,
                Slot::Leaf(leaf) => leaf.bucket.len(),
                Slot::Node(node) => node.particle_count(),
            })
            .sum()
    }

    /// Outline of this node and of every subtree below it, for debug drawing.
    pub fn node_boxes(&self) -> Vec<BoundingBox> {
        let mut out = Vec::new();
        self.collect_boxes(&mut out);
        out
    }

    /// Walk the tree on behalf of a particle at `position`.
    ///
    /// A subtree of edge `s` whose center of mass lies at distance `d > 0`
    /// is handed to `visit` as a single [`Source::Aggregate`] when
    /// `s / d <= theta`. When `reach` is given, the subtree must also be too
    /// far away to hold anything within `reach` of `position`; collision
    /// detection relies on seeing nearby particles individually.
    ///
    /// Leaf buckets always yield their particles one by one as
    /// [`Source::Particle`]. The walk stops as soon as `visit` breaks.
    pub fn for_each_source<F>(&self, position: &NVec3, theta: f64, reach: Option<f64>, visit: &mut F) -> ControlFlow<()>
    where
        F: FnMut(Source) -> ControlFlow<()>,
    {
        for slot in &self.slots {
            match slot {
                Slot::Empty => {}
                Slot::Leaf(leaf) => {
                    for &index in &leaf.bucket {
                        visit(Source::Particle(index))?;
                    }
                }
                Slot::Node(node) => {
                    if node.is_far(position, theta, reach) {
                        visit(Source::Aggregate {
                            position: node.center_of_mass,
                            mass: node.aggregate_mass,
                            charge: node.aggregate_charge,
                        })?;
                    } else {
                        node.for_each_source(position, theta, reach, visit)?;
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }

    // helpers ==============================================================================

    /// Opening criterion for this node as seen from `position`.
    fn is_far(&self, position: &NVec3, theta: f64, reach: Option<f64>) -> bool {
        let d = (self.center_of_mass - position).norm();
        if d == 0.0 || self.edge_length / d > theta {
            return false;
        }
        match reach {
            // Every point of the cube lies within s·√3 of the center of mass
            Some(reach) => d > self.edge_length * 3f64.sqrt() + reach,
            None => true,
        }
    }

    /// Place a bucket into the slot matching its position.
    ///
    /// - empty slot: store the bucket
    /// - bucket at the same position: merge, no subdivision
    /// - bucket elsewhere: replace it by a child node holding both
    /// - child node: recurse
    ///
    /// Aggregates are refreshed on the way back up.
    fn place(&mut self, incoming: LeafBucket) {
        let octant = self.octant_for(&incoming.position);
        let half = 0.5 * self.edge_length;

        let slot = &mut self.slots[octant];
        match slot {
            Slot::Empty => *slot = Slot::Leaf(incoming),
            Slot::Leaf(existing) if existing.position == incoming.position || half < MIN_EDGE_LENGTH => {
                existing.mass += incoming.mass;
                existing.charge += incoming.charge;
                existing.bucket.extend(incoming.bucket);
            }
            Slot::Leaf(_) => {
                let Slot::Leaf(existing) = std::mem::take(slot) else {
                    unreachable!("slot was matched as a leaf");
                };
                let mut child = SpatialTree::new(child_origin(&self.origin, half, octant), half);
                child.place(existing);
                child.place(incoming);
                self.slots[octant] = Slot::Node(Box::new(child));
            }
            Slot::Node(child) => child.place(incoming),
        }

        self.refresh_aggregates();
    }

    /// Recompute mass, charge and center of mass from the 8 slots.
    fn refresh_aggregates(&mut self) {
        let mut mass = 0.0;
        let mut charge = 0.0;
        let mut weighted = NVec3::zeros();

        for slot in &self.slots {
            match slot {
                Slot::Empty => {}
                Slot::Leaf(leaf) => {
                    mass += leaf.mass;
                    charge += leaf.charge;
                    weighted.scale_add(&leaf.position, leaf.mass);
                }
                Slot::Node(node) => {
                    mass += node.aggregate_mass;
                    charge += node.aggregate_charge;
                    weighted.scale_add(&node.center_of_mass, node.aggregate_mass);
                }
            }
        }

        self.aggregate_mass = mass;
        self.aggregate_charge = charge;
        self.center_of_mass = if mass > 0.0 { weighted / mass } else { self.geometric_center() };
    }

    fn geometric_center(&self) -> NVec3 {
        self.origin + NVec3::repeat(0.5 * self.edge_length)
    }

    fn octant_for(&self, p: &NVec3) -> usize {
        let center = self.geometric_center();
        let mut idx = 0;

        if p.x >= center.x { idx |= 1; } // bit 0
        if p.y >= center.y { idx |= 2; } // bit 1
        if p.z >= center.z { idx |= 4; } // bit 2

        idx
    }

    fn collect_boxes(&self, out: &mut Vec<BoundingBox>) {
        out.push(BoundingBox::from_cube(self.origin, self.edge_length));
        for slot in &self.slots {
            if let Slot::Node(node) = slot {
                node.collect_boxes(out);
            }
        }
    }
}

/// Minimum corner of the child cube for `octant` (same bit layout as
/// [`SpatialTree::octant_for`]).
///
/// # Panics
/// If `octant` is not in `0..8`.
fn child_origin(origin: &NVec3, half: f64, octant: usize) -> NVec3 {
    assert!(octant < 8, "octant index out of range: {octant}");
    let mut o = *origin;
    if octant & 1 != 0 { o.x += half; }
    if octant & 2 != 0 { o.y += half; }
    if octant & 4 != 0 { o.z += half; }
    o
}

/// Cube `(origin, edge_length)` enclosing every valid, non-removed particle.
///
/// Used as the tree root when the simulation runs without a box border. The
/// cube is padded slightly and never degenerate.
pub fn enclosing_cube(particles: &[Particle]) -> (NVec3, f64) {
    let mut min = NVec3::repeat(f64::INFINITY);
    let mut max = NVec3::repeat(f64::NEG_INFINITY);

    for p in particles.iter().filter(|p| !p.removed && p.position.is_valid()) {
        min = min.inf(&p.position);
        max = max.sup(&p.position);
    }

    if !min.is_valid() || !max.is_valid() {
        return (NVec3::repeat(-0.5), 1.0);
    }

    // Expand to a cube so size is well-defined
    let center = (min + max) * 0.5;
    let extent = max - min;
    let edge = (extent.x.max(extent.y).max(extent.z) * 1.01).max(1.0);
    (center - NVec3::repeat(0.5 * edge), edge)
}
