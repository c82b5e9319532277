//! Force contributors for the particle kernel
//!
//! A [`ForceSet`] sums the magnitudes of its [`ForceTerm`]s for one pair of
//! point sources and applies the result along the normalized separation.
//! The same code serves the exact pairwise loop and the Barnes–Hut walk,
//! where one side of the pair may be an aggregate node.

use super::particle::{charges_attract, Particle};
use super::vector::{NVec3, VectorExt};

/// Position, mass and charge of something that exerts or feels a force:
/// a particle, or a far-away octree node standing in for many.
#[derive(Debug, Clone, Copy)]
pub struct PointSource {
    pub position: NVec3,
    pub mass: f64,
    pub charge: f64,
}

impl From<&Particle> for PointSource {
    fn from(p: &Particle) -> Self {
        Self {
            position: p.position,
            mass: p.mass,
            charge: p.charge,
        }
    }
}

/// A single force law.
///
/// Returns the signed magnitude of the force `a` feels from `b`, given the
/// effective distance denominator (`d²` or its softened replacement).
/// Positive pulls `a` towards `b`, negative pushes it away.
pub trait ForceTerm {
    fn magnitude(&self, a: &PointSource, b: &PointSource, denom: f64) -> f64;
}

/// F = G |m1 m2| / d², always attractive
pub struct NewtonianGravity {
    pub g: f64,
}

impl ForceTerm for NewtonianGravity {
    fn magnitude(&self, a: &PointSource, b: &PointSource, denom: f64) -> f64 {
        self.g * (a.mass * b.mass).abs() / denom
    }
}

/// F = K |q1 q2| / d², attractive for opposite charges
pub struct Coulomb {
    pub k: f64,
}

impl ForceTerm for Coulomb {
    fn magnitude(&self, a: &PointSource, b: &PointSource, denom: f64) -> f64 {
        let f = self.k * (a.charge * b.charge).abs() / denom;
        if charges_attract(a.charge, b.charge) {
            f
        } else {
            -f
        }
    }
}

/// Collection of force terms plus the distance policy they share.
pub struct ForceSet {
    terms: Vec<Box<dyn ForceTerm + Send + Sync>>,
    min_distance: f64,
    softening: Option<f64>,
    floor_distance: bool,
}

impl ForceSet {
    /// Empty set. `min_distance` floors the separation unless
    /// [`ForceSet::exact_distance`] is used.
    pub fn new(min_distance: f64) -> Self {
        Self {
            terms: Vec::new(),
            min_distance,
            softening: None,
            floor_distance: true,
        }
    }

    /// Add a force term
    pub fn with(mut self, term: impl ForceTerm + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    /// Use a softened denominator with squared softening length `eps2`.
    pub fn softened(mut self, eps2: f64) -> Self {
        self.softening = Some(eps2);
        self
    }

    /// Use the true separation instead of flooring it at `min_distance`;
    /// needed while collisions are detected so contact can be seen.
    pub fn exact_distance(mut self) -> Self {
        self.floor_distance = false;
        self
    }

    /// Effective denominator for a pair at squared distance `d2`.
    ///
    /// - raw: `d²`
    /// - softened (Plummer): `(d² + ε)^{3/2} / d`, which tends to the raw
    ///   value far away and keeps the force bounded as `d → 0`.
    fn denominator(&self, d2: f64) -> f64 {
        let d2 = if self.floor_distance {
            d2.max(self.min_distance * self.min_distance)
        } else {
            d2
        };
        match self.softening {
            Some(eps2) => {
                let s = d2 + eps2;
                s * s.sqrt() / d2.sqrt()
            }
            None => d2,
        }
    }

    /// Force exerted on `a` by `b`.
    ///
    /// `None` when the two coincide; the direction is undefined there and
    /// the pair contributes nothing.
    pub fn force_between(&self, a: &PointSource, b: &PointSource) -> Option<NVec3> {
        let mut r = b.position - a.position;
        let d2 = r.norm_squared();
        if d2 == 0.0 || !d2.is_finite() {
            return None;
        }
        r.normalize_safe();

        let denom = self.denominator(d2);
        let magnitude: f64 = self.terms.iter().map(|t| t.magnitude(a, b, denom)).sum();
        Some(r * magnitude)
    }
}
