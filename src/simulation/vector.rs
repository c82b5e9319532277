//! 3D vector type used throughout the kernel.
//!
//! `NVec3` is nalgebra's `Vector3<f64>`, which already provides the
//! arithmetic operators, `dot`, `cross`, `norm` and `norm_squared`.
//! [`VectorExt`] adds the handful of operations the simulation needs on top:
//! in-place rotation about the world axes, reflection across a plane,
//! a perpendicular vector for photon emission and a finiteness check.

use nalgebra::{Rotation3, Vector3};

pub type NVec3 = Vector3<f64>;

pub trait VectorExt {
    /// `self += other * s`
    fn scale_add(&mut self, other: &NVec3, s: f64);

    /// Normalize in place, leaving a zero vector untouched.
    fn normalize_safe(&mut self);

    fn rotate_around_x(&mut self, angle: f64);
    fn rotate_around_y(&mut self, angle: f64);
    fn rotate_around_z(&mut self, angle: f64);

    /// Reflect across the plane with unit `normal`: `v -= 2 (v·n) loss n`.
    /// `loss = 1.0` gives a mirror reflection.
    fn reflect(&mut self, normal: &NVec3, loss: f64);

    /// A vector perpendicular to `self`, built by crossing with the basis
    /// axis of the smallest-magnitude component. Zero for the zero vector.
    fn orthogonal(&self) -> NVec3;

    /// True when every component is finite.
    fn is_valid(&self) -> bool;
}

impl VectorExt for NVec3 {
    fn scale_add(&mut self, other: &NVec3, s: f64) {
        self.x += other.x * s;
        self.y += other.y * s;
        self.z += other.z * s;
    }

    fn normalize_safe(&mut self) {
        let len = self.norm();
        if len > 0.0 {
            *self /= len;
        }
    }

    fn rotate_around_x(&mut self, angle: f64) {
        if angle == 0.0 {
            return;
        }
        *self = Rotation3::from_axis_angle(&Vector3::x_axis(), angle) * *self;
    }

    fn rotate_around_y(&mut self, angle: f64) {
        if angle == 0.0 {
            return;
        }
        *self = Rotation3::from_axis_angle(&Vector3::y_axis(), angle) * *self;
    }

    fn rotate_around_z(&mut self, angle: f64) {
        if angle == 0.0 {
            return;
        }
        *self = Rotation3::from_axis_angle(&Vector3::z_axis(), angle) * *self;
    }

    fn reflect(&mut self, normal: &NVec3, loss: f64) {
        let projection = self.dot(normal);
        self.scale_add(normal, -2.0 * projection * loss);
    }

    fn orthogonal(&self) -> NVec3 {
        let (ax, ay, az) = (self.x.abs(), self.y.abs(), self.z.abs());

        let basis = if ax <= ay && ax <= az {
            NVec3::x()
        } else if ay <= az {
            NVec3::y()
        } else {
            NVec3::z()
        };

        self.cross(&basis)
    }

    fn is_valid(&self) -> bool {
        self.iter().all(|c| c.is_finite())
    }
}
