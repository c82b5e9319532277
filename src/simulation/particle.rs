//! Particle record and per-kind behaviour table.
//!
//! Every body in the simulation is a single [`Particle`] tagged with a
//! [`ParticleKind`]. Kind-specific defaults (mass, charge, radius, whether
//! the particle takes the quantum interaction branch, whether it collides at
//! all, display color) are looked up in [`ParticleKind::traits`].

use serde::Deserialize;

use super::vector::NVec3;

/// Mass at which a growing planet is reclassified as a star.
pub const STAR_MASS_THRESHOLD: f64 = 100_000.0;

/// Reference mass used by the star color ramp (roughly a "sun").
const STAR_REFERENCE_MASS: f64 = 1_000_000.0;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    Planet,
    Star,
    DarkMatter,
    Electron,
    Positron,
    Proton,
    Neutron,
    Photon,
    Gluon,
}

/// Static defaults for one particle kind.
#[derive(Debug, Clone, Copy)]
pub struct KindTraits {
    pub mass: f64,
    pub charge: f64,
    pub radius: f64,
    pub quantum: bool,
    pub collides: bool,
    pub color: [f32; 3],
}

impl ParticleKind {
    pub const ALL: [ParticleKind; 9] = [
        ParticleKind::Planet,
        ParticleKind::Star,
        ParticleKind::DarkMatter,
        ParticleKind::Electron,
        ParticleKind::Positron,
        ParticleKind::Proton,
        ParticleKind::Neutron,
        ParticleKind::Photon,
        ParticleKind::Gluon,
    ];

    pub const fn traits(self) -> KindTraits {
        match self {
            ParticleKind::Planet => KindTraits {
                mass: 1.0,
                charge: 0.0,
                radius: 1.0,
                quantum: false,
                collides: true,
                color: [0.35, 0.55, 0.85],
            },
            ParticleKind::Star => KindTraits {
                mass: STAR_MASS_THRESHOLD,
                charge: 0.0,
                radius: 0.0, // derived from mass on construction
                quantum: false,
                collides: true,
                color: [1.0, 0.95, 0.8],
            },
            ParticleKind::DarkMatter => KindTraits {
                mass: 1_000.0,
                charge: 0.0,
                radius: 0.0,
                quantum: false,
                collides: false,
                color: [0.25, 0.2, 0.3],
            },
            ParticleKind::Electron => KindTraits {
                mass: 0.5,
                charge: -1.0,
                radius: 0.0,
                quantum: true,
                collides: true,
                color: [0.3, 0.6, 1.0],
            },
            ParticleKind::Positron => KindTraits {
                mass: 0.5,
                charge: 1.0,
                radius: 0.0,
                quantum: true,
                collides: true,
                color: [1.0, 0.4, 0.4],
            },
            ParticleKind::Proton => KindTraits {
                mass: 938.0,
                charge: 1.0,
                radius: 0.5,
                quantum: true,
                collides: true,
                color: [1.0, 0.2, 0.2],
            },
            ParticleKind::Neutron => KindTraits {
                mass: 939.5,
                charge: 0.0,
                radius: 0.5,
                quantum: true,
                collides: true,
                color: [0.7, 0.7, 0.7],
            },
            ParticleKind::Photon => KindTraits {
                mass: 0.0,
                charge: 0.0,
                radius: 0.0,
                quantum: true,
                collides: true,
                color: [1.0, 1.0, 0.6],
            },
            ParticleKind::Gluon => KindTraits {
                mass: 0.0,
                charge: 0.0,
                radius: 0.0,
                quantum: true,
                collides: true,
                color: [0.4, 1.0, 0.4],
            },
        }
    }

    pub fn is_quantum(self) -> bool {
        self.traits().quantum
    }

    pub fn is_hadron(self) -> bool {
        matches!(self, ParticleKind::Proton | ParticleKind::Neutron)
    }
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub position: NVec3,
    pub velocity: NVec3,
    pub force: NVec3, // accumulated during the current step
    pub mass: f64,
    pub charge: f64,
    pub radius: f64, // 0 = point particle
    pub kind: ParticleKind,
    pub color: [f32; 3],
    pub removed: bool,
    pub visible: bool,
    pub reflections: u32, // boundary bounces, used to retire photons
    pub draw_path: bool,
    pub path: Vec<NVec3>,
}

impl Particle {
    /// Create a particle of `kind` at `position` at rest, with the kind's
    /// default mass, charge and radius.
    pub fn new(kind: ParticleKind, position: NVec3) -> Self {
        let traits = kind.traits();
        let mut p = Self {
            position,
            velocity: NVec3::zeros(),
            force: NVec3::zeros(),
            mass: traits.mass,
            charge: traits.charge,
            radius: traits.radius,
            kind,
            color: traits.color,
            removed: false,
            visible: true,
            reflections: 0,
            draw_path: false,
            path: Vec::new(),
        };
        p.set_mass(traits.mass);
        p
    }

    pub fn with_velocity(mut self, velocity: NVec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.set_mass(mass);
        self
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    pub fn with_path(mut self, draw_path: bool) -> Self {
        self.draw_path = draw_path;
        self
    }

    pub fn is_quantum(&self) -> bool {
        self.kind.is_quantum()
    }

    pub fn is_massless(&self) -> bool {
        self.mass == 0.0
    }

    pub fn collides(&self) -> bool {
        self.kind.traits().collides
    }

    /// True when the two charges have opposite signs.
    pub fn attract(&self, other: &Particle) -> bool {
        charges_attract(self.charge, other.charge)
    }

    /// Set the mass; stars also update their radius and color.
    pub fn set_mass(&mut self, mass: f64) {
        self.mass = mass.max(0.0);
        if self.kind == ParticleKind::Star {
            self.radius = self.mass.ln().max(0.0);
            self.color = star_color(self.mass);
        }
    }

    pub fn remove(&mut self) {
        self.removed = true;
    }

    pub fn momentum(&self) -> NVec3 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }
}

pub fn charges_attract(q1: f64, q2: f64) -> bool {
    (q1 < 0.0 && q2 > 0.0) || (q1 > 0.0 && q2 < 0.0)
}

/// Approximate blackbody color for a star of the given mass.
///
/// Temperature follows a rough main-sequence mass/temperature relation and is
/// mapped to RGB with the usual piecewise fit over `T / 100`.
pub fn star_color(mass: f64) -> [f32; 3] {
    let temperature = (5778.0 * (mass / STAR_REFERENCE_MASS).powf(0.505)).clamp(1000.0, 40000.0);
    let t = temperature / 100.0;

    let r = if t <= 66.0 {
        255.0
    } else {
        329.698727446 * (t - 60.0).powf(-0.1332047592)
    };
    let g = if t <= 66.0 {
        99.4708025861 * t.ln() - 161.1195681661
    } else {
        288.1221695283 * (t - 60.0).powf(-0.0755148492)
    };
    let b = if t >= 66.0 {
        255.0
    } else if t <= 19.0 {
        0.0
    } else {
        138.5177312231 * (t - 10.0).ln() - 305.0447927307
    };

    let channel = |c: f64| (c.clamp(0.0, 255.0) / 255.0) as f32;
    [channel(r), channel(g), channel(b)]
}
