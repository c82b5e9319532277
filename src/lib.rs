pub mod simulation;
pub mod configuration;
pub mod benchmark;
pub mod error;

pub use error::SimulationError;

pub use simulation::vector::{NVec3, VectorExt};
pub use simulation::particle::{Particle, ParticleKind, STAR_MASS_THRESHOLD};
pub use simulation::bounding_box::BoundingBox;
pub use simulation::barnes_hut::{SpatialTree, Slot, Source, DEFAULT_THETA};
pub use simulation::forces::{ForceSet, ForceTerm, NewtonianGravity, Coulomb, PointSource};
pub use simulation::collision::{Interaction, CollisionParams};
pub use simulation::engine::Engine;
pub use simulation::params::Parameters;
pub use simulation::kernel::{Simulation, rotate_world};
pub use simulation::scenario::Scenario;

pub use configuration::config::{EngineConfig, ParametersConfig, ParticleConfig, ScenarioConfig};

pub use benchmark::benchmark::{bench_forces, bench_step_curve};
