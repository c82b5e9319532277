//! Error types for the simulation kernel.

use std::fmt;

use crate::simulation::particle::ParticleKind;
use crate::simulation::vector::NVec3;

/// Errors that can occur while inserting particles or stepping the kernel.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// Position has a non-finite component or lies outside the tree/box bounds.
    /// The particle is dropped; the kernel keeps running.
    InvalidPosition { position: NVec3 },
    /// A force pass produced NaN or infinity. The step is aborted before
    /// integration so the bad value never reaches positions or velocities.
    NonFiniteForce { index: usize, kind: ParticleKind },
    /// Malformed scenario data.
    InvalidConfig(String),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidPosition { position } => write!(
                f,
                "Invalid particle position ({}, {}, {}): non-finite or out of bounds",
                position.x, position.y, position.z
            ),
            SimulationError::NonFiniteForce { index, kind } => {
                write!(f, "Non-finite force on particle {} ({:?}), simulation halted", index, kind)
            }
            SimulationError::InvalidConfig(msg) => write!(f, "Invalid scenario configuration: {}", msg),
        }
    }
}

impl std::error::Error for SimulationError {}
