pub mod vector;
pub mod particle;
pub mod bounding_box;
pub mod barnes_hut;
pub mod forces;
pub mod collision;
pub mod integrator;
pub mod params;
pub mod engine;
pub mod kernel;
pub mod scenario;
