//! High-level runtime engine settings
//!
//! The independent boolean toggles the kernel recognises, plus the
//! Barnes–Hut opening angle. Each can be flipped between steps.

use super::barnes_hut::DEFAULT_THETA;

#[derive(Debug, Clone)]
pub struct Engine {
    pub use_barnes_hut: bool, // false = direct pairwise, true = barnes-hut
    pub use_collide: bool, // collision detection and resolution
    pub use_softening: bool, // softened force denominator
    pub use_box_border: bool, // bounce off the box, otherwise fly freely
    pub add_instantly: bool, // insert immediately, otherwise queue until the next step
    pub use_spontaneous: bool, // random electron/positron pair creation
    pub draw_all_paths: bool, // record trails for every particle
    pub theta: f64, // parameter to determine if use center of mass
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            use_barnes_hut: true,
            use_collide: true,
            use_softening: false,
            use_box_border: true,
            add_instantly: false,
            use_spontaneous: false,
            draw_all_paths: false,
            theta: DEFAULT_THETA,
        }
    }
}
