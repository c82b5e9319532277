use std::time::Instant;

use crate::simulation::engine::Engine;
use crate::simulation::kernel::Simulation;
use crate::simulation::params::Parameters;
use crate::simulation::particle::{Particle, ParticleKind};
use crate::simulation::vector::NVec3;

/// Helper to build a simulation with `n` deterministic particles
fn make_simulation(n: usize, barnes_hut: bool) -> Simulation {
    let engine = Engine {
        use_barnes_hut: barnes_hut,
        use_collide: false,
        use_softening: true,
        add_instantly: true,
        ..Engine::default()
    };
    let params = Parameters {
        box_half_size: 100.0,
        ..Parameters::default()
    };
    let mut sim = Simulation::new(engine, params);

    for i in 0..n {
        let i_f = i as f64;
        // deterministic positions, no rand needed
        let x = NVec3::new(
            (i_f * 0.37).sin() * 80.0,
            (i_f * 0.13).cos() * 80.0,
            (i_f * 0.07).sin() * 80.0,
        );
        // alternate charges so the electromagnetic term is exercised too
        let kind = if i % 2 == 0 { ParticleKind::Proton } else { ParticleKind::Electron };
        let _ = sim.insert(Particle::new(kind, x));
    }

    sim
}

/// Time one force pass per model for growing `n`
pub fn bench_forces() {
    // Different system sizes to test
    let ns = [200, 400, 800, 1600, 3200, 6400];

    for n in ns {
        let mut direct = make_simulation(n, false);
        let mut bh = make_simulation(n, true);

        // Warm up
        let _ = direct.compute_forces();
        let _ = bh.compute_forces();

        // Time direct
        let t0 = Instant::now();
        let _ = direct.compute_forces();
        let dt_direct = t0.elapsed().as_secs_f64();

        // Time barnes-hut (includes the tree rebuild)
        let t1 = Instant::now();
        let _ = bh.compute_forces();
        let dt_bh = t1.elapsed().as_secs_f64();

        println!("N = {n:5}, direct = {:8.6} s, BH = {:8.6} s", dt_direct, dt_bh);
    }
}

/// Benchmark full steps for a range of n
/// Paste output directly into excel to graph
pub fn bench_step_curve() {
    println!("N,direct_ms,bh_ms");

    // Steps of 200 to give smoother graph
    for n in (200..=6400).step_by(200) {
        // Small n: average over a few steps to smooth noise
        // Large n: only 1 step to avoid minutes of runtime
        let steps_direct = if n <= 800 { 5 } else { 1 };
        let steps_bh = if n <= 2000 { 3 } else { 1 };

        let mut direct = make_simulation(n, false);
        let t0 = Instant::now();
        for _ in 0..steps_direct {
            if direct.step().is_err() {
                break;
            }
        }
        let ms_direct = t0.elapsed().as_secs_f64() * 1000.0 / steps_direct as f64;

        let mut bh = make_simulation(n, true);
        let t1 = Instant::now();
        for _ in 0..steps_bh {
            if bh.step().is_err() {
                break;
            }
        }
        let ms_bh = t1.elapsed().as_secs_f64() * 1000.0 / steps_bh as f64;

        println!("{},{:.6},{:.6}", n, ms_direct, ms_bh);
    }
}
