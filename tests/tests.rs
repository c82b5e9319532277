use bhparticles::{Engine, NVec3, Parameters, Particle, ParticleKind, Simulation, SimulationError};
use bhparticles::{Coulomb, ForceSet, NewtonianGravity, PointSource};

/// Engine with every optional behaviour off and immediate insertion
pub fn quiet_engine(barnes_hut: bool) -> Engine {
    Engine {
        use_barnes_hut: barnes_hut,
        use_collide: false,
        use_softening: false,
        use_box_border: true,
        add_instantly: true,
        use_spontaneous: false,
        draw_all_paths: false,
        theta: 0.5,
    }
}

/// Two stars separated along the x-axis, at rest
pub fn two_star_simulation(barnes_hut: bool) -> Simulation {
    let mut sim = Simulation::new(quiet_engine(barnes_hut), Parameters::default());
    sim.insert(Particle::new(ParticleKind::Star, NVec3::new(-50.0, 0.0, 0.0)).with_mass(10.0))
        .unwrap();
    sim.insert(Particle::new(ParticleKind::Star, NVec3::new(50.0, 0.0, 0.0)).with_mass(20.0))
        .unwrap();
    sim
}

/// Gravity + coulomb set with the given distance floor
pub fn force_set(p: &Parameters) -> ForceSet {
    ForceSet::new(p.min_distance)
        .with(NewtonianGravity { g: p.g })
        .with(Coulomb { k: p.k })
}

fn source(x: f64, mass: f64, charge: f64) -> PointSource {
    PointSource {
        position: NVec3::new(x, 0.0, 0.0),
        mass,
        charge,
    }
}

// ==================================================================================
// Force tests
// ==================================================================================

#[test]
fn two_stars_feel_equal_and_opposite_gravity() {
    for barnes_hut in [false, true] {
        let mut sim = two_star_simulation(barnes_hut);
        sim.step().unwrap();

        let g = sim.params.g;
        let expected = g * 10.0 * 20.0 / (100.0 * 100.0);

        let f0 = sim.particles()[0].force;
        let f1 = sim.particles()[1].force;

        assert!((f0.norm() - expected).abs() < 1e-12, "barnes_hut={barnes_hut}: |F0| = {}, expected {}", f0.norm(), expected);
        assert!((f1.norm() - expected).abs() < 1e-12, "barnes_hut={barnes_hut}: |F1| = {}, expected {}", f1.norm(), expected);
        assert!((f0 + f1).norm() < 1e-15, "Forces are not opposite: {:?} vs {:?}", f0, f1);
        assert!(f0.x > 0.0, "Star 0 should be pulled towards +x");
    }
}

#[test]
fn gravity_inverse_square_law() {
    let p = Parameters::default();
    let forces = force_set(&p);

    let near = forces.force_between(&source(0.0, 1.0, 0.0), &source(2.0, 1.0, 0.0)).unwrap();
    let far = forces.force_between(&source(0.0, 1.0, 0.0), &source(4.0, 1.0, 0.0)).unwrap();

    let ratio = near.norm() / far.norm();
    assert!((ratio - 4.0).abs() < 1e-9, "Expected ~4x, got {}", ratio);
}

#[test]
fn opposite_charges_attract_like_charges_repel() {
    let p = Parameters::default();
    let forces = force_set(&p);

    let attract = forces.force_between(&source(0.0, 0.0, 1.0), &source(3.0, 0.0, -1.0)).unwrap();
    let repel = forces.force_between(&source(0.0, 0.0, 1.0), &source(3.0, 0.0, 1.0)).unwrap();

    assert!(attract.x > 0.0, "Opposite charges should attract: {:?}", attract);
    assert!(repel.x < 0.0, "Like charges should repel: {:?}", repel);
    assert!((attract.norm() - p.k / 9.0).abs() < 1e-12);
}

#[test]
fn distance_is_floored_unless_exact() {
    let p = Parameters::default();
    let floored = force_set(&p);
    let exact = force_set(&p).exact_distance();

    let a = source(0.0, 1.0, 0.0);
    let b = source(0.1, 1.0, 0.0);

    let f_floor = floored.force_between(&a, &b).unwrap().norm();
    let f_exact = exact.force_between(&a, &b).unwrap().norm();

    assert!((f_floor - p.g / (p.min_distance * p.min_distance)).abs() < 1e-12);
    assert!((f_exact - p.g / 0.01).abs() < 1e-9);
}

#[test]
fn softening_prevents_blowup() {
    let p = Parameters::default();
    let forces = force_set(&p).exact_distance().softened(0.1);

    let f = forces.force_between(&source(0.0, 1.0, 0.0), &source(1e-9, 1.0, 0.0)).unwrap();
    assert!(f.norm() < 1e-6, "Softening failed; force too large: {}", f.norm());

    // far away the softened law approaches the plain one
    let far = forces.force_between(&source(0.0, 1.0, 0.0), &source(1000.0, 1.0, 0.0)).unwrap();
    let plain = p.g / 1.0e6;
    assert!((far.norm() - plain).abs() / plain < 1e-6);
}

#[test]
fn coincident_sources_give_no_force() {
    let p = Parameters::default();
    let forces = force_set(&p).exact_distance();
    assert!(forces.force_between(&source(1.0, 1.0, 1.0), &source(1.0, 1.0, 1.0)).is_none());
}

#[test]
fn tree_forces_converge_to_pairwise_for_small_theta() {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(7);
    let particles: Vec<Particle> = (0..40)
        .map(|_| {
            let x = NVec3::new(rng.gen_range(-90.0..90.0), rng.gen_range(-90.0..90.0), rng.gen_range(-90.0..90.0));
            Particle::new(ParticleKind::Planet, x)
                .with_mass(rng.gen_range(1.0..100.0))
                .with_charge(rng.gen_range(-2.0..2.0))
        })
        .collect();

    let mut direct = Simulation::new(quiet_engine(false), Parameters::default());
    let mut tree = Simulation::new(Engine { theta: 1e-12, ..quiet_engine(true) }, Parameters::default());
    for p in &particles {
        direct.insert(p.clone()).unwrap();
        tree.insert(p.clone()).unwrap();
    }

    direct.compute_forces().unwrap();
    tree.compute_forces().unwrap();

    for (a, b) in direct.particles().iter().zip(tree.particles()) {
        let err = (a.force - b.force).norm();
        assert!(err <= 1e-9 * a.force.norm().max(1e-12), "tree force {:?} differs from pairwise {:?}", b.force, a.force);
    }
}

#[test]
fn non_finite_force_halts_the_step() {
    let mut sim = Simulation::new(quiet_engine(false), Parameters::default());
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(-1.0, 0.0, 0.0)).with_mass(1e200)).unwrap();
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(1.0, 0.0, 0.0)).with_mass(1e200)).unwrap();

    let result = sim.step();
    assert!(matches!(result, Err(SimulationError::NonFiniteForce { .. })), "Expected NonFiniteForce, got {:?}", result);

    // nothing moved
    assert_eq!(sim.particles()[0].position, NVec3::new(-1.0, 0.0, 0.0));
    assert_eq!(sim.particles()[0].velocity, NVec3::zeros());
    assert_eq!(sim.steps_taken(), 0);
}

// ==================================================================================
// Integrator tests
// ==================================================================================

#[test]
fn massless_tracer_moves_at_exactly_max_velocity() {
    let params = Parameters::default();
    let max = params.max_velocity;
    let mut sim = Simulation::new(quiet_engine(true), params);

    let tracer = Particle::new(ParticleKind::Planet, NVec3::zeros())
        .with_mass(0.0)
        .with_charge(0.0)
        .with_radius(0.0)
        .with_velocity(NVec3::new(2.0 * max, 0.0, 0.0));
    sim.insert(tracer).unwrap();

    sim.step().unwrap();

    let v = sim.particles()[0].velocity;
    assert!((v.norm() - max).abs() < 1e-12, "speed {} should equal max_velocity {}", v.norm(), max);
    assert!(v.x > 0.0 && v.y == 0.0 && v.z == 0.0, "direction changed: {:?}", v);
}

#[test]
fn massive_speed_is_soft_capped() {
    let params = Parameters::default();
    let max = params.max_velocity;
    let mut sim = Simulation::new(quiet_engine(false), params);
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::zeros()).with_velocity(NVec3::new(0.0, 5.0 * max, 0.0)))
        .unwrap();

    sim.step().unwrap();

    let speed = sim.particles()[0].velocity.norm();
    let expected = max * 5.0f64.tanh();
    assert!((speed - expected).abs() < 1e-9, "capped speed {} expected {}", speed, expected);
}

#[test]
fn two_body_orbit_conserves_momentum_and_energy() {
    let engine = Engine {
        use_box_border: false,
        ..quiet_engine(false)
    };
    let params = Parameters {
        g: 1.0,
        h0: 0.001,
        max_velocity: 1e6,
        ..Parameters::default()
    };
    let g = params.g;
    let mut sim = Simulation::new(engine, params);

    let (big, small) = (1000.0, 1.0);
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::zeros()).with_mass(big).with_velocity(NVec3::new(0.0, -0.01, 0.0)))
        .unwrap();
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(10.0, 0.0, 0.0)).with_mass(small).with_velocity(NVec3::new(0.0, 10.0, 0.0)))
        .unwrap();

    let energy = |sim: &Simulation| {
        let ps = sim.particles();
        let r = (ps[1].position - ps[0].position).norm();
        sim.total_kinetic_energy() - g * ps[0].mass * ps[1].mass / r
    };
    let e0 = energy(&sim);

    for _ in 0..2000 {
        sim.step().unwrap();
    }

    let p = sim.total_momentum();
    let e1 = energy(&sim);
    assert_eq!(sim.particles().len(), 2);
    assert!(p.norm() < 1e-4, "Net momentum drifted: {:?}", p);
    assert!(((e1 - e0) / e0).abs() < 1e-2, "Energy drifted from {} to {}", e0, e1);
}

// ==================================================================================
// Kernel tests
// ==================================================================================

#[test]
fn deferred_insertion_waits_for_next_step() {
    let engine = Engine {
        add_instantly: false,
        ..quiet_engine(true)
    };
    let mut sim = Simulation::new(engine, Parameters::default());

    sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(1.0, 2.0, 3.0))).unwrap();
    assert!(sim.particles().is_empty());
    assert_eq!(sim.pending().len(), 1);

    sim.step().unwrap();
    assert_eq!(sim.particles().len(), 1);
    assert!(sim.pending().is_empty());
}

#[test]
fn deferred_invalid_particles_are_dropped_at_flush() {
    let engine = Engine {
        add_instantly: false,
        ..quiet_engine(true)
    };
    let mut sim = Simulation::new(engine, Parameters::default());

    sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(f64::NAN, 0.0, 0.0))).unwrap();
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(1e6, 0.0, 0.0))).unwrap();
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::zeros())).unwrap();

    sim.step().unwrap();
    assert_eq!(sim.particles().len(), 1);
}

#[test]
fn immediate_insertion_rejects_invalid_positions() {
    let mut sim = Simulation::new(quiet_engine(true), Parameters::default());

    let outside = sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(500.0, 0.0, 0.0)));
    assert!(matches!(outside, Err(SimulationError::InvalidPosition { .. })));

    let nan = sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(0.0, f64::NAN, 0.0)));
    assert!(matches!(nan, Err(SimulationError::InvalidPosition { .. })));

    assert!(sim.particles().is_empty());
}

#[test]
fn immediate_insertion_goes_into_the_current_tree() {
    let mut sim = Simulation::new(quiet_engine(true), Parameters::default());
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(5.0, 5.0, 5.0))).unwrap();
    sim.step().unwrap();
    assert_eq!(sim.tree().unwrap().particle_count(), 1);

    sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(-5.0, 5.0, 5.0))).unwrap();
    assert_eq!(sim.particles().len(), 2);
    assert_eq!(sim.tree().unwrap().particle_count(), 2);
}

#[test]
fn spontaneous_pairs_are_created_and_seeded() {
    let engine = Engine {
        use_spontaneous: true,
        ..quiet_engine(true)
    };
    let params = Parameters {
        spontaneous_rate: 1.0,
        ..Parameters::default()
    };

    let mut a = Simulation::new(engine.clone(), params.clone());
    let mut b = Simulation::new(engine, params);
    a.step().unwrap();
    b.step().unwrap();

    let kinds: Vec<ParticleKind> = a.particles().iter().map(|p| p.kind).collect();
    assert_eq!(kinds, vec![ParticleKind::Electron, ParticleKind::Positron]);

    // opposite velocities, so no net momentum is created
    assert!(a.total_momentum().norm() < 1e-9);

    for (pa, pb) in a.particles().iter().zip(b.particles()) {
        assert_eq!(pa.position, pb.position, "same seed should give the same pair");
    }
}

#[test]
fn nan_spontaneous_rate_creates_nothing() {
    let engine = Engine {
        use_spontaneous: true,
        ..quiet_engine(true)
    };
    let params = Parameters {
        spontaneous_rate: f64::NAN,
        ..Parameters::default()
    };
    let mut sim = Simulation::new(engine, params);
    sim.step().unwrap();
    assert!(sim.particles().is_empty());
}

#[test]
fn rotation_moves_particles_and_box_together() {
    let mut sim = Simulation::new(quiet_engine(true), Parameters::default());
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(90.0, 0.0, 0.0)).with_velocity(NVec3::new(1.0, 0.0, 0.0)))
        .unwrap();

    sim.rotate(0.0, 0.0, std::f64::consts::FRAC_PI_2);

    let p = &sim.particles()[0];
    assert!((p.position - NVec3::new(0.0, 90.0, 0.0)).norm() < 1e-9, "position {:?}", p.position);
    assert!((p.velocity - NVec3::new(0.0, 1.0, 0.0)).norm() < 1e-12, "velocity {:?}", p.velocity);

    sim.rotate(0.3, 0.5, 0.7);
    assert!(sim.bounding_box().contains(&sim.particles()[0].position));
}

#[test]
fn scale_factor_resizes_box_and_pulls_particles_in() {
    let mut sim = Simulation::new(quiet_engine(true), Parameters::default());
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::new(80.0, 0.0, 0.0))).unwrap();

    sim.set_scale_factor(0.5).unwrap();
    assert!((sim.bounding_box().half_size() - 50.0).abs() < 1e-12);
    assert!((sim.particles()[0].position.x - 50.0).abs() < 1e-9);

    assert!(sim.set_scale_factor(0.0).is_err());
}

#[test]
fn time_step_scales_the_step() {
    let mut sim = Simulation::new(quiet_engine(true), Parameters::default());
    sim.set_time_step(2.0);
    sim.step().unwrap();
    assert!((sim.time() - 0.2).abs() < 1e-12);
}

#[test]
fn paths_are_recorded_and_bounded() {
    let engine = Engine {
        draw_all_paths: true,
        ..quiet_engine(true)
    };
    let params = Parameters {
        max_path_len: 2,
        ..Parameters::default()
    };
    let mut sim = Simulation::new(engine, params);
    sim.insert(Particle::new(ParticleKind::Planet, NVec3::zeros()).with_velocity(NVec3::new(1.0, 0.0, 0.0)))
        .unwrap();

    for _ in 0..3 {
        sim.step().unwrap();
    }

    let p = &sim.particles()[0];
    assert_eq!(p.path.len(), 2);
    assert_eq!(*p.path.last().unwrap(), p.position);
}
