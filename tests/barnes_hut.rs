use std::ops::ControlFlow;

use bhparticles::simulation::barnes_hut::enclosing_cube;
use bhparticles::{NVec3, Particle, ParticleKind, SimulationError, Slot, Source, SpatialTree};

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Root covering the default simulation box
fn default_root() -> SpatialTree {
    SpatialTree::new(NVec3::repeat(-100.0), 200.0)
}

fn planet(x: f64, y: f64, z: f64, mass: f64) -> Particle {
    Particle::new(ParticleKind::Planet, NVec3::new(x, y, z)).with_mass(mass)
}

/// Count the sources a walk from `position` produces
fn walk(tree: &SpatialTree, position: NVec3, theta: f64, reach: Option<f64>) -> (Vec<usize>, Vec<f64>) {
    let mut particles = Vec::new();
    let mut aggregates = Vec::new();
    let _ = tree.for_each_source(&position, theta, reach, &mut |source| {
        match source {
            Source::Particle(i) => particles.push(i),
            Source::Aggregate { mass, .. } => aggregates.push(mass),
        }
        ControlFlow::Continue(())
    });
    (particles, aggregates)
}

#[test]
fn root_aggregates_match_particle_sums() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut particles: Vec<Particle> = (0..100)
        .map(|_| {
            planet(rng.gen_range(-99.0..99.0), rng.gen_range(-99.0..99.0), rng.gen_range(-99.0..99.0), rng.gen_range(0.5..50.0))
                .with_charge(rng.gen_range(-1.0..1.0))
        })
        .collect();
    // a few coincident duplicates
    for i in 0..5 {
        let twin = particles[i].clone();
        particles.push(twin);
    }

    let (tree, rejected) = SpatialTree::build(NVec3::repeat(-100.0), 200.0, &particles);
    assert!(rejected.is_empty());
    assert_eq!(tree.particle_count(), particles.len());

    let mass: f64 = particles.iter().map(|p| p.mass).sum();
    let charge: f64 = particles.iter().map(|p| p.charge).sum();
    let com = particles.iter().fold(NVec3::zeros(), |acc, p| acc + p.position * p.mass) / mass;

    assert!((tree.aggregate_mass - mass).abs() <= 1e-12 * mass, "mass {} vs {}", tree.aggregate_mass, mass);
    assert!((tree.aggregate_charge - charge).abs() < 1e-9, "charge {} vs {}", tree.aggregate_charge, charge);
    assert!((tree.center_of_mass - com).norm() < 1e-9, "center of mass {:?} vs {:?}", tree.center_of_mass, com);
}

#[test]
fn coincident_particles_share_one_bucket() {
    let mut tree = default_root();
    let a = planet(10.0, 10.0, 10.0, 2.0);
    let b = planet(10.0, 10.0, 10.0, 3.0);
    tree.insert(0, &a).unwrap();
    tree.insert(1, &b).unwrap();

    let leaves: Vec<_> = tree
        .slots()
        .iter()
        .filter_map(|s| if let Slot::Leaf(leaf) = s { Some(leaf) } else { None })
        .collect();

    assert_eq!(leaves.len(), 1, "coincident particles must not subdivide");
    assert_eq!(leaves[0].bucket, vec![0, 1]);
    assert!((leaves[0].mass - 5.0).abs() < 1e-12);
    assert!((tree.aggregate_mass - 5.0).abs() < 1e-12);
}

#[test]
fn distinct_particles_in_one_octant_subdivide() {
    let mut tree = default_root();
    tree.insert(0, &planet(10.0, 10.0, 10.0, 1.0)).unwrap();
    tree.insert(1, &planet(60.0, 60.0, 60.0, 1.0)).unwrap();

    assert!(matches!(tree.slots()[7], Slot::Node(_)), "octant 7 should hold a child node");
    assert_eq!(tree.particle_count(), 2);
    assert!(tree.node_boxes().len() >= 2);
}

#[test]
fn insert_rejects_invalid_and_outside_positions() {
    let mut tree = default_root();
    tree.insert(0, &planet(1.0, 1.0, 1.0, 1.0)).unwrap();

    let outside = tree.insert(1, &planet(150.0, 0.0, 0.0, 1.0));
    assert!(matches!(outside, Err(SimulationError::InvalidPosition { .. })));

    let nan = tree.insert(2, &planet(f64::NAN, 0.0, 0.0, 1.0));
    assert!(matches!(nan, Err(SimulationError::InvalidPosition { .. })));

    let inf = tree.insert(3, &planet(0.0, f64::INFINITY, 0.0, 1.0));
    assert!(inf.is_err());

    // failed inserts leave the tree untouched
    assert_eq!(tree.particle_count(), 1);
    assert!((tree.aggregate_mass - 1.0).abs() < 1e-12);
}

#[test]
fn build_reports_rejected_and_skips_removed() {
    let mut removed = planet(5.0, 5.0, 5.0, 1.0);
    removed.remove();
    let particles = vec![planet(0.0, 0.0, 0.0, 1.0), planet(500.0, 0.0, 0.0, 1.0), removed];

    let (tree, rejected) = SpatialTree::build(NVec3::repeat(-100.0), 200.0, &particles);
    assert_eq!(rejected, vec![1]);
    assert_eq!(tree.particle_count(), 1);
}

#[test]
fn distant_cluster_is_seen_as_one_aggregate() {
    let mut tree = default_root();
    let mut index = 0;
    for dx in [0.0, 2.0] {
        for dy in [0.0, 2.0] {
            for dz in [0.0, 2.0] {
                tree.insert(index, &planet(50.0 + dx, 50.0 + dy, 50.0 + dz, 1.0)).unwrap();
                index += 1;
            }
        }
    }

    let observer = NVec3::repeat(-90.0);

    let (particles, aggregates) = walk(&tree, observer, 0.5, None);
    assert!(particles.is_empty(), "no cluster member should be visited individually");
    assert_eq!(aggregates.len(), 1);
    assert!((aggregates[0] - 8.0).abs() < 1e-12);

    // contact reach far smaller than the distance does not change that
    let (particles, aggregates) = walk(&tree, observer, 0.5, Some(2.0));
    assert!(particles.is_empty());
    assert_eq!(aggregates.len(), 1);

    // theta = 0 opens every node
    let (particles, aggregates) = walk(&tree, observer, 0.0, None);
    assert_eq!(particles.len(), 8);
    assert!(aggregates.is_empty());
}

#[test]
fn nearby_particles_are_visited_individually() {
    let mut tree = default_root();
    tree.insert(0, &planet(50.0, 50.0, 50.0, 1.0)).unwrap();
    tree.insert(1, &planet(51.0, 51.0, 51.0, 1.0)).unwrap();

    let (particles, aggregates) = walk(&tree, NVec3::new(50.5, 50.5, 50.5), 0.5, None);
    assert!(aggregates.is_empty());
    assert_eq!(particles.len(), 2);
}

#[test]
fn walk_stops_when_visitor_breaks() {
    let mut tree = default_root();
    for i in 0..10 {
        tree.insert(i, &planet(-90.0 + 18.0 * i as f64, 0.0, 0.0, 1.0)).unwrap();
    }

    let mut seen = 0;
    let flow = tree.for_each_source(&NVec3::zeros(), 0.0, None, &mut |_| {
        seen += 1;
        if seen == 3 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    assert!(flow.is_break());
    assert_eq!(seen, 3);
}

#[test]
fn enclosing_cube_covers_all_particles() {
    let particles = vec![
        planet(-3.0, 2.0, 0.0, 1.0),
        planet(7.0, -1.0, 4.0, 1.0),
        planet(0.0, 0.0, -6.0, 1.0),
    ];
    let (origin, edge) = enclosing_cube(&particles);
    let tree = SpatialTree::new(origin, edge);

    for p in &particles {
        assert!(tree.contains(&p.position), "{:?} not inside the cube", p.position);
    }

    // empty or single-point input still gives a usable cube
    let (_, edge) = enclosing_cube(&[]);
    assert!(edge > 0.0);
    let (_, edge) = enclosing_cube(&particles[..1]);
    assert!(edge >= 1.0);
}
