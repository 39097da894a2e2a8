use bevy_sph2d::{InitialLayout, SPHState, SimParams, Stage};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// no gravity, no interaction, walls far away
fn closed_params(n: usize, h: f32) -> SimParams {
    let mut params = SimParams::new(n, 1.0);
    params.gravity = 0.0;
    params.interaction_strength = 0.0;
    params.smoothing_radius = h;
    params.bounds_half_extent = Vec2::splat(100.0);
    params
}

fn run_until(sph: &mut SPHState, params: &SimParams, last: Stage) {
    let ctx = sph.prepare(params).unwrap();
    for stage in Stage::ALL {
        sph.run_stage(stage, &ctx);
        if stage == last {
            break;
        }
    }
}

#[test]
fn pressure_forces_conserve_momentum() {
    let mut rng = StdRng::seed_from_u64(3);
    let n = 80;
    let positions: Vec<Vec2> = (0..n)
        .map(|_| Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect();
    let mut sph = SPHState::new(InitialLayout::at_rest(positions)).unwrap();

    let mut params = closed_params(n, 0.5);
    params.target_density = 20.0;
    params.pressure_multiplier = 50.0;
    params.near_pressure_multiplier = 5.0;

    run_until(&mut sph, &params, Stage::Pressure);

    // particles start at rest with dt = 1, so velocity now equals the pressure acceleration
    let net: Vec2 = sph.velocities().iter().copied().sum();
    let total: f32 = sph.velocities().iter().map(|v| v.length()).sum();
    assert!(total > 0.0);
    assert!(net.length() <= total * 1e-4, "net {net} vs total {total}");
}

#[test]
fn viscosity_conserves_momentum() {
    let mut rng = StdRng::seed_from_u64(11);
    let n = 60;
    let positions: Vec<Vec2> = (0..n)
        .map(|_| Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect();
    let velocities: Vec<Vec2> = (0..n)
        .map(|_| Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect();
    let mut sph = SPHState::new(InitialLayout::new(positions, velocities)).unwrap();

    let mut params = closed_params(n, 0.5);
    params.pressure_multiplier = 0.0;
    params.near_pressure_multiplier = 0.0;
    params.viscosity_strength = 0.01;

    run_until(&mut sph, &params, Stage::Pressure);
    let before: Vec2 = sph.velocities().iter().copied().sum();
    let ctx = sph.prepare(&params).unwrap();
    sph.run_stage(Stage::Viscosity, &ctx);
    let after: Vec2 = sph.velocities().iter().copied().sum();

    assert!((after - before).length() < 1e-4, "{before} -> {after}");
}

#[test]
fn uniform_packing_reaches_target_density() {
    let target_density = 100.0;
    let spacing = 1.0 / f32::sqrt(target_density);
    let layout = InitialLayout::grid(41, 41, spacing, Vec2::ZERO);
    let positions = layout.positions.clone();
    let mut sph = SPHState::new(layout).unwrap();

    let mut params = closed_params(positions.len(), 1.0);
    params.target_density = target_density;
    run_until(&mut sph, &params, Stage::Density);

    let mut checked = 0;
    for (p, rho) in positions.iter().zip(sph.densities()) {
        // at least one smoothing radius away from the block's edge
        if p.x.abs() <= 1.0 && p.y.abs() <= 1.0 {
            let err = (rho - target_density).abs() / target_density;
            assert!(err < 0.03, "density {rho} at {p}");
            checked += 1;
        }
    }
    assert!(checked > 100);
}

#[test]
fn unit_square_is_symmetric() {
    let corners = vec![
        Vec2::new(-0.5, -0.5),
        Vec2::new(0.5, -0.5),
        Vec2::new(0.5, 0.5),
        Vec2::new(-0.5, 0.5),
    ];
    let mut sph = SPHState::new(InitialLayout::at_rest(corners.clone())).unwrap();
    let mut params = closed_params(4, 1.5);
    params.delta_time = 0.01;
    params.target_density = 1.0;

    sph.step(&params).unwrap();

    let rho = sph.densities();
    for d in rho {
        assert!((d - rho[0]).abs() <= rho[0] * 1e-5, "densities {rho:?}");
    }
    let near = sph.near_densities();
    for d in near {
        assert!((d - near[0]).abs() <= near[0] * 1e-5);
    }

    // net push on the centroid vanishes and each corner moves along its diagonal
    let velocities = sph.velocities();
    let net: Vec2 = velocities.iter().copied().sum();
    let total: f32 = velocities.iter().map(|v| v.length()).sum();
    assert!(total > 0.0);
    assert!(net.length() <= total * 1e-5, "net {net}");
    for (v, c) in velocities.iter().zip(&corners) {
        assert!(v.perp_dot(*c).abs() <= v.length() * 1e-4);
        assert!((v.length() - velocities[0].length()).abs() <= velocities[0].length() * 1e-4);
    }
}

#[test]
fn self_term_only_in_density() {
    // two particles on top of each other: each sees the other at distance 0
    let layout = InitialLayout::at_rest(vec![Vec2::new(0.2, 0.2), Vec2::new(0.2, 0.2)]);
    let mut sph = SPHState::new(layout).unwrap();
    let mut params = closed_params(2, 0.5);
    params.delta_time = 0.01;
    sph.step(&params).unwrap();

    for v in sph.velocities() {
        assert!(v.is_finite());
    }
    let kernels = bevy_sph2d::cpu::kernels::SmoothingKernels::new(0.5);
    assert!((sph.densities()[0] - 2.0 * kernels.density(0.0)).abs() < 1e-4);
}
