use bevy_sph2d::cpu::collision::{resolve_bounds, resolve_box, resolve_circle, resolve_collisions};
use bevy_sph2d::{BoxCollider, CircleCollider, SimParams};
use glam::Vec2;

fn close(a: Vec2, b: Vec2) -> bool {
    (a - b).length() < 1e-5
}

#[test]
fn walls_clamp_and_reflect() {
    let half = Vec2::new(2.0, 1.0);

    let mut pos = Vec2::new(5.0, 0.0);
    let mut vel = Vec2::new(3.0, 1.0);
    resolve_bounds(&mut pos, &mut vel, half, 0.5);
    assert_eq!(pos, Vec2::new(2.0, 0.0));
    assert_eq!(vel, Vec2::new(-1.5, 1.0));

    let mut pos = Vec2::new(-3.0, -4.0);
    let mut vel = Vec2::new(-1.0, -2.0);
    resolve_bounds(&mut pos, &mut vel, half, 1.0);
    assert_eq!(pos, Vec2::new(-2.0, -1.0));
    assert_eq!(vel, Vec2::new(1.0, 2.0));

    // inside: untouched
    let mut pos = Vec2::new(0.5, 0.5);
    let mut vel = Vec2::new(1.0, 1.0);
    resolve_bounds(&mut pos, &mut vel, half, 0.5);
    assert_eq!((pos, vel), (Vec2::new(0.5, 0.5), Vec2::new(1.0, 1.0)));
}

#[test]
fn box_pushes_out_along_least_penetration() {
    let collider = BoxCollider::axis_aligned(Vec2::ZERO, Vec2::new(4.0, 2.0));

    let mut pos = Vec2::new(1.5, 0.2);
    let mut vel = Vec2::new(1.0, 1.0);
    assert!(resolve_box(&mut pos, &mut vel, &collider, 0.5));
    assert!(close(pos, Vec2::new(2.0, 0.2)));
    assert!(close(vel, Vec2::new(-0.5, 1.0)));

    let mut pos = Vec2::new(0.1, -0.9);
    let mut vel = Vec2::new(0.0, 2.0);
    assert!(resolve_box(&mut pos, &mut vel, &collider, 1.0));
    assert!(close(pos, Vec2::new(0.1, -1.0)));
    assert!(close(vel, Vec2::new(0.0, -2.0)));

    let mut pos = Vec2::new(3.0, 0.0);
    let mut vel = Vec2::ONE;
    assert!(!resolve_box(&mut pos, &mut vel, &collider, 0.5));
    assert_eq!((pos, vel), (Vec2::new(3.0, 0.0), Vec2::ONE));
}

#[test]
fn rotated_box_uses_its_own_frame() {
    // forward along +y: the long side now runs vertically
    let collider = BoxCollider {
        center: Vec2::ZERO,
        size: Vec2::new(4.0, 2.0),
        forward: Vec2::Y,
    };
    let mut pos = Vec2::new(0.2, 1.5);
    let mut vel = Vec2::new(0.0, 1.0);
    assert!(resolve_box(&mut pos, &mut vel, &collider, 0.5));
    assert!(close(pos, Vec2::new(0.2, 2.0)), "{pos}");
    assert!(close(vel, Vec2::new(0.0, -0.5)), "{vel}");

    // a point outside the rotated box but inside the unrotated one
    let mut pos = Vec2::new(1.5, 0.0);
    let mut vel = Vec2::ZERO;
    assert!(!resolve_box(&mut pos, &mut vel, &collider, 0.5));
}

#[test]
fn circle_pushes_to_rim() {
    let collider = CircleCollider { center: Vec2::ZERO, radius: 1.0 };

    let mut pos = Vec2::new(0.5, 0.0);
    let mut vel = Vec2::new(-1.0, 0.5);
    assert!(resolve_circle(&mut pos, &mut vel, &collider, 0.5));
    assert!(close(pos, Vec2::new(1.0, 0.0)));
    assert!(close(vel, Vec2::new(0.5, 0.5)));

    // moving outwards already: velocity kept
    let mut pos = Vec2::new(0.0, -0.5);
    let mut vel = Vec2::new(0.0, -2.0);
    assert!(resolve_circle(&mut pos, &mut vel, &collider, 0.5));
    assert!(close(pos, Vec2::new(0.0, -1.0)));
    assert_eq!(vel, Vec2::new(0.0, -2.0));

    // dead centre picks a fixed direction
    let mut pos = Vec2::ZERO;
    let mut vel = Vec2::ZERO;
    assert!(resolve_circle(&mut pos, &mut vel, &collider, 0.5));
    assert!(close(pos, Vec2::Y));
}

#[test]
fn first_listed_obstacle_wins() {
    let mut params = SimParams::new(1, 0.01);
    params.bounds_half_extent = Vec2::splat(10.0);
    params.collision_damping = 1.0;
    params.box_colliders = vec![
        BoxCollider::axis_aligned(Vec2::ZERO, Vec2::new(2.0, 2.0)),
        BoxCollider::axis_aligned(Vec2::new(1.0, 0.0), Vec2::new(2.0, 2.0)),
    ];

    // inside both; the first box pushes right, the second would push left
    let mut pos = Vec2::new(0.8, 0.0);
    let mut vel = Vec2::new(-1.0, 0.0);
    resolve_collisions(&mut pos, &mut vel, &params);
    assert!(close(pos, Vec2::new(1.0, 0.0)));
    assert!(close(vel, Vec2::new(1.0, 0.0)));

    params.box_colliders.reverse();
    let mut pos = Vec2::new(0.8, 0.0);
    let mut vel = Vec2::new(-1.0, 0.0);
    resolve_collisions(&mut pos, &mut vel, &params);
    assert!(close(pos, Vec2::new(0.0, 0.0)));
}

#[test]
fn obstacles_cannot_push_past_walls() {
    let mut params = SimParams::new(1, 0.01);
    params.bounds_half_extent = Vec2::new(2.0, 2.0);
    params.circle_colliders = vec![CircleCollider { center: Vec2::new(1.5, 0.0), radius: 1.0 }];

    // the rim lies at x = 2.5, beyond the wall
    let mut pos = Vec2::new(1.9, 0.0);
    let mut vel = Vec2::ZERO;
    resolve_collisions(&mut pos, &mut vel, &params);
    assert_eq!(pos, Vec2::new(2.0, 0.0));
}
