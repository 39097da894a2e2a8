// collision response against the world box and static obstacles
use glam::Vec2;

use crate::cpu::params::{BoxCollider, CircleCollider, SimParams};

/// Clamp to the world box; each axis that hit a wall reflects and damps.
#[inline]
pub fn resolve_bounds(pos: &mut Vec2, vel: &mut Vec2, half_extent: Vec2, damping: f32) {
    let edge_dst = half_extent - pos.abs();

    if edge_dst.x <= 0.0 {
        pos.x = half_extent.x * pos.x.signum();
        vel.x *= -damping;
    }
    if edge_dst.y <= 0.0 {
        pos.y = half_extent.y * pos.y.signum();
        vel.y *= -damping;
    }
}

/// Pushes a particle inside `collider` out along the local axis of least
/// penetration. Returns true if there was contact.
pub fn resolve_box(pos: &mut Vec2, vel: &mut Vec2, collider: &BoxCollider, damping: f32) -> bool {
    let x_axis = collider.forward.normalize_or(Vec2::X);
    let y_axis = x_axis.perp();
    let half = collider.size * 0.5;

    // into the box frame
    let rel = *pos - collider.center;
    let mut local_pos = Vec2::new(rel.dot(x_axis), rel.dot(y_axis));
    let mut local_vel = Vec2::new(vel.dot(x_axis), vel.dot(y_axis));

    let edge_dst = half - local_pos.abs();
    if edge_dst.x < 0.0 || edge_dst.y < 0.0 {
        return false;
    }

    if edge_dst.x < edge_dst.y {
        local_pos.x = half.x * local_pos.x.signum();
        local_vel.x *= -damping;
    } else {
        local_pos.y = half.y * local_pos.y.signum();
        local_vel.y *= -damping;
    }

    // back to world
    *pos = collider.center + x_axis * local_pos.x + y_axis * local_pos.y;
    *vel = x_axis * local_vel.x + y_axis * local_vel.y;
    true
}

/// Moves a particle inside the circle onto its rim and reflects the inward
/// normal velocity. Returns true if there was contact.
pub fn resolve_circle(
    pos: &mut Vec2,
    vel: &mut Vec2,
    collider: &CircleCollider,
    damping: f32,
) -> bool {
    let offset = *pos - collider.center;
    let sqr_dst = offset.length_squared();
    if sqr_dst >= collider.radius * collider.radius {
        return false;
    }

    let dst = sqr_dst.sqrt();
    let normal = if dst > 0.0 { offset / dst } else { Vec2::Y };
    *pos = collider.center + normal * collider.radius;

    let normal_speed = vel.dot(normal);
    if normal_speed < 0.0 {
        *vel -= normal * normal_speed * (1.0 + damping);
    }
    true
}

/// Full collision sequence for one particle: world bounds, then obstacles in
/// list order (boxes before circles). The first obstacle in contact wins.
pub fn resolve_collisions(pos: &mut Vec2, vel: &mut Vec2, params: &SimParams) {
    let half_extent = params.bounds_half_extent;
    let damping = params.collision_damping;

    resolve_bounds(pos, vel, half_extent, damping);

    let hit_box = params
        .box_colliders
        .iter()
        .any(|collider| resolve_box(pos, vel, collider, damping));
    if !hit_box {
        for collider in &params.circle_colliders {
            if resolve_circle(pos, vel, collider, damping) {
                break;
            }
        }
    }

    // an obstacle straddling the wall must not push particles out of the world
    *pos = pos.clamp(-half_extent, half_extent);
}
