use bevy::prelude::Resource;
use glam::Vec2;

use crate::error::{ConfigError, SimError};

/// Oriented box obstacle. `forward` is the box's local x axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxCollider {
    pub center: Vec2,
    pub size: Vec2,
    pub forward: Vec2,
}

impl BoxCollider {
    pub fn axis_aligned(center: Vec2, size: Vec2) -> Self {
        Self { center, size, forward: Vec2::X }
    }

    pub fn rotated(center: Vec2, size: Vec2, angle: f32) -> Self {
        Self { center, size, forward: Vec2::from_angle(angle) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleCollider {
    pub center: Vec2,
    pub radius: f32,
}

/// Everything one step reads from the host. Built fresh each step and never
/// mutated while the passes run.
#[derive(Clone, Debug, PartialEq)]
pub struct SimParams {
    pub num_particles: usize,
    pub delta_time: f32,
    pub gravity: f32,
    pub collision_damping: f32,
    pub smoothing_radius: f32,
    pub target_density: f32,
    pub pressure_multiplier: f32,
    pub near_pressure_multiplier: f32,
    pub viscosity_strength: f32,
    pub bounds_half_extent: Vec2,
    pub interaction_point: Vec2,
    // positive pulls toward the point, negative pushes away, zero disables
    pub interaction_strength: f32,
    pub interaction_radius: f32,
    pub box_colliders: Vec<BoxCollider>,
    pub circle_colliders: Vec<CircleCollider>,
}

impl SimParams {
    /// Defaults from [`FluidSettings::default`] with no interaction and no obstacles.
    pub fn new(num_particles: usize, delta_time: f32) -> Self {
        let settings = FluidSettings::default();
        Self {
            num_particles,
            delta_time,
            gravity: settings.gravity,
            collision_damping: settings.collision_damping,
            smoothing_radius: settings.smoothing_radius,
            target_density: settings.target_density,
            pressure_multiplier: settings.pressure_multiplier,
            near_pressure_multiplier: settings.near_pressure_multiplier,
            viscosity_strength: settings.viscosity_strength,
            bounds_half_extent: settings.bounds_size * 0.5,
            interaction_point: Vec2::ZERO,
            interaction_strength: 0.0,
            interaction_radius: settings.interaction_radius,
            box_colliders: Vec::new(),
            circle_colliders: Vec::new(),
        }
    }

    /// Rejects anything that would poison the kernel constants or the hash
    /// table before a single pass runs.
    pub fn validate(&self, capacity: usize) -> Result<(), SimError> {
        if self.num_particles == 0 {
            return Err(ConfigError::NoParticles.into());
        }
        if self.num_particles > capacity {
            return Err(SimError::Capacity {
                requested: self.num_particles,
                capacity,
            });
        }
        if !(self.smoothing_radius > 0.0 && self.smoothing_radius.is_finite()) {
            return Err(ConfigError::SmoothingRadius(self.smoothing_radius).into());
        }
        if !(self.target_density > 0.0 && self.target_density.is_finite()) {
            return Err(ConfigError::TargetDensity(self.target_density).into());
        }
        if !(self.delta_time >= 0.0 && self.delta_time.is_finite()) {
            return Err(ConfigError::DeltaTime(self.delta_time).into());
        }
        if !(0.0..=1.0).contains(&self.collision_damping) {
            return Err(ConfigError::CollisionDamping(self.collision_damping).into());
        }
        if !(self.bounds_half_extent.cmpge(Vec2::ZERO).all() && self.bounds_half_extent.is_finite())
        {
            return Err(ConfigError::Bounds(self.bounds_half_extent).into());
        }
        if !(self.interaction_radius >= 0.0) {
            return Err(ConfigError::InteractionRadius(self.interaction_radius).into());
        }
        for (index, collider) in self.box_colliders.iter().enumerate() {
            if collider.forward.length_squared() < 1e-12 || collider.size.cmplt(Vec2::ZERO).any() {
                return Err(ConfigError::BoxCollider { index }.into());
            }
        }
        for (index, collider) in self.circle_colliders.iter().enumerate() {
            if !(collider.radius >= 0.0) {
                return Err(ConfigError::CircleCollider { index }.into());
            }
        }
        Ok(())
    }
}

/// Host-side tuning knobs, turned into a [`SimParams`] per substep.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct FluidSettings {
    pub time_scale: f32,
    pub max_timestep_fps: f32,
    pub iterations_per_frame: u32,
    pub gravity: f32,
    pub collision_damping: f32,
    pub smoothing_radius: f32,
    pub target_density: f32,
    pub pressure_multiplier: f32,
    pub near_pressure_multiplier: f32,
    pub viscosity_strength: f32,
    pub bounds_size: Vec2, // full size, centered on the origin
    pub interaction_radius: f32,
    pub interaction_strength: f32,
}

impl Default for FluidSettings {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_timestep_fps: 60.0,
            iterations_per_frame: 3,
            gravity: -12.0,
            collision_damping: 0.95,
            smoothing_radius: 0.35,
            target_density: 55.0,
            pressure_multiplier: 500.0,
            near_pressure_multiplier: 18.0,
            viscosity_strength: 0.06,
            bounds_size: Vec2::new(17.1, 9.3),
            interaction_radius: 2.0,
            interaction_strength: 90.0,
        }
    }
}

/// Cursor-driven force field. `strength_sign` is +1 to pull, -1 to push, 0 off.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq)]
pub struct InteractionInput {
    pub point: Vec2,
    pub strength_sign: f32,
}

/// Obstacles supplied by the host for the current frame, checked in order.
#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct Colliders {
    pub boxes: Vec<BoxCollider>,
    pub circles: Vec<CircleCollider>,
}

impl FluidSettings {
    /// Length of one substep for a frame that took `frame_dt` seconds.
    pub fn substep_dt(&self, frame_dt: f32) -> f32 {
        let max_dt = if self.max_timestep_fps > 0.0 {
            1.0 / self.max_timestep_fps
        } else {
            f32::INFINITY
        };
        let frame_time = (frame_dt * self.time_scale).min(max_dt);
        frame_time / self.iterations_per_frame.max(1) as f32
    }

    pub fn frame_params(
        &self,
        frame_dt: f32,
        num_particles: usize,
        interaction: &InteractionInput,
        colliders: &Colliders,
    ) -> SimParams {
        SimParams {
            num_particles,
            delta_time: self.substep_dt(frame_dt),
            gravity: self.gravity,
            collision_damping: self.collision_damping,
            smoothing_radius: self.smoothing_radius,
            target_density: self.target_density,
            pressure_multiplier: self.pressure_multiplier,
            near_pressure_multiplier: self.near_pressure_multiplier,
            viscosity_strength: self.viscosity_strength,
            bounds_half_extent: self.bounds_size * 0.5,
            interaction_point: interaction.point,
            interaction_strength: self.interaction_strength * interaction.strength_sign,
            interaction_radius: self.interaction_radius,
            box_colliders: colliders.boxes.clone(),
            circle_colliders: colliders.circles.clone(),
        }
    }
}
