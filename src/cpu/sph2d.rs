// smoothed particle hydrodynamics in 2D, run as seven data-parallel passes
use bevy::log::{debug, info};
use bevy::prelude::Resource;
use glam::Vec2;
use rayon::prelude::*;

use crate::cpu::collision::resolve_collisions;
use crate::cpu::kernels::SmoothingKernels;
use crate::cpu::params::SimParams;
use crate::cpu::spatial_hash::SpatialHash;
use crate::error::{ConfigError, SimError};
use crate::gpu::ffi::GPUParticle;

// look-ahead used for the neighbour search, independent of the step length
const PREDICTION_FACTOR: f32 = 1.0 / 120.0;

/// Positions and velocities the simulation starts from and resets to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitialLayout {
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
}

impl InitialLayout {
    pub fn new(positions: Vec<Vec2>, velocities: Vec<Vec2>) -> Self {
        Self { positions, velocities }
    }

    pub fn at_rest(positions: Vec<Vec2>) -> Self {
        let velocities = vec![Vec2::ZERO; positions.len()];
        Self { positions, velocities }
    }

    /// `n_x` by `n_y` block at rest, row-major, centred on `centre`.
    pub fn grid(n_x: usize, n_y: usize, spacing: f32, centre: Vec2) -> Self {
        let size = Vec2::new(n_x.saturating_sub(1) as f32, n_y.saturating_sub(1) as f32) * spacing;
        let origin = centre - size * 0.5;
        let mut positions = Vec::with_capacity(n_x * n_y);
        for iy in 0..n_y {
            for ix in 0..n_x {
                positions.push(origin + Vec2::new(ix as f32, iy as f32) * spacing);
            }
        }
        Self::at_rest(positions)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn check(&self) -> Result<(), SimError> {
        if self.positions.len() != self.velocities.len() {
            return Err(ConfigError::LayoutMismatch {
                positions: self.positions.len(),
                velocities: self.velocities.len(),
            }
            .into());
        }
        if self.positions.is_empty() {
            return Err(ConfigError::NoParticles.into());
        }
        if self.positions.len() > u32::MAX as usize {
            return Err(SimError::Capacity {
                requested: self.positions.len(),
                capacity: u32::MAX as usize,
            });
        }
        Ok(())
    }
}

/// The passes of one step, in execution order. Each is a full barrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    ExternalForces,
    SpatialHashBuild,
    SpatialSort,
    Density,
    Pressure,
    Viscosity,
    Integrate,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::ExternalForces,
        Stage::SpatialHashBuild,
        Stage::SpatialSort,
        Stage::Density,
        Stage::Pressure,
        Stage::Viscosity,
        Stage::Integrate,
    ];
}

/// Validated parameters plus the kernel constants derived from them.
#[derive(Clone, Copy, Debug)]
pub struct StepContext<'a> {
    params: &'a SimParams,
    kernels: SmoothingKernels,
}

impl<'a> StepContext<'a> {
    pub fn params(&self) -> &'a SimParams {
        self.params
    }

    pub fn kernels(&self) -> &SmoothingKernels {
        &self.kernels
    }

    pub fn num_particles(&self) -> usize {
        self.params.num_particles
    }
}

#[derive(Resource)]
pub struct SPHState {
    positions: Vec<Vec2>,
    predicted_positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    densities: Vec<f32>,
    near_densities: Vec<f32>,
    // frozen velocities for the viscosity pass
    velocity_scratch: Vec<Vec2>,
    hash: SpatialHash,
    initial: InitialLayout,
    steps_completed: u64,
}

impl SPHState {
    /// Allocates every buffer for `layout.len()` particles and places them.
    pub fn new(layout: InitialLayout) -> Result<Self, SimError> {
        layout.check()?;
        let n = layout.len();

        let mut state = Self {
            positions: vec![Vec2::ZERO; n],
            predicted_positions: vec![Vec2::ZERO; n],
            velocities: vec![Vec2::ZERO; n],
            densities: vec![0.0; n],
            near_densities: vec![0.0; n],
            velocity_scratch: vec![Vec2::ZERO; n],
            hash: SpatialHash::with_capacity(n),
            initial: layout,
            steps_completed: 0,
        };
        state.load_initial();
        info!("SPH state allocated for {} particles", n);
        Ok(state)
    }

    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn steps_completed(&self) -> u64 {
        self.steps_completed
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn predicted_positions(&self) -> &[Vec2] {
        &self.predicted_positions
    }

    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    pub fn densities(&self) -> &[f32] {
        &self.densities
    }

    pub fn near_densities(&self) -> &[f32] {
        &self.near_densities
    }

    pub fn hash(&self) -> &SpatialHash {
        &self.hash
    }

    pub fn initial_layout(&self) -> &InitialLayout {
        &self.initial
    }

    /// Packed copy of the particle set for render upload.
    pub fn gpu_particles(&self) -> Vec<GPUParticle> {
        (0..self.capacity())
            .map(|i| GPUParticle {
                pos: self.positions[i].to_array(),
                vel: self.velocities[i].to_array(),
                density: self.densities[i],
                near_density: self.near_densities[i],
            })
            .collect()
    }

    /// Puts every particle back where the stored layout says.
    pub fn reset(&mut self) {
        self.load_initial();
        info!("SPH state reset ({} particles)", self.capacity());
    }

    /// Swaps the stored layout. It must fill the allocated buffers exactly.
    pub fn replace_layout(&mut self, layout: InitialLayout) -> Result<(), SimError> {
        layout.check()?;
        if layout.len() != self.capacity() {
            return Err(SimError::Capacity {
                requested: layout.len(),
                capacity: self.capacity(),
            });
        }
        self.initial = layout;
        Ok(())
    }

    fn load_initial(&mut self) {
        self.positions.copy_from_slice(&self.initial.positions);
        self.predicted_positions.copy_from_slice(&self.initial.positions);
        self.velocities.copy_from_slice(&self.initial.velocities);
        self.densities.fill(0.0);
        self.near_densities.fill(0.0);
    }

    /// Checks `params` against the buffers and derives the kernel constants.
    /// Nothing is mutated, so a rejected step leaves the previous state intact.
    pub fn prepare<'a>(&self, params: &'a SimParams) -> Result<StepContext<'a>, SimError> {
        params.validate(self.capacity())?;
        Ok(StepContext {
            params,
            kernels: SmoothingKernels::new(params.smoothing_radius),
        })
    }

    /// Advances the first `params.num_particles` particles by one step.
    pub fn step(&mut self, params: &SimParams) -> Result<(), SimError> {
        let ctx = self.prepare(params)?;
        for stage in Stage::ALL {
            self.run_stage(stage, &ctx);
        }
        self.steps_completed += 1;
        debug!(
            "SPH step {} done ({} particles, dt {})",
            self.steps_completed, params.num_particles, params.delta_time
        );
        Ok(())
    }

    /// Runs one pass over every active particle. Returns only after all of
    /// them have finished, so the next stage sees every write.
    pub fn run_stage(&mut self, stage: Stage, ctx: &StepContext<'_>) {
        match stage {
            Stage::ExternalForces => self.external_forces(ctx),
            Stage::SpatialHashBuild => {
                let n = ctx.num_particles();
                self.hash
                    .build(&self.predicted_positions[..n], ctx.params.smoothing_radius);
            }
            Stage::SpatialSort => self.hash.sort(),
            Stage::Density => self.density_pass(ctx),
            Stage::Pressure => self.pressure_pass(ctx),
            Stage::Viscosity => self.viscosity_pass(ctx),
            Stage::Integrate => self.integrate(ctx),
        }
    }

    fn external_forces(&mut self, ctx: &StepContext<'_>) {
        let n = ctx.num_particles();
        let params = ctx.params;
        let dt = params.delta_time;

        self.velocities[..n]
            .par_iter_mut()
            .zip(self.predicted_positions[..n].par_iter_mut())
            .zip(self.positions[..n].par_iter())
            .for_each(|((vel, predicted), &pos)| {
                *vel += external_acceleration(pos, *vel, params) * dt;
                *predicted = pos + *vel * PREDICTION_FACTOR;
            });
    }

    fn density_pass(&mut self, ctx: &StepContext<'_>) {
        let n = ctx.num_particles();
        let kernels = ctx.kernels;
        let predicted = &self.predicted_positions[..n];
        let hash = &self.hash;

        self.densities[..n]
            .par_iter_mut()
            .zip(self.near_densities[..n].par_iter_mut())
            .enumerate()
            .for_each(|(i, (density, near_density))| {
                let mut rho = 0.0;
                let mut near_rho = 0.0;
                // self included: a particle's own mass counts towards its density
                hash.for_each_neighbor(predicted[i], predicted, |_, sqr_dst| {
                    let dst = sqr_dst.sqrt();
                    rho += kernels.density(dst);
                    near_rho += kernels.near_density(dst);
                });
                *density = rho;
                *near_density = near_rho;
            });
    }

    fn pressure_pass(&mut self, ctx: &StepContext<'_>) {
        let n = ctx.num_particles();
        let params = ctx.params;
        let kernels = ctx.kernels;
        let dt = params.delta_time;
        let predicted = &self.predicted_positions[..n];
        let densities = &self.densities[..n];
        let near_densities = &self.near_densities[..n];
        let hash = &self.hash;

        let pressure_of = |rho: f32| (rho - params.target_density) * params.pressure_multiplier;
        let near_pressure_of = |near_rho: f32| near_rho * params.near_pressure_multiplier;

        self.velocities[..n]
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, vel)| {
                let pos = predicted[i];
                let density = densities[i];
                let pressure = pressure_of(density);
                let near_pressure = near_pressure_of(near_densities[i]);
                let mut force = Vec2::ZERO;

                hash.for_each_neighbor(pos, predicted, |j, sqr_dst| {
                    if j == i {
                        return;
                    }
                    let dst = sqr_dst.sqrt();
                    let dir = if dst > 0.0 { (predicted[j] - pos) / dst } else { Vec2::Y };

                    let neighbour_density = densities[j];
                    let neighbour_near_density = near_densities[j];
                    let shared_pressure = (pressure + pressure_of(neighbour_density)) * 0.5;
                    let shared_near_pressure =
                        (near_pressure + near_pressure_of(neighbour_near_density)) * 0.5;

                    force += dir * kernels.density_derivative(dst) * shared_pressure
                        / neighbour_density;
                    force += dir * kernels.near_density_derivative(dst) * shared_near_pressure
                        / neighbour_near_density;
                });

                *vel += force / density * dt;
            });
    }

    fn viscosity_pass(&mut self, ctx: &StepContext<'_>) {
        let n = ctx.num_particles();
        let params = ctx.params;
        let kernels = ctx.kernels;
        let scale = params.viscosity_strength * params.delta_time;

        self.velocity_scratch[..n].copy_from_slice(&self.velocities[..n]);
        let frozen = &self.velocity_scratch[..n];
        let predicted = &self.predicted_positions[..n];
        let hash = &self.hash;

        self.velocities[..n]
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, vel)| {
                let own = frozen[i];
                let mut force = Vec2::ZERO;
                hash.for_each_neighbor(predicted[i], predicted, |j, sqr_dst| {
                    if j == i {
                        return;
                    }
                    force += (frozen[j] - own) * kernels.viscosity(sqr_dst.sqrt());
                });
                *vel += force * scale;
            });
    }

    fn integrate(&mut self, ctx: &StepContext<'_>) {
        let n = ctx.num_particles();
        let params = ctx.params;
        let dt = params.delta_time;

        self.positions[..n]
            .par_iter_mut()
            .zip(self.velocities[..n].par_iter_mut())
            .for_each(|(pos, vel)| {
                *pos += *vel * dt;
                resolve_collisions(pos, vel, params);
            });
    }
}

/// Gravity, blended near the interaction point with a pull (or push) towards
/// it and a drag that calms particles caught in the field.
pub fn external_acceleration(pos: Vec2, vel: Vec2, params: &SimParams) -> Vec2 {
    let gravity = Vec2::new(0.0, params.gravity);
    let strength = params.interaction_strength;
    let radius = params.interaction_radius;
    if strength == 0.0 {
        return gravity;
    }

    let offset = params.interaction_point - pos;
    let sqr_dst = offset.length_squared();
    if sqr_dst >= radius * radius {
        return gravity;
    }

    let dst = sqr_dst.sqrt();
    let centre_t = 1.0 - dst / radius;
    let dir_to_centre = if dst > 0.0 { offset / dst } else { Vec2::ZERO };
    let gravity_weight = 1.0 - centre_t * (strength / 10.0).clamp(0.0, 1.0);

    gravity * gravity_weight + dir_to_centre * centre_t * strength - vel * centre_t
}
