pub mod error;
pub mod plugin;

pub mod cpu {
    pub mod collision;
    pub mod kernels;
    pub mod params;
    pub mod spatial_hash;
    pub mod sph2d;
}

pub mod gpu {
    pub mod ffi;
}

pub use cpu::params::{
    BoxCollider, CircleCollider, Colliders, FluidSettings, InteractionInput, SimParams,
};
pub use cpu::sph2d::{InitialLayout, SPHState, Stage};
pub use error::{ConfigError, SimError};
pub use plugin::{SimControl, SphPlugin, StepCompleted};
