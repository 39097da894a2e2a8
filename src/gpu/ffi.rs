use bytemuck::{Pod, Zeroable};

/// Per-particle record handed to the host's render buffers after a step.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GPUParticle {
    // not using glam to make sure WGSL compatibility
    pub pos: [f32; 2],
    pub vel: [f32; 2],
    pub density: f32,
    pub near_density: f32,
}
