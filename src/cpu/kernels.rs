// 2D smoothing kernels, normalised over the disc of radius h
use std::f32::consts::PI;

/// Scaling constants for the four kernels, computed once per step from `h`.
///
/// Each kernel integrates to 1 over the 2D disc, so a particle of unit mass
/// contributes unit mass to the density field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothingKernels {
    pub h: f32,
    h2: f32,
    density_scale: f32,            // (h - r)^2
    near_density_scale: f32,       // (h - r)^3
    density_derivative_scale: f32, // d/dr (h - r)^2
    near_derivative_scale: f32,    // d/dr (h - r)^3
    viscosity_scale: f32,          // poly6 (h^2 - r^2)^3
}

impl SmoothingKernels {
    pub fn new(h: f32) -> Self {
        Self {
            h,
            h2: h * h,
            density_scale: 6.0 / (PI * h.powi(4)),
            near_density_scale: 10.0 / (PI * h.powi(5)),
            density_derivative_scale: 12.0 / (PI * h.powi(4)),
            near_derivative_scale: 30.0 / (PI * h.powi(5)),
            viscosity_scale: 4.0 / (PI * h.powi(8)),
        }
    }

    #[inline]
    pub fn density(&self, dst: f32) -> f32 {
        if dst >= self.h {
            return 0.0;
        }
        let v = self.h - dst;
        v * v * self.density_scale
    }

    #[inline]
    pub fn near_density(&self, dst: f32) -> f32 {
        if dst >= self.h {
            return 0.0;
        }
        let v = self.h - dst;
        v * v * v * self.near_density_scale
    }

    /// Slope of [`Self::density`] w.r.t. distance; never positive.
    #[inline]
    pub fn density_derivative(&self, dst: f32) -> f32 {
        if dst >= self.h {
            return 0.0;
        }
        -(self.h - dst) * self.density_derivative_scale
    }

    /// Slope of [`Self::near_density`] w.r.t. distance; never positive.
    #[inline]
    pub fn near_density_derivative(&self, dst: f32) -> f32 {
        if dst >= self.h {
            return 0.0;
        }
        let v = self.h - dst;
        -v * v * self.near_derivative_scale
    }

    #[inline]
    pub fn viscosity(&self, dst: f32) -> f32 {
        if dst >= self.h {
            return 0.0;
        }
        let v = self.h2 - dst * dst;
        v * v * v * self.viscosity_scale
    }
}
