//! Per-ray mutable scratch space.

use std::any::Any;

use kdray_math::Vector;

/// Scratch state threaded through one camera ray and its recursion.
///
/// Workers own their state; it is never shared between threads.
pub struct RenderState {
    /// Recursion depth of the current ray
    pub ray_level: u32,
    pub depth: u32,
    pub contribution: f64,
    pub current_pass: u32,
    pub pixel_sample: u32,
    /// Stratification of samples across pixel subdivisions
    pub ray_division: u32,
    pub ray_offset: u32,
    pub dc1: f64,
    pub dc2: f64,
    pub traveled: f64,
    pub pixel_number: usize,
    pub sampling_offset: u32,
    /// Pixel position mapped to `[-1, 1]`, y up
    pub screen_pos: Vector,
    pub chromatic: bool,
    pub include_lights: bool,
    pub wavelength: f64,
    pub time: f64,
    /// Transient data stashed by `Material::init_bsdf`
    pub material_data: Option<Box<dyn Any + Send>>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            ray_level: 0,
            depth: 0,
            contribution: 0.0,
            current_pass: 0,
            pixel_sample: 0,
            ray_division: 1,
            ray_offset: 0,
            dc1: 0.0,
            dc2: 0.0,
            traveled: 0.0,
            pixel_number: 0,
            sampling_offset: 0,
            screen_pos: Vector::ZERO,
            chromatic: true,
            include_lights: false,
            wavelength: 0.0,
            time: 0.0,
            material_data: None,
        }
    }
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the state of a fresh camera ray.
    pub fn set_defaults(&mut self) {
        *self = Self::default();
    }

    /// Borrow the material data as a concrete type.
    pub fn material_data<T: 'static>(&self) -> Option<&T> {
        self.material_data.as_deref().and_then(|d| d.downcast_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let mut state = RenderState::new();
        assert_eq!(state.ray_division, 1);
        assert!(state.chromatic);
        state.ray_level = 4;
        state.material_data = Some(Box::new(3.5f64));
        assert_eq!(state.material_data::<f64>(), Some(&3.5));
        assert_eq!(state.material_data::<u32>(), None);
        state.set_defaults();
        assert_eq!(state.ray_level, 0);
        assert!(state.material_data.is_none());
    }
}
