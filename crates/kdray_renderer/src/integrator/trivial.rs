use kdray_core::{RenderState, Scene};
use kdray_math::{DifferentialRay, Rgb, Rgba};

use super::Integrator;

/// White where the ray hits something, transparent grey elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Trivial;

impl Integrator for Trivial {
    fn integrate(&self, scene: &Scene, _state: &mut RenderState, ray: &DifferentialRay) -> Rgba {
        if scene.intersect(&ray.ray, -1.0).is_some() {
            Rgba::from_rgb(Rgb::WHITE, 1.0)
        } else {
            Rgba::from_rgb(Rgb::gray(0.1), 0.0)
        }
    }
}
