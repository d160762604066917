use kdray_math::{Bound, Ray, Rgb};

use crate::light::Light;
use crate::state::RenderState;

/// Colour seen by rays that leave the scene.
pub trait Background: Send + Sync {
    fn color(&self, ray: &Ray, state: &RenderState, filtered: bool) -> Rgb;

    /// Light standing in for background illumination, if it is sampled
    /// as a light and not only through BSDF rays.
    fn light(&self) -> Option<&dyn Light> {
        None
    }

    /// Forwarded to the background light on scene update.
    fn set_scene(&mut self, _bound: &Bound) {}
}
