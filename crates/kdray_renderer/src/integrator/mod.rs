//! Surface integrators.
//!
//! An integrator turns one camera ray into a colour with alpha. It is
//! shared by every render worker, so all per-ray scratch lives in the
//! [`RenderState`] the caller passes in.

mod direct;
mod trivial;
mod util;

pub use direct::{AoConfig, DirectLightConfig, DirectLighting};
pub use trivial::Trivial;
pub use util::{estimate_area, estimate_dirac, estimate_direct, estimate_photons, mis_weight, sample_ao, ShadowMode, RAY_SELF_BIAS};

use kdray_core::{RenderState, Scene};
use kdray_math::{DifferentialRay, Rgba};

pub trait Integrator: Send + Sync {
    /// Called once per frame after the scene update, before any pixel.
    fn preprocess(&mut self, _scene: &Scene) {}

    /// Radiance arriving along `ray`, with coverage in alpha.
    fn integrate(&self, scene: &Scene, state: &mut RenderState, ray: &DifferentialRay) -> Rgba;
}
