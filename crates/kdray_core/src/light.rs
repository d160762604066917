//! The light contract.

use bitflags::bitflags;
use kdray_math::{Bound, Ray, Rgb, Vector};

use crate::surface::SurfacePoint;

bitflags! {
    /// Light classification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LightFlags: u32 {
        /// Delta directional distribution
        const DIRAC_DIR = 1 << 0;
        const SINGULAR = 1 << 1;
    }
}

/// Sample values and results for light sampling.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightSample {
    /// Chooses a point on the light surface
    pub s1: f64,
    pub s2: f64,
    /// Chooses an outgoing direction (`emit_sample`)
    pub s3: f64,
    pub s4: f64,
    /// Solid-angle density as seen from the illuminated point
    pub pdf: f64,
    pub dir_pdf: f64,
    pub area_pdf: f64,
    pub color: Rgb,
    pub flags: LightFlags,
    /// Sampled point on the light
    pub position: Vector,
    pub normal: Vector,
}

impl LightSample {
    pub fn new(s1: f64, s2: f64) -> Self {
        Self {
            s1,
            s2,
            ..Default::default()
        }
    }
}

/// Something that illuminates the scene.
pub trait Light: Send + Sync {
    fn flags(&self) -> LightFlags;

    /// Precompute scene-dependent quantities.
    fn set_scene(&mut self, _bound: &Bound) {}

    /// Preferred sample count for direct lighting.
    fn num_samples(&self) -> u32 {
        1
    }

    /// Energy emitted over a frame.
    fn total_energy(&self) -> Rgb;

    /// Colour, ray and inverse pdf of an emitted photon.
    fn emit_photon(&self, s1: f64, s2: f64, s3: f64, s4: f64) -> (Rgb, Ray, f64);

    /// Emission sample for bidirectional methods. Returns the direction and colour.
    fn emit_sample(&self, s: &mut LightSample) -> (Vector, Rgb);

    /// `(area_pdf, dir_pdf, cos_wo)` matching `emit_sample`.
    fn emit_pdf(&self, sp: &SurfacePoint<'_>, wo: Vector) -> (f64, f64, f64);

    fn can_illuminate(&self, _p: Vector) -> bool {
        true
    }

    /// Sample the illumination arriving at `sp`. Fills `wi` with the shadow
    /// ray toward the light and `s` with its colour and pdf.
    fn illuminate_sample(&self, sp: &SurfacePoint<'_>, wi: &mut Ray, s: &mut LightSample) -> bool;

    /// Density of `illuminate_sample` choosing `light_point` from `sp`.
    fn illuminate_pdf(&self, _sp: &SurfacePoint<'_>, _light_point: &SurfacePoint<'_>) -> f64 {
        0.0
    }

    fn as_dirac(&self) -> Option<&dyn DiracLight> {
        None
    }

    fn as_intersecter(&self) -> Option<&dyn LightIntersecter> {
        None
    }
}

/// A light with a delta directional distribution.
pub trait DiracLight {
    /// Light arriving at `sp`; fills `wi` with the shadow ray.
    fn illuminate(&self, sp: &SurfacePoint<'_>, wi: &mut Ray) -> Option<Rgb>;
}

/// A light that BSDF-sampled rays can hit.
pub trait LightIntersecter {
    /// `(distance, colour, 1/pdf)` of the ray hitting the light.
    fn intersect(&self, ray: &Ray) -> Option<(f64, Rgb, f64)>;
}
