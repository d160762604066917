//! The material contract.
//!
//! A material is a BSDF plus optional capabilities (transparency, emission,
//! volumetric handling) that callers discover through the `as_*` accessors.

use bitflags::bitflags;
use kdray_math::{Ray, Rgb, Vector};

use crate::sampling::{cos_hemisphere, van_der_corput, Halton};
use crate::state::RenderState;
use crate::surface::SurfacePoint;

/// Samples below this density are discarded.
pub const PDF_CUTOFF: f64 = 1e-6;

bitflags! {
    /// Components of a bidirectional scattering distribution function.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Bsdf: u32 {
        const SPECULAR = 1 << 0;
        const GLOSSY = 1 << 1;
        const DIFFUSE = 1 << 2;
        const DISPERSIVE = 1 << 3;
        const REFLECT = 1 << 4;
        const TRANSMIT = 1 << 5;
        const FILTER = 1 << 6;
        const EMIT = 1 << 7;
        const VOLUMETRIC = 1 << 8;

        const ALL_SPECULAR = Self::SPECULAR.bits() | Self::REFLECT.bits() | Self::TRANSMIT.bits();
        const ALL = Self::SPECULAR.bits()
            | Self::GLOSSY.bits()
            | Self::DIFFUSE.bits()
            | Self::DISPERSIVE.bits()
            | Self::REFLECT.bits()
            | Self::TRANSMIT.bits()
            | Self::FILTER.bits();
    }
}

/// Input and output of `Material::sample`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSample {
    pub s1: f64,
    pub s2: f64,
    /// Filled by the material; zero marks an invalid sample
    pub pdf: f64,
    /// Components the caller allows
    pub flags: Bsdf,
    /// Component the material picked
    pub sampled_flags: Bsdf,
    pub reverse: bool,
    pub pdf_back: f64,
    pub color_back: Rgb,
}

impl MaterialSample {
    pub fn new(s1: f64, s2: f64) -> Self {
        Self {
            s1,
            s2,
            pdf: 0.0,
            flags: Bsdf::ALL,
            sampled_flags: Bsdf::empty(),
            reverse: false,
            pdf_back: 0.0,
            color_back: Rgb::BLACK,
        }
    }

    pub fn with_flags(mut self, flags: Bsdf) -> Self {
        self.flags = flags;
        self
    }
}

/// A material sample carrying photon throughput.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotonSample {
    pub sample: MaterialSample,
    pub s3: f64,
    /// Photon colour after the previous bounce
    pub last_color: Rgb,
    /// Filter between the last bounce and this one
    pub alpha: Rgb,
    /// Photon colour after this bounce
    pub color: Rgb,
}

impl PhotonSample {
    pub fn new(s1: f64, s2: f64, s3: f64, flags: Bsdf, last_color: Rgb) -> Self {
        Self {
            sample: MaterialSample::new(s1, s2).with_flags(flags),
            s3,
            last_color,
            alpha: Rgb::WHITE,
            color: Rgb::BLACK,
        }
    }
}

/// A Dirac direction with its colour weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpecularRay {
    pub dir: Vector,
    pub color: Rgb,
}

/// Deterministic reflection and refraction at a surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Specular {
    pub reflect: Option<SpecularRay>,
    pub refract: Option<SpecularRay>,
}

/// Surface scattering behaviour.
///
/// `init_bsdf` must be called for a surface point before `eval`, `sample`,
/// `pdf` or `specular`; it may stash per-hit data in
/// `RenderState::material_data`.
pub trait Material: Send + Sync {
    fn init_bsdf(&self, state: &mut RenderState, sp: &SurfacePoint<'_>) -> Bsdf;

    /// Every component this material can ever have.
    fn flags(&self) -> Bsdf;

    /// BSDF value for the given components. The cosine term is left to the caller.
    fn eval(&self, state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector, wl: Vector, types: Bsdf) -> Rgb;

    /// Sample an incoming direction, filling `s.pdf` and `s.sampled_flags`.
    fn sample(&self, state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector, s: &mut MaterialSample) -> (Rgb, Vector);

    /// Solid-angle density of `sample` producing `wi`.
    fn pdf(&self, _state: &RenderState, _sp: &SurfacePoint<'_>, _wo: Vector, _wi: Vector, _types: Bsdf) -> f64 {
        0.0
    }

    fn specular(&self, _state: &RenderState, _sp: &SurfacePoint<'_>, _wo: Vector) -> Specular {
        Specular::default()
    }

    /// Overall reflectivity, estimated with sixteen stratified samples.
    fn reflectivity(&self, state: &RenderState, sp: &SurfacePoint<'_>, flags: Bsdf) -> Rgb {
        const N: u32 = 16;
        if (flags & (Bsdf::TRANSMIT | Bsdf::REFLECT) & self.flags()).is_empty() {
            return Rgb::BLACK;
        }
        let mut h1 = Halton::new(3);
        let mut h2 = Halton::new(5);
        let mut col = Rgb::BLACK;
        for i in 0..N {
            let s1 = (f64::from(i) + 0.5) / f64::from(N);
            let s2 = van_der_corput(i, 0);
            let wo = cos_hemisphere(sp.normal, sp.normal_u, sp.normal_v, s1, s2);
            let mut s = MaterialSample::new(h1.next_value(), h2.next_value()).with_flags(flags);
            let (c, wi) = self.sample(state, sp, wo, &mut s);
            if s.pdf > PDF_CUTOFF {
                col += c * (wi.dot(sp.normal).abs() / s.pdf);
            }
        }
        col / f64::from(N)
    }

    /// Coverage in `[0, 1]`; 1 is opaque.
    fn alpha(&self, _state: &RenderState, _sp: &SurfacePoint<'_>, _wo: Vector) -> f64 {
        1.0
    }

    /// Scatter a photon with Russian roulette on throughput.
    fn scatter_photon(&self, state: &RenderState, sp: &SurfacePoint<'_>, wi: Vector, s: &mut PhotonSample) -> Option<Vector> {
        let (scol, wo) = self.sample(state, sp, wi, &mut s.sample);
        if s.sample.pdf <= PDF_CUTOFF {
            return None;
        }
        let cnew = s.last_color * s.alpha * scol * (wo.dot(sp.normal).abs() / s.sample.pdf);
        let old_max = s.last_color.max_channel();
        if old_max <= 0.0 {
            return None;
        }
        let prob = (cnew.max_channel() / old_max).min(1.0);
        if prob > 0.0 && s.s3 <= prob {
            s.color = cnew * (1.0 / prob);
            Some(wo)
        } else {
            None
        }
    }

    /// Relative index of refraction used for differential propagation.
    fn ior(&self) -> f64 {
        1.0
    }

    fn as_transparent(&self) -> Option<&dyn TransparentMaterial> {
        None
    }

    fn as_emitter(&self) -> Option<&dyn EmitMaterial> {
        None
    }

    fn as_volumetric(&self) -> Option<&dyn VolumetricMaterial> {
        None
    }
}

/// A material that lets light through.
pub trait TransparentMaterial {
    /// Filter applied to light passing through; black means opaque.
    fn transparency(&self, state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector) -> Rgb;
}

/// A material that contributes light.
pub trait EmitMaterial {
    fn emit(&self, state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector) -> Rgb;
}

/// A material aware of participating media inside its object.
pub trait VolumetricMaterial {
    /// Attenuation along `ray` inside the object, if any.
    fn volume_transmittance(&self, state: &RenderState, sp: &SurfacePoint<'_>, ray: &Ray) -> Option<Rgb>;
}
