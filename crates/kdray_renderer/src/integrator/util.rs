//! Light transport estimators shared by the surface integrators.

use kdray_core::light::{DiracLight, Light, LightSample};
use kdray_core::photon::{self, PhotonMap};
use kdray_core::sampling::{add_mod1, van_der_corput, Halton};
use kdray_core::{Bsdf, Material, MaterialSample, RenderState, Scene, SurfacePoint, PDF_CUTOFF};
use kdray_math::{Ray, Rgb, Vector};

use super::direct::AoConfig;

/// Offset of secondary ray origins from the surface they leave.
pub const RAY_SELF_BIAS: f64 = 0.0005;

/// Components considered when weighting light samples against BSDF samples.
const MIS_FLAGS: Bsdf = Bsdf::GLOSSY
    .union(Bsdf::DIFFUSE)
    .union(Bsdf::DISPERSIVE)
    .union(Bsdf::REFLECT)
    .union(Bsdf::TRANSMIT);

/// How shadow rays are traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowMode {
    /// Let light through transparent surfaces, filtered by their colour
    pub transparent: bool,
    /// Transparent surfaces crossed before giving up
    pub depth: u32,
}

/// Power heuristic weight, exponent 2, for a sample drawn with density `a`
/// when the other strategy has density `b`.
pub fn mis_weight(a: f64, b: f64) -> f64 {
    let (a2, b2) = (a * a, b * b);
    if a2 + b2 > 0.0 {
        a2 / (a2 + b2)
    } else {
        0.0
    }
}

/// Light let through along a shadow ray, or `None` if it is blocked.
fn shadow_filter(state: &RenderState, scene: &Scene, ray: &Ray, mode: ShadowMode) -> Option<Rgb> {
    if mode.transparent {
        let (filter, blocked) = scene.transparent_shadow(state, ray, mode.depth, -1.0);
        (!blocked).then_some(filter)
    } else if scene.shadowed(ray, -1.0) {
        None
    } else {
        Some(Rgb::WHITE)
    }
}

/// Shadow ray leaving `sp`; the light fills in direction and length.
fn light_ray(sp: &SurfacePoint<'_>) -> Ray {
    Ray::new(sp.position, Vector::Z).with_range(RAY_SELF_BIAS, -1.0)
}

/// Sample count for `requested` samples, split across pixel subdivisions,
/// and the offset into the sample sequences for this pixel sample.
fn sample_budget(state: &RenderState, requested: u32) -> (u32, u32) {
    let n = (requested / state.ray_division.max(1)).max(1);
    let offset = n.wrapping_mul(state.pixel_sample).wrapping_add(state.sampling_offset);
    (n, offset)
}

/// Decorrelate a sample pair between pixel subdivisions.
fn divide(state: &RenderState, s1: f64, s2: f64) -> (f64, f64) {
    if state.ray_division > 1 {
        (add_mod1(s1, state.dc1), add_mod1(s2, state.dc2))
    } else {
        (s1, s2)
    }
}

/// Direct illumination at `sp` from every light in the scene, including a
/// background light.
pub fn estimate_direct(
    state: &RenderState,
    scene: &Scene,
    sp: &SurfacePoint<'_>,
    material: &dyn Material,
    wo: Vector,
    mode: ShadowMode,
) -> Rgb {
    let background_light = scene.background().and_then(|bg| bg.light());
    scene
        .lights()
        .iter()
        .map(|l| l.as_ref())
        .chain(background_light)
        .fold(Rgb::BLACK, |col, light| {
            let contribution = match light.as_dirac() {
                Some(dirac) => estimate_dirac(state, scene, sp, material, dirac, wo, mode),
                None => estimate_area(state, scene, sp, material, light, wo, mode),
            };
            col + contribution
        })
}

/// Contribution of a light with a delta distribution.
pub fn estimate_dirac(
    state: &RenderState,
    scene: &Scene,
    sp: &SurfacePoint<'_>,
    material: &dyn Material,
    light: &dyn DiracLight,
    wo: Vector,
    mode: ShadowMode,
) -> Rgb {
    let mut wi = light_ray(sp);
    let Some(lcol) = light.illuminate(sp, &mut wi) else {
        return Rgb::BLACK;
    };
    let Some(filter) = shadow_filter(state, scene, &wi, mode) else {
        return Rgb::BLACK;
    };
    let surf = material.eval(state, sp, wo, wi.dir, Bsdf::ALL);
    surf * lcol * filter * sp.normal.dot(wi.dir).abs()
}

/// Contribution of an area light, combining light and BSDF sampling with
/// the power heuristic when the light can be hit by BSDF rays.
pub fn estimate_area(
    state: &RenderState,
    scene: &Scene,
    sp: &SurfacePoint<'_>,
    material: &dyn Material,
    light: &dyn Light,
    wo: Vector,
    mode: ShadowMode,
) -> Rgb {
    let (n, offset) = sample_budget(state, light.num_samples());
    let intersecter = light.as_intersecter();

    // Sample the light
    let mut hal3 = Halton::new(3);
    hal3.set_start(offset.saturating_sub(1));
    let mut col = Rgb::BLACK;
    for i in 0..n {
        let (s1, s2) = divide(state, van_der_corput(offset.wrapping_add(i), 0), hal3.next_value());
        let mut ls = LightSample::new(s1, s2);
        let mut wi = light_ray(sp);
        if !light.illuminate_sample(sp, &mut wi, &mut ls) {
            continue;
        }
        let Some(filter) = shadow_filter(state, scene, &wi, mode) else {
            continue;
        };
        if ls.pdf <= PDF_CUTOFF {
            continue;
        }
        let surf = material.eval(state, sp, wo, wi.dir, Bsdf::ALL);
        let c = surf * ls.color * filter * sp.normal.dot(wi.dir).abs();
        col += if intersecter.is_some() {
            let m = material.pdf(state, sp, wo, wi.dir, MIS_FLAGS);
            c * (mis_weight(ls.pdf, m) / ls.pdf)
        } else {
            c / ls.pdf
        };
    }
    col = col / f64::from(n);

    // Sample the BSDF
    if let Some(isect) = intersecter {
        let mut hal5 = Halton::new(5);
        let mut hal7 = Halton::new(7);
        hal5.set_start(offset);
        hal7.set_start(offset);
        let mut bcol = Rgb::BLACK;
        for _ in 0..n {
            let (s1, s2) = divide(state, hal5.next_value(), hal7.next_value());
            let mut s = MaterialSample::new(s1, s2).with_flags(MIS_FLAGS);
            let (surf, wi) = material.sample(state, sp, wo, &mut s);
            if s.pdf <= PDF_CUTOFF {
                continue;
            }
            let mut ray = Ray::new(sp.position, wi).with_range(RAY_SELF_BIAS, -1.0);
            let Some((dist, lcol, ipdf)) = isect.intersect(&ray) else {
                continue;
            };
            ray.tmax = dist;
            let Some(filter) = shadow_filter(state, scene, &ray, mode) else {
                continue;
            };
            let w = mis_weight(s.pdf, 1.0 / ipdf);
            bcol += surf * lcol * filter * (sp.normal.dot(wi).abs() * w / s.pdf);
        }
        col += bcol / f64::from(n);
    }
    col
}

/// Ambient occlusion: diffuse reflection of a uniform colour arriving from
/// every unoccluded direction within `ao.distance`.
pub fn sample_ao(
    state: &RenderState,
    scene: &Scene,
    sp: &SurfacePoint<'_>,
    material: &dyn Material,
    wo: Vector,
    ao: &AoConfig,
) -> Rgb {
    let (n, offset) = sample_budget(state, ao.samples);
    let mut hal3 = Halton::new(3);
    hal3.set_start(offset.saturating_sub(1));
    let mut col = Rgb::BLACK;
    for i in 0..n {
        let (s1, s2) = divide(state, van_der_corput(offset.wrapping_add(i), 0), hal3.next_value());
        let mut s = MaterialSample::new(s1, s2).with_flags(Bsdf::DIFFUSE | Bsdf::REFLECT);
        let (surf, dir) = material.sample(state, sp, wo, &mut s);
        if s.pdf <= PDF_CUTOFF {
            continue;
        }
        let ray = Ray::new(sp.position, dir).with_range(RAY_SELF_BIAS, ao.distance);
        if scene.shadowed(&ray, -1.0) {
            continue;
        }
        col += ao.color * surf * (sp.normal.dot(dir).abs() / s.pdf);
    }
    col / f64::from(n)
}

/// Radiance estimate from the `n_lookup` photons nearest to `sp` within
/// squared radius `radius_sq`.
pub fn estimate_photons(
    state: &RenderState,
    sp: &SurfacePoint<'_>,
    material: &dyn Material,
    wo: Vector,
    map: &PhotonMap,
    n_lookup: usize,
    radius_sq: f64,
) -> Rgb {
    if !map.ready() || map.num_paths() == 0 {
        return Rgb::BLACK;
    }
    let sum = map
        .gather(sp.position, n_lookup, radius_sq)
        .iter()
        .fold(Rgb::BLACK, |sum, g| {
            let surf = material.eval(state, sp, wo, g.photon.direction, Bsdf::ALL);
            sum + surf * g.photon.color * photon::kernel(g.distance_sq, radius_sq)
        });
    sum / map.num_paths() as f64
}
