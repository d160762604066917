//! Layered diffuse material with mirror reflection, transparency,
//! translucency and emission.
//!
//! The layers are stacked: specular reflection takes its share first, then
//! transparency takes a share of what is left, then translucency, and
//! whatever remains is diffusely reflected.

use std::f64::consts::FRAC_1_PI;
use std::sync::Arc;

use kdray_core::material::{Bsdf, EmitMaterial, Material, MaterialSample, Specular, SpecularRay, TransparentMaterial};
use kdray_core::sampling::cos_hemisphere;
use kdray_core::shader::{ShaderError, ShaderGraph, ShaderNode, ShaderParams, ShaderResult};
use kdray_core::{RenderState, SurfacePoint};
use kdray_math::{Rgb, Vector};
use serde::{Deserialize, Serialize};

use super::common::{fresnel, reflect};

/// Layer strengths below this are treated as absent.
const THRESHOLD: f64 = 1e-5;

/// Scalar and colour parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShinyDiffuseParams {
    pub color: Rgb,
    /// Diffuse reflection strength
    pub diffuse: f64,
    pub mirror_color: Rgb,
    pub specular_reflect: f64,
    pub transparency: f64,
    pub translucency: f64,
    /// How much transmitted light is tinted by `color`
    pub transmit_filter: f64,
    pub emit_color: Rgb,
    pub emit_value: f64,
    pub ior: f64,
    /// Scale mirror reflection by the Fresnel term
    pub fresnel_effect: bool,
}

impl Default for ShinyDiffuseParams {
    fn default() -> Self {
        Self {
            color: Rgb::WHITE,
            diffuse: 1.0,
            mirror_color: Rgb::WHITE,
            specular_reflect: 0.0,
            transparency: 0.0,
            translucency: 0.0,
            transmit_filter: 0.0,
            emit_color: Rgb::BLACK,
            emit_value: 0.0,
            ior: 1.0,
            fresnel_effect: false,
        }
    }
}

/// Optional shader nodes overriding the constant parameters.
#[derive(Clone, Default)]
pub struct ShinyDiffuseShaders {
    pub diffuse_color: Option<Arc<dyn ShaderNode>>,
    pub transparency: Option<Arc<dyn ShaderNode>>,
    pub translucency: Option<Arc<dyn ShaderNode>>,
    pub specular_reflect: Option<Arc<dyn ShaderNode>>,
    pub mirror_color: Option<Arc<dyn ShaderNode>>,
}

// Shader slots, in target order.
const DIFFUSE_COLOR: usize = 0;
const TRANSPARENCY: usize = 1;
const TRANSLUCENCY: usize = 2;
const SPECULAR_REFLECT: usize = 3;
const MIRROR_COLOR: usize = 4;

/// Layer strengths at one surface point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct LayerData {
    diffuse: f64,
    spec_refl: f64,
    transp: f64,
    transl: f64,
    diffuse_color: Rgb,
    mirror_color: Rgb,
}

impl LayerData {
    /// Absolute layer weights from the stacked fractions. `kr` scales the
    /// mirror layer.
    fn accumulate(&self, kr: f64) -> LayerData {
        let spec_refl = self.spec_refl * kr;
        let mut acc = 1.0 - spec_refl;
        let transp = self.transp * acc;
        acc *= 1.0 - self.transp;
        let transl = self.transl * acc;
        acc *= 1.0 - self.transl;
        LayerData {
            diffuse: self.diffuse * acc,
            spec_refl,
            transp,
            transl,
            ..*self
        }
    }
}

/// Up to four sampled lobes with their weights.
struct Lobes {
    items: [(Bsdf, f64); 4],
    len: usize,
}

impl Lobes {
    fn push(&mut self, flags: Bsdf, weight: f64) {
        self.items[self.len] = (flags, weight);
        self.len += 1;
    }

    fn as_slice(&self) -> &[(Bsdf, f64)] {
        &self.items[..self.len]
    }
}

const MIRROR: Bsdf = Bsdf::SPECULAR.union(Bsdf::REFLECT);
const FILTER: Bsdf = Bsdf::TRANSMIT.union(Bsdf::FILTER);
const TRANSLUCENT: Bsdf = Bsdf::DIFFUSE.union(Bsdf::TRANSMIT);
const LAMBERT: Bsdf = Bsdf::DIFFUSE.union(Bsdf::REFLECT);

pub struct ShinyDiffuse {
    params: ShinyDiffuseParams,
    /// `emit_color * emit_value`
    emit: Rgb,
    graph: Option<ShaderGraph>,
    /// Position of each shader slot among the graph targets
    slots: [Option<usize>; 5],
    has_diffuse_shader: bool,
    view_dependent: bool,

    reflective: bool,
    transparent: bool,
    translucent: bool,
    diffuse: bool,
    flags: Bsdf,
}

impl ShinyDiffuse {
    pub fn new(params: ShinyDiffuseParams) -> Self {
        let mut mat = Self {
            params,
            emit: params.emit_color * params.emit_value,
            graph: None,
            slots: [None; 5],
            has_diffuse_shader: false,
            view_dependent: false,
            reflective: false,
            transparent: false,
            translucent: false,
            diffuse: false,
            flags: Bsdf::empty(),
        };
        mat.init_layers(&ShinyDiffuseShaders::default());
        mat
    }

    /// Build a material whose layers may be driven by shader nodes.
    pub fn with_shaders(params: ShinyDiffuseParams, shaders: ShinyDiffuseShaders) -> Result<Self, ShaderError> {
        let mut mat = Self::new(params);
        let all = [
            &shaders.diffuse_color,
            &shaders.transparency,
            &shaders.translucency,
            &shaders.specular_reflect,
            &shaders.mirror_color,
        ];
        let mut targets = Vec::new();
        for (slot, node) in all.iter().enumerate() {
            if let Some(node) = node {
                mat.slots[slot] = Some(targets.len());
                targets.push(node.clone());
            }
        }
        if !targets.is_empty() {
            let graph = ShaderGraph::new(&targets)?;
            mat.view_dependent = graph.view_dependent();
            mat.graph = Some(graph);
        }
        mat.has_diffuse_shader = shaders.diffuse_color.is_some();
        mat.init_layers(&shaders);
        Ok(mat)
    }

    pub fn params(&self) -> &ShinyDiffuseParams {
        &self.params
    }

    /// Decide which layers exist. Each layer only counts if enough light
    /// is left after the ones above it.
    fn init_layers(&mut self, shaders: &ShinyDiffuseShaders) {
        let p = &self.params;
        let mut acc = 1.0;
        let mut flags = Bsdf::empty();

        self.reflective = p.specular_reflect > THRESHOLD || shaders.specular_reflect.is_some();
        if self.reflective {
            if shaders.specular_reflect.is_none() && !p.fresnel_effect {
                acc = 1.0 - p.specular_reflect;
            }
            flags |= MIRROR;
        }

        self.transparent = p.transparency * acc > THRESHOLD || shaders.transparency.is_some();
        if self.transparent {
            if shaders.transparency.is_none() {
                acc *= 1.0 - p.transparency;
            }
            flags |= FILTER;
        }

        self.translucent = p.translucency * acc > THRESHOLD || shaders.translucency.is_some();
        if self.translucent {
            if shaders.translucency.is_none() {
                acc *= 1.0 - p.translucency;
            }
            flags |= TRANSLUCENT;
        }

        self.diffuse = p.diffuse * acc > THRESHOLD;
        if self.diffuse {
            flags |= LAMBERT;
        }
        self.flags = flags;
    }

    /// Layer data from shader results. Missing results fall back to the
    /// constant parameters. Scalar shaders are ignored when any node is
    /// view dependent since the data is computed before `wo` is known.
    fn layer_data(&self, results: &[ShaderResult]) -> LayerData {
        let p = &self.params;
        let shaded = |slot: usize| self.slots[slot].and_then(|i| results.get(i)).copied();
        let scalar = |slot: usize, constant: f64| {
            if self.view_dependent {
                constant
            } else {
                shaded(slot).map_or(constant, |r| r.scalar())
            }
        };
        LayerData {
            diffuse: if self.diffuse { p.diffuse } else { 0.0 },
            spec_refl: if self.reflective { scalar(SPECULAR_REFLECT, p.specular_reflect) } else { 0.0 },
            transp: if self.transparent { scalar(TRANSPARENCY, p.transparency) } else { 0.0 },
            transl: if self.translucent { scalar(TRANSLUCENCY, p.translucency) } else { 0.0 },
            diffuse_color: shaded(DIFFUSE_COLOR).map_or(p.color, |r| r.rgb()),
            mirror_color: shaded(MIRROR_COLOR).map_or(p.mirror_color, |r| r.rgb()),
        }
    }

    fn surface_data(&self, state: &RenderState, sp: &SurfacePoint<'_>) -> LayerData {
        match &self.graph {
            Some(graph) => self.layer_data(&graph.eval(&ShaderParams { state, surface: sp })),
            None => self.layer_data(&[]),
        }
    }

    /// Data stored by `init_bsdf`, or the constant layers if there is none.
    fn data(&self, state: &RenderState) -> LayerData {
        state
            .material_data::<LayerData>()
            .copied()
            .unwrap_or_else(|| self.layer_data(&[]))
    }

    fn kr(&self, wo: Vector, n: Vector) -> f64 {
        if self.params.fresnel_effect {
            fresnel(wo, n, self.params.ior).0
        } else {
            1.0
        }
    }

    fn lobes(&self, d: &LayerData) -> Lobes {
        let mut lobes = Lobes {
            items: [(Bsdf::empty(), 0.0); 4],
            len: 0,
        };
        if self.reflective {
            lobes.push(MIRROR, d.spec_refl);
        }
        if self.transparent {
            lobes.push(FILTER, d.transp);
        }
        if self.translucent {
            lobes.push(TRANSLUCENT, d.transl);
        }
        if self.diffuse {
            lobes.push(LAMBERT, d.diffuse);
        }
        lobes
    }

    /// Colour of light passing straight through.
    fn filter_color(&self, d: &LayerData) -> Rgb {
        let tf = self.params.transmit_filter;
        d.diffuse_color * tf + Rgb::gray(1.0 - tf)
    }
}

/// Shading normal flipped toward `wo`.
fn facing_normal(sp: &SurfacePoint<'_>, wo: Vector) -> Vector {
    if sp.geometric_normal.dot(wo) < 0.0 {
        -sp.normal
    } else {
        sp.normal
    }
}

impl Material for ShinyDiffuse {
    fn init_bsdf(&self, state: &mut RenderState, sp: &SurfacePoint<'_>) -> Bsdf {
        let data = self.surface_data(state, sp);
        state.material_data = Some(Box::new(data));
        self.flags
    }

    fn flags(&self) -> Bsdf {
        self.flags
    }

    fn eval(&self, state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector, wl: Vector, types: Bsdf) -> Rgb {
        if (types & self.flags & Bsdf::DIFFUSE).is_empty() {
            return Rgb::BLACK;
        }
        let cos_ng_wo = sp.geometric_normal.dot(wo);
        let cos_ng_wl = sp.geometric_normal.dot(wl);
        let n = facing_normal(sp, wo);
        let data = self.data(state);
        let kr = self.kr(wo, n);
        let mt = (1.0 - kr * data.spec_refl) * (1.0 - data.transp);

        if cos_ng_wo * cos_ng_wl < 0.0 {
            // Light arrives from the other side
            if self.translucent {
                return data.diffuse_color * (data.transl * mt * FRAC_1_PI);
            }
            return Rgb::BLACK;
        }
        if n.dot(wl) < 0.0 {
            return Rgb::BLACK;
        }
        let md = mt * (1.0 - data.transl) * data.diffuse;
        data.diffuse_color * (md * FRAC_1_PI)
    }

    fn sample(&self, state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector, s: &mut MaterialSample) -> (Rgb, Vector) {
        let data = self.data(state);
        let cos_ng_wo = sp.geometric_normal.dot(wo);
        let n = facing_normal(sp, wo);
        let accum = data.accumulate(self.kr(wo, n));
        let lobes = self.lobes(&accum);
        let lobes = lobes.as_slice();

        let sum: f64 = lobes.iter().map(|l| l.1).sum();
        if lobes.is_empty() || sum < 1e-6 {
            s.sampled_flags = Bsdf::empty();
            s.pdf = 0.0;
            return (Rgb::WHITE, Vector::ZERO);
        }

        // Pick a lobe with probability proportional to its weight
        let mut lower = 0.0;
        let mut pick = lobes.len() - 1;
        for (i, &(_, w)) in lobes.iter().enumerate() {
            let upper = lower + w / sum;
            if s.s1 <= upper {
                pick = i;
                break;
            }
            if i + 1 < lobes.len() {
                lower = upper;
            }
        }
        let (lobe, weight) = lobes[pick];
        let width = weight / sum;
        let s1 = ((s.s1 - lower) / width).clamp(0.0, 1.0);

        let (color, wi) = if lobe == MIRROR {
            let wi = reflect(n, wo);
            let col = accum.mirror_color * accum.spec_refl;
            let cos_wi = sp.normal.dot(wi).abs();
            if cos_wi < 1e-6 {
                s.pdf = 0.0;
                (col, wi)
            } else {
                s.pdf = width;
                if s.reverse {
                    s.pdf_back = s.pdf;
                    s.color_back = col / sp.normal.dot(wo).abs().max(1e-6);
                }
                (col / cos_wi, wi)
            }
        } else if lobe == FILTER {
            let wi = -wo;
            let col = self.filter_color(&accum) * accum.transp;
            let cos_n = wi.dot(n).abs();
            if cos_n < 1e-6 {
                s.pdf = 0.0;
                (col, wi)
            } else {
                s.pdf = width;
                (col / cos_n, wi)
            }
        } else if lobe == TRANSLUCENT {
            let wi = cos_hemisphere(-n, sp.normal_u, sp.normal_v, s1, s.s2);
            let cos_ng_wi = sp.geometric_normal.dot(wi);
            let col = if cos_ng_wo * cos_ng_wi < 0.0 {
                accum.diffuse_color * (accum.transl * FRAC_1_PI)
            } else {
                Rgb::BLACK
            };
            s.pdf = wi.dot(n).abs() * FRAC_1_PI * width;
            (col, wi)
        } else {
            let wi = cos_hemisphere(n, sp.normal_u, sp.normal_v, s1, s.s2);
            let cos_ng_wi = sp.geometric_normal.dot(wi);
            let col = if cos_ng_wo * cos_ng_wi > 0.0 {
                accum.diffuse_color * (accum.diffuse * FRAC_1_PI)
            } else {
                Rgb::BLACK
            };
            s.pdf = wi.dot(n).abs() * FRAC_1_PI * width;
            (col, wi)
        };
        s.sampled_flags = lobe;
        (color, wi)
    }

    fn pdf(&self, state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector, wi: Vector, types: Bsdf) -> f64 {
        if !types.contains(Bsdf::DIFFUSE) {
            return 0.0;
        }
        let data = self.data(state);
        let cos_ng_wo = sp.geometric_normal.dot(wo);
        let cos_ng_wi = sp.geometric_normal.dot(wi);
        let n = facing_normal(sp, wo);
        let accum = data.accumulate(self.kr(wo, n));
        let lobes = self.lobes(&accum);

        let mut sum = 0.0;
        let mut pdf = 0.0;
        for &(lobe, weight) in lobes.as_slice() {
            sum += weight;
            let same_side = cos_ng_wo * cos_ng_wi > 0.0;
            let opposite = cos_ng_wo * cos_ng_wi < 0.0;
            if (lobe == TRANSLUCENT && opposite) || (lobe == LAMBERT && same_side) {
                pdf += wi.dot(n).abs() * FRAC_1_PI * weight;
            }
        }
        if lobes.len == 0 || sum < THRESHOLD {
            return 0.0;
        }
        pdf / sum
    }

    fn specular(&self, state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector) -> Specular {
        let data = self.data(state);
        let (n, ng) = if sp.geometric_normal.dot(wo) < 0.0 {
            (-sp.normal, -sp.geometric_normal)
        } else {
            (sp.normal, sp.geometric_normal)
        };
        let kr = self.kr(wo, n);

        let through = self.transparent.then(|| SpecularRay {
            dir: -wo,
            color: self.filter_color(&data) * ((1.0 - data.spec_refl * kr) * data.transp),
        });
        let mirrored = self.reflective.then(|| {
            let mut dir = reflect(n, wo);
            // Keep the mirror ray above the true surface
            let cos_wi_ng = dir.dot(ng);
            if cos_wi_ng < 0.01 {
                dir = (dir + ng * (0.01 - cos_wi_ng)).normalize();
            }
            SpecularRay {
                dir,
                color: data.mirror_color * (data.spec_refl * kr),
            }
        });
        Specular {
            reflect: mirrored,
            refract: through,
        }
    }

    fn alpha(&self, state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector) -> f64 {
        if !self.transparent {
            return 1.0;
        }
        let data = self.data(state);
        let kr = self.kr(wo, facing_normal(sp, wo));
        1.0 - (1.0 - data.spec_refl * kr) * data.transp
    }

    fn ior(&self) -> f64 {
        self.params.ior
    }

    fn as_transparent(&self) -> Option<&dyn TransparentMaterial> {
        if self.transparent {
            Some(self)
        } else {
            None
        }
    }

    fn as_emitter(&self) -> Option<&dyn EmitMaterial> {
        let emits = if self.has_diffuse_shader {
            self.params.emit_value > 0.0
        } else {
            !self.emit.is_black()
        };
        if emits {
            Some(self)
        } else {
            None
        }
    }
}

impl TransparentMaterial for ShinyDiffuse {
    /// Evaluated from scratch: shadow rays reach this without `init_bsdf`.
    fn transparency(&self, state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector) -> Rgb {
        let data = self.surface_data(state, sp);
        let kr = self.kr(wo, facing_normal(sp, wo));
        self.filter_color(&data) * ((1.0 - data.spec_refl * kr) * data.transp)
    }
}

impl EmitMaterial for ShinyDiffuse {
    fn emit(&self, state: &RenderState, _sp: &SurfacePoint<'_>, _wo: Vector) -> Rgb {
        if self.has_diffuse_shader {
            self.data(state).diffuse_color * self.params.emit_value
        } else {
            self.emit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdray_core::shader::ConstantNode;
    use kdray_math::Rgba;

    fn flat_point() -> SurfacePoint<'static> {
        SurfacePoint {
            normal: Vector::Z,
            geometric_normal: Vector::Z,
            normal_u: Vector::X,
            normal_v: Vector::Y,
            ..Default::default()
        }
    }

    fn approx(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-9 && (a.g - b.g).abs() < 1e-9 && (a.b - b.b).abs() < 1e-9
    }

    #[test]
    fn test_layer_accumulation() {
        let d = LayerData {
            diffuse: 1.0,
            spec_refl: 0.5,
            transp: 0.5,
            transl: 0.5,
            ..Default::default()
        };
        let a = d.accumulate(1.0);
        assert_eq!((a.spec_refl, a.transp, a.transl, a.diffuse), (0.5, 0.25, 0.125, 0.125));
    }

    #[test]
    fn test_lambert_eval() {
        let mat = ShinyDiffuse::new(ShinyDiffuseParams {
            color: Rgb::new(0.5, 0.25, 1.0),
            diffuse: 0.8,
            ..Default::default()
        });
        assert_eq!(mat.flags(), LAMBERT);
        assert!(mat.as_transparent().is_none());
        assert!(mat.as_emitter().is_none());

        let mut state = RenderState::new();
        let sp = flat_point();
        mat.init_bsdf(&mut state, &sp);
        let wo = Vector::new(0.0, 0.6, 0.8);
        let wl = Vector::new(0.6, 0.0, 0.8);
        let c = mat.eval(&state, &sp, wo, wl, Bsdf::ALL);
        assert!(approx(c, Rgb::new(0.5, 0.25, 1.0) * (0.8 * FRAC_1_PI)));
        // Light below the surface is not reflected
        assert!(mat.eval(&state, &sp, wo, -wl, Bsdf::ALL).is_black());
        assert!(mat.eval(&state, &sp, wo, wl, Bsdf::SPECULAR).is_black());
    }

    #[test]
    fn test_sample_matches_eval_and_pdf() {
        let mat = ShinyDiffuse::new(ShinyDiffuseParams::default());
        let mut state = RenderState::new();
        let sp = flat_point();
        mat.init_bsdf(&mut state, &sp);
        let wo = Vector::new(0.0, 0.6, 0.8);

        let mut s = MaterialSample::new(0.3, 0.7);
        let (c, wi) = mat.sample(&state, &sp, wo, &mut s);
        assert_eq!(s.sampled_flags, LAMBERT);
        assert!(wi.z > 0.0);
        assert!((s.pdf - mat.pdf(&state, &sp, wo, wi, Bsdf::ALL)).abs() < 1e-12);
        assert!(approx(c, mat.eval(&state, &sp, wo, wi, Bsdf::ALL)));
        assert_eq!(mat.pdf(&state, &sp, wo, wi, Bsdf::SPECULAR), 0.0);
    }

    #[test]
    fn test_mirror() {
        let mat = ShinyDiffuse::new(ShinyDiffuseParams {
            mirror_color: Rgb::new(1.0, 0.5, 0.5),
            specular_reflect: 1.0,
            ..Default::default()
        });
        // Nothing is left for the diffuse layer
        assert_eq!(mat.flags(), MIRROR);

        let mut state = RenderState::new();
        let sp = flat_point();
        mat.init_bsdf(&mut state, &sp);
        let wo = Vector::new(0.6, 0.0, 0.8);
        let spec = mat.specular(&state, &sp, wo);
        assert!(spec.refract.is_none());
        let r = spec.reflect.unwrap();
        assert!((r.dir - Vector::new(-0.6, 0.0, 0.8)).length() < 1e-12);
        assert!(approx(r.color, Rgb::new(1.0, 0.5, 0.5)));
        assert_eq!(mat.alpha(&state, &sp, wo), 1.0);

        let mut s = MaterialSample::new(0.5, 0.5);
        let (c, wi) = mat.sample(&state, &sp, wo, &mut s);
        assert_eq!(s.sampled_flags, MIRROR);
        assert_eq!(s.pdf, 1.0);
        assert!((wi - r.dir).length() < 1e-12);
        assert!(approx(c, Rgb::new(1.0, 0.5, 0.5) / 0.8));
    }

    #[test]
    fn test_grazing_mirror_ray_stays_above_surface() {
        let mat = ShinyDiffuse::new(ShinyDiffuseParams {
            specular_reflect: 1.0,
            ..Default::default()
        });
        let mut state = RenderState::new();
        let mut sp = flat_point();
        // Shading normal tilted away from the geometric one
        sp.normal = Vector::new(0.5, 0.0, 1.0).normalize();
        mat.init_bsdf(&mut state, &sp);
        let spec = mat.specular(&state, &sp, Vector::new(-1.0, 0.0, 0.1).normalize());
        let dir = spec.reflect.unwrap().dir;
        assert!(dir.z > 0.0);
        assert!((dir.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transparency() {
        let mat = ShinyDiffuse::new(ShinyDiffuseParams {
            color: Rgb::new(1.0, 0.0, 0.0),
            transparency: 0.5,
            ..Default::default()
        });
        assert_eq!(mat.flags(), FILTER | LAMBERT);

        let mut state = RenderState::new();
        let sp = flat_point();
        let wo = Vector::Z;
        mat.init_bsdf(&mut state, &sp);
        assert!((mat.alpha(&state, &sp, wo) - 0.5).abs() < 1e-12);

        let spec = mat.specular(&state, &sp, wo);
        assert!(spec.reflect.is_none());
        let t = spec.refract.unwrap();
        assert_eq!(t.dir, -wo);
        assert!(approx(t.color, Rgb::gray(0.5)));

        // Shadow rays use a fresh state
        let filter = mat.as_transparent().unwrap().transparency(&RenderState::new(), &sp, -wo);
        assert!(approx(filter, Rgb::gray(0.5)));

        let tinted = ShinyDiffuse::new(ShinyDiffuseParams {
            color: Rgb::new(1.0, 0.0, 0.0),
            transparency: 0.5,
            transmit_filter: 1.0,
            ..Default::default()
        });
        let filter = tinted.as_transparent().unwrap().transparency(&RenderState::new(), &sp, wo);
        assert!(approx(filter, Rgb::new(0.5, 0.0, 0.0)));
    }

    #[test]
    fn test_translucent_eval_from_behind() {
        let mat = ShinyDiffuse::new(ShinyDiffuseParams {
            translucency: 0.5,
            ..Default::default()
        });
        assert_eq!(mat.flags(), TRANSLUCENT | LAMBERT);
        let mut state = RenderState::new();
        let sp = flat_point();
        mat.init_bsdf(&mut state, &sp);
        let c = mat.eval(&state, &sp, Vector::Z, -Vector::Z, Bsdf::ALL);
        assert!(approx(c, Rgb::gray(0.5 * FRAC_1_PI)));
        let front = mat.eval(&state, &sp, Vector::Z, Vector::Z, Bsdf::ALL);
        assert!(approx(front, Rgb::gray(0.5 * FRAC_1_PI)));
    }

    #[test]
    fn test_emission() {
        let mat = ShinyDiffuse::new(ShinyDiffuseParams {
            emit_color: Rgb::new(1.0, 0.5, 0.0),
            emit_value: 2.0,
            ..Default::default()
        });
        let state = RenderState::new();
        let e = mat.as_emitter().unwrap().emit(&state, &flat_point(), Vector::Z);
        assert!(approx(e, Rgb::new(2.0, 1.0, 0.0)));
    }

    #[test]
    fn test_diffuse_color_shader() {
        let green: Arc<dyn ShaderNode> = Arc::new(ConstantNode(Rgba::new(0.0, 1.0, 0.0, 1.0)));
        let mat = ShinyDiffuse::with_shaders(
            ShinyDiffuseParams::default(),
            ShinyDiffuseShaders {
                diffuse_color: Some(green),
                ..Default::default()
            },
        )
        .unwrap();
        let mut state = RenderState::new();
        let sp = flat_point();
        mat.init_bsdf(&mut state, &sp);
        let c = mat.eval(&state, &sp, Vector::Z, Vector::Z, Bsdf::ALL);
        assert!(approx(c, Rgb::new(0.0, FRAC_1_PI, 0.0)));
    }
}
