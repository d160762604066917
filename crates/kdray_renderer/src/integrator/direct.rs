//! Direct lighting with recursive perfect specular reflection and refraction.

use kdray_core::{Bsdf, Differentials, RenderState, Scene};
use kdray_math::{DifferentialRay, Ray, Rgb, Rgba};
use serde::{Deserialize, Serialize};

use super::util::{estimate_direct, sample_ao, ShadowMode, RAY_SELF_BIAS};
use super::Integrator;

/// Ambient occlusion settings. Disabled when `samples` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AoConfig {
    pub samples: u32,
    /// Length of occlusion rays
    pub distance: f64,
    pub color: Rgb,
}

impl Default for AoConfig {
    fn default() -> Self {
        Self {
            samples: 0,
            distance: 1.0,
            color: Rgb::WHITE,
        }
    }
}

/// Direct lighting configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectLightConfig {
    /// Maximum specular recursion depth
    pub ray_depth: u32,
    /// Transparent surfaces a shadow ray may cross
    pub shadow_depth: u32,
    pub transparent_shadows: bool,
    pub ao: AoConfig,
}

impl Default for DirectLightConfig {
    fn default() -> Self {
        Self {
            ray_depth: 5,
            shadow_depth: 4,
            transparent_shadows: false,
            ao: AoConfig::default(),
        }
    }
}

/// Surface integrator computing light arriving straight from light sources,
/// plus whatever perfect mirrors and filters reflect or let through.
#[derive(Debug, Clone, Default)]
pub struct DirectLighting {
    config: DirectLightConfig,
}

impl DirectLighting {
    pub fn new(config: DirectLightConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DirectLightConfig {
        &self.config
    }

    fn shadow_mode(&self) -> ShadowMode {
        ShadowMode {
            transparent: self.config.transparent_shadows,
            depth: self.config.shadow_depth,
        }
    }
}

impl Integrator for DirectLighting {
    fn preprocess(&mut self, scene: &Scene) {
        let background_light = scene.background().and_then(|bg| bg.light()).is_some();
        log::debug!(
            "Direct lighting with {} lights{}, ray depth {}",
            scene.lights().len(),
            if background_light { " and a background light" } else { "" },
            self.config.ray_depth
        );
    }

    fn integrate(&self, scene: &Scene, state: &mut RenderState, ray: &DifferentialRay) -> Rgba {
        let Some(hit) = scene.intersect(&ray.ray, -1.0) else {
            let col = scene
                .background()
                .map_or(Rgb::BLACK, |bg| bg.color(&ray.ray, state, false));
            return Rgba::from_rgb(col, 0.0);
        };
        let sp = hit.surface();
        let Some(material) = sp.material else {
            return Rgba::TRANSPARENT;
        };

        let include_lights = state.include_lights;
        if state.ray_level == 0 {
            state.include_lights = true;
        }

        let wo = -ray.ray.dir;
        let bsdfs = material.init_bsdf(state, &sp);
        let mut col = Rgb::BLACK;
        let mut alpha = 0.0;

        if let Some(emitter) = material.as_emitter() {
            col += emitter.emit(state, &sp, wo);
        }
        if bsdfs.intersects(Bsdf::DIFFUSE | Bsdf::GLOSSY | Bsdf::DISPERSIVE) {
            col += estimate_direct(state, scene, &sp, material, wo, self.shadow_mode());
        }
        if bsdfs.contains(Bsdf::DIFFUSE) && self.config.ao.samples > 0 {
            col += sample_ao(state, scene, &sp, material, wo, &self.config.ao);
        }

        state.ray_level += 1;
        if state.ray_level <= self.config.ray_depth {
            state.include_lights = true;
            let specular = material.specular(state, &sp, wo);
            if specular.reflect.is_some() || specular.refract.is_some() {
                let differentials = ray.has_differentials.then(|| Differentials::new(&sp, ray));
                // Child hits overwrite the material data
                let material_data = state.material_data.take();

                if let Some(reflect) = specular.reflect {
                    let mut child = DifferentialRay::from_ray(Ray::new(sp.position, reflect.dir).with_range(RAY_SELF_BIAS, -1.0));
                    if let Some(d) = &differentials {
                        d.reflect_ray(ray, &mut child);
                    }
                    let integ = self.integrate(scene, state, &child);
                    col += integ.rgb() * reflect.color;
                }
                if let Some(refract) = specular.refract {
                    let mut child = DifferentialRay::from_ray(Ray::new(sp.position, refract.dir).with_range(RAY_SELF_BIAS, -1.0));
                    if let Some(d) = &differentials {
                        d.refract_ray(ray, &mut child, material.ior());
                    }
                    let integ = self.integrate(scene, state, &child);
                    col += integ.rgb() * refract.color;
                    alpha = integ.a;
                }

                state.material_data = material_data;
            }
        }
        state.ray_level -= 1;

        let mat_alpha = material.alpha(state, &sp, wo);
        alpha = mat_alpha + (1.0 - mat_alpha) * alpha;
        state.include_lights = include_lights;
        Rgba::from_rgb(col, alpha)
    }
}
