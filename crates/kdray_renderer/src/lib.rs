//! kdray renderer - direct-lighting ray tracing on top of `kdray_core`.
//!
//! Provides the concrete scene parts and the frame loop:
//!
//! - **Materials**: `ShinyDiffuse` (layered mirror, filter, translucency, lambert), `DebugMaterial`
//! - **Lights**: point, spot and rectangular area lights
//! - **Cameras**: perspective with thin-lens depth of field, orthographic
//! - **Integrators**: direct lighting with MIS and specular recursion, trivial hit test
//! - **Pipeline**: block, worker and simple strategies feeding the framebuffer
//!
//! # Example
//!
//! ```ignore
//! use kdray_renderer::{render, save_image, DirectLighting, RenderConfig};
//!
//! let mut integrator = DirectLighting::default();
//! let image = render(&mut scene, &mut integrator, &RenderConfig::default())?;
//! save_image(&image, "out.png", 2.2)?;
//! ```

mod background;
mod camera;
mod integrator;
mod lights;
mod materials;
mod output;
mod render;

pub use background::ConstantBackground;
pub use camera::{Bokeh, BokehBias, OrthoCamera, PerspectiveCamera};
pub use integrator::{
    estimate_area, estimate_dirac, estimate_direct, estimate_photons, mis_weight, sample_ao, AoConfig,
    DirectLightConfig, DirectLighting, Integrator, ShadowMode, Trivial, RAY_SELF_BIAS,
};
pub use lights::{AreaLight, PointLight, SpotLight};
pub use materials::{fresnel, reflect, DebugMaterial, ShinyDiffuse, ShinyDiffuseParams, ShinyDiffuseShaders};
pub use output::{output_format, save_image, RenderError, DEFAULT_GAMMA};
pub use render::{integrate, render, render_pixel, RenderConfig, Strategy, BLOCK_DIM};
