//! Surface materials.

mod common;
mod debug;
mod shiny_diffuse;

pub use common::{fresnel, reflect};
pub use debug::DebugMaterial;
pub use shiny_diffuse::{ShinyDiffuse, ShinyDiffuseParams, ShinyDiffuseShaders};
