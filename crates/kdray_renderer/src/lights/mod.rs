//! Light sources.
//!
//! Point and spot lights are singular: they are only reached through
//! `DiracLight::illuminate`. The rectangular area light can also be hit by
//! BSDF-sampled rays, which lets the direct lighting integrator combine
//! both strategies.

mod area;
mod point;
mod spot;

pub use area::AreaLight;
pub use point::PointLight;
pub use spot::SpotLight;
