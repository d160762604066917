//! Math primitives for the kdray renderer.
//!
//! Everything is double precision: geometry is stored as [`Vector`]
//! (a `glam::DVec3`), boxes as [`Bound`], colours as [`Rgb`]/[`Rgba`].

// Re-export glam for convenience
pub use glam::*;

mod axis;
mod bound;
mod color;
mod ray;

pub use axis::{component_inverse, create_cs, largest_axis, Axis, AXES};
pub use bound::Bound;
pub use color::{Rgb, Rgba};
pub use ray::{DifferentialRay, Ray};

/// Three-component double precision vector used for all geometry.
pub type Vector = DVec3;
