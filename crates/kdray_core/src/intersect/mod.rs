//! Ray queries over a set of primitives.
//!
//! Two strategies implement [`Intersecter`]: a linear scan kept for
//! debugging and tests, and the kd-tree used for rendering.

mod kd;
mod simple;

use std::sync::Arc;

use kdray_math::{Bound, Ray, Rgb};

use crate::primitive::{Collision, Primitive};
use crate::state::RenderState;

pub use kd::KdIntersecter;
pub use simple::SimpleIntersecter;

/// Spatial query structure over a fixed set of primitives.
pub trait Intersecter: Send + Sync {
    /// Box enclosing every primitive.
    fn bound(&self) -> Bound;

    /// Nearest collision with depth in `(ray.tmin, dist)`.
    fn intersect(&self, ray: &Ray, dist: f64) -> Option<Collision<'_>>;

    /// Whether anything lies in `(ray.tmin, dist)`.
    fn shadowed(&self, ray: &Ray, dist: f64) -> bool;

    /// Filter colour of the transparent surfaces in `(ray.tmin, dist)`.
    ///
    /// Returns `(filter, false)` when the ray gets through, and
    /// `(black, true)` when it hits an opaque surface or more than
    /// `max_depth` transparent ones.
    fn transparent_shadow(&self, state: &RenderState, ray: &Ray, max_depth: u32, dist: f64) -> (Rgb, bool);
}

/// Constructs an intersecter from a flat primitive list.
pub type IntersecterBuilder = fn(Vec<Arc<dyn Primitive>>) -> Box<dyn Intersecter>;

/// Builder for [`SimpleIntersecter`].
pub fn new_simple(prims: Vec<Arc<dyn Primitive>>) -> Box<dyn Intersecter> {
    Box::new(SimpleIntersecter::new(prims))
}

/// Builder for [`KdIntersecter`] with default options.
pub fn new_kd(prims: Vec<Arc<dyn Primitive>>) -> Box<dyn Intersecter> {
    Box::new(KdIntersecter::new(prims))
}

/// Union of the primitive bounds, zero when empty.
fn primitives_bound(prims: &[Arc<dyn Primitive>]) -> Bound {
    prims
        .iter()
        .map(|p| p.bound())
        .reduce(|a, b| Bound::union(&a, &b))
        .unwrap_or_default()
}

#[inline]
fn in_range(depth: f64, min: f64, max: f64) -> bool {
    depth > min && depth < max
}

/// Running product of the filters crossed by a shadow ray.
struct ShadowFilter<'s> {
    state: &'s RenderState,
    max_depth: u32,
    depth: u32,
    color: Rgb,
}

impl<'s> ShadowFilter<'s> {
    fn new(state: &'s RenderState, max_depth: u32) -> Self {
        Self {
            state,
            max_depth,
            depth: 0,
            color: Rgb::WHITE,
        }
    }

    /// Pass through one surface. Returns false once the ray is blocked.
    fn pass(&mut self, coll: &Collision<'_>) -> bool {
        if self.depth >= self.max_depth {
            return false;
        }
        let Some(mat) = coll.primitive.material().and_then(|m| m.as_transparent()) else {
            return false;
        };
        let sp = coll.surface();
        self.color *= mat.transparency(self.state, &sp, coll.ray.dir);
        if self.color.is_black() {
            return false;
        }
        self.depth += 1;
        true
    }

    fn passed(self) -> (Rgb, bool) {
        (self.color, false)
    }
}

const BLOCKED: (Rgb, bool) = (Rgb::BLACK, true);
