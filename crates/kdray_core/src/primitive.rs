//! The primitive contract shared by every intersectable shape.

use kdray_math::{Axis, Bound, Ray, Vector};

use crate::material::Material;
use crate::surface::SurfacePoint;

/// A raw intersection reported by a primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Distance along the ray
    pub depth: f64,
    /// Primitive-specific data needed to rebuild the surface (barycentrics for triangles)
    pub user_data: [f64; 2],
}

impl Hit {
    pub fn new(depth: f64) -> Self {
        Self {
            depth,
            user_data: [0.0; 2],
        }
    }
}

/// A hit bound to the primitive that produced it.
#[derive(Clone, Copy)]
pub struct Collision<'a> {
    pub primitive: &'a dyn Primitive,
    pub ray: Ray,
    pub depth: f64,
    pub user_data: [f64; 2],
}

impl<'a> Collision<'a> {
    pub fn new(primitive: &'a dyn Primitive, ray: Ray, hit: Hit) -> Self {
        Self {
            primitive,
            ray,
            depth: hit.depth,
            user_data: hit.user_data,
        }
    }

    /// World-space position of the collision.
    #[inline]
    pub fn point(&self) -> Vector {
        self.ray.at(self.depth)
    }

    /// Reconstruct the full surface record.
    pub fn surface(&self) -> SurfacePoint<'a> {
        self.primitive.surface(self)
    }
}

/// One face of a node bound used for incremental clipping.
///
/// `lower` selects the node's minimum on `axis`, keeping the part of the
/// primitive above it; otherwise the maximum is used and the part below kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipPlane {
    pub axis: Axis,
    pub lower: bool,
}

/// Result of clipping a primitive against a box.
#[derive(Debug, Clone, PartialEq)]
pub struct Clipped {
    /// Tight bound of the part of the primitive inside the box
    pub bound: Bound,
    /// Clipped outline, reused by later plane clips
    pub polygon: Option<Vec<Vector>>,
}

/// A renderable shape.
pub trait Primitive: Send + Sync {
    /// World-space bound.
    fn bound(&self) -> Bound;

    /// Whether the primitive touches `bound`. May be conservative.
    fn intersects_bound(&self, bound: &Bound) -> bool;

    /// Intersect a ray. Hits behind the origin may be reported; callers
    /// filter against their `(min, max)` distance window.
    fn intersect(&self, ray: &Ray) -> Option<Hit>;

    /// Rebuild the surface at a collision produced by this primitive.
    fn surface<'a>(&'a self, coll: &Collision<'a>) -> SurfacePoint<'a>;

    fn material(&self) -> Option<&dyn Material>;

    /// Clip the primitive against `bound`.
    ///
    /// `plane` names the single face that changed since the parent node and
    /// `previous` is the outline produced for the parent. `None` means the
    /// primitive lies entirely outside the box. The default keeps the
    /// overlap of the primitive's bound with the box.
    fn clip(&self, bound: &Bound, _plane: Option<ClipPlane>, _previous: Option<&[Vector]>) -> Option<Clipped> {
        let own = self.bound();
        let min = own.min.max(bound.min);
        let max = own.max.min(bound.max);
        if min.cmpgt(max).any() {
            return None;
        }
        Some(Clipped {
            bound: Bound::new(min, max),
            polygon: None,
        })
    }
}
