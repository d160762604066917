use std::sync::Arc;

use kdray_math::{Bound, Ray, Rgb};

use super::{in_range, primitives_bound, Intersecter, ShadowFilter, BLOCKED};
use crate::primitive::{Collision, Primitive};
use crate::state::RenderState;

/// Tests every primitive for every ray. O(n); for debugging.
pub struct SimpleIntersecter {
    prims: Vec<Arc<dyn Primitive>>,
    bound: Bound,
}

impl SimpleIntersecter {
    pub fn new(prims: Vec<Arc<dyn Primitive>>) -> Self {
        let bound = primitives_bound(&prims);
        Self { prims, bound }
    }

    fn hits<'a>(&'a self, ray: &'a Ray, dist: f64) -> impl Iterator<Item = Collision<'a>> + 'a {
        self.prims.iter().filter_map(move |p| {
            let hit = p.intersect(ray)?;
            in_range(hit.depth, ray.tmin, dist).then(|| Collision::new(&**p, *ray, hit))
        })
    }
}

impl Intersecter for SimpleIntersecter {
    fn bound(&self) -> Bound {
        self.bound
    }

    fn intersect(&self, ray: &Ray, dist: f64) -> Option<Collision<'_>> {
        let mut best: Option<Collision<'_>> = None;
        for p in &self.prims {
            let Some(hit) = p.intersect(ray) else {
                continue;
            };
            let max = best.as_ref().map_or(dist, |b| b.depth);
            if in_range(hit.depth, ray.tmin, max) {
                best = Some(Collision::new(&**p, *ray, hit));
            }
        }
        best
    }

    fn shadowed(&self, ray: &Ray, dist: f64) -> bool {
        self.hits(ray, dist).next().is_some()
    }

    fn transparent_shadow(&self, state: &RenderState, ray: &Ray, max_depth: u32, dist: f64) -> (Rgb, bool) {
        let mut filter = ShadowFilter::new(state, max_depth);
        for coll in self.hits(ray, dist) {
            if !filter.pass(&coll) {
                return BLOCKED;
            }
        }
        filter.passed()
    }
}
