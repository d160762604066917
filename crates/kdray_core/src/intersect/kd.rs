use std::collections::HashSet;
use std::sync::Arc;

use kdray_math::{component_inverse, Axis, Bound, Ray, Rgb, Vector};

use super::{in_range, Intersecter, ShadowFilter, BLOCKED};
use crate::kdtree::{KdData, KdTree, Node, Options};
use crate::primitive::{ClipPlane, Clipped, Collision, Hit, Primitive};
use crate::state::RenderState;

/// Kd-tree accelerated intersection.
pub struct KdIntersecter {
    tree: KdTree,
    prims: Vec<Arc<dyn Primitive>>,
}

/// Build-time view of the primitives with cached bounds.
struct PrimitiveData<'a> {
    prims: &'a [Arc<dyn Primitive>],
    bounds: Vec<Bound>,
}

impl KdData for PrimitiveData<'_> {
    fn len(&self) -> usize {
        self.prims.len()
    }

    fn dimension(&self, i: usize, axis: Axis) -> (f64, f64) {
        (self.bounds[i].lo(axis), self.bounds[i].hi(axis))
    }

    fn bound(&self, i: usize) -> Bound {
        self.bounds[i]
    }

    fn can_clip(&self) -> bool {
        true
    }

    fn clip(&self, i: usize, bound: &Bound, plane: Option<ClipPlane>, previous: Option<&[Vector]>) -> Option<Clipped> {
        self.prims[i].clip(bound, plane, previous)
    }
}

impl KdIntersecter {
    pub fn new(prims: Vec<Arc<dyn Primitive>>) -> Self {
        Self::with_options(prims, &Options::default())
    }

    pub fn with_options(prims: Vec<Arc<dyn Primitive>>, options: &Options) -> Self {
        let data = PrimitiveData {
            prims: &prims,
            bounds: prims.iter().map(|p| p.bound()).collect(),
        };
        let tree = KdTree::build(&data, options);
        Self { tree, prims }
    }

    pub fn tree(&self) -> &KdTree {
        &self.tree
    }

    /// Test the primitives of one leaf.
    fn leaf_hits<'a>(&'a self, indices: &'a [usize], ray: &'a Ray) -> impl Iterator<Item = (usize, Hit)> + 'a {
        indices
            .iter()
            .filter_map(move |&i| self.prims[i].intersect(ray).map(|hit| (i, hit)))
    }
}

/// A point where the ray enters or leaves a node.
#[derive(Clone, Copy)]
struct Frame<'t> {
    /// Node to visit from here, if any
    node: Option<&'t Node>,
    t: f64,
    point: Vector,
}

/// Walks the leaves a ray passes through, front to back.
struct Follower<'t> {
    ray: Ray,
    inv_dir: Vector,
    min_dist: f64,
    max_dist: f64,
    current: Option<&'t Node>,
    enter: Vec<Frame<'t>>,
    exit: Vec<Frame<'t>>,
}

impl<'t> Follower<'t> {
    fn new(tree: &'t KdTree, ray: &Ray, min_dist: f64, max_dist: f64) -> Self {
        let mut f = Self {
            ray: *ray,
            inv_dir: component_inverse(ray.dir),
            min_dist,
            max_dist,
            current: None,
            enter: Vec::with_capacity(16),
            exit: Vec::with_capacity(16),
        };
        let (a, b, hit) = tree.bound().cross(ray.from, ray.dir, max_dist);
        if !hit {
            return f;
        }

        let mut entry = Frame {
            node: None,
            t: a,
            point: ray.from,
        };
        if a > 0.0 {
            entry.point = ray.from + ray.dir * a;
        }
        f.enter.push(entry);
        f.exit.push(entry);
        f.exit.push(Frame {
            node: None,
            t: b,
            point: ray.at(b),
        });
        f.current = Some(tree.root());
        f
    }

    /// Descend to the next leaf along the ray and return its indices.
    fn find_leaf(&mut self) -> Option<&'t [usize]> {
        let mut node = self.current?;
        let enter = *self.enter.last()?;
        if enter.t > self.max_dist {
            return None;
        }
        loop {
            let (axis, pivot, left, right) = match node {
                Node::Leaf(indices) => {
                    self.current = Some(node);
                    return Some(indices);
                }
                Node::Interior {
                    axis,
                    pivot,
                    left,
                    right,
                } => (axis.index(), *pivot, left.as_ref(), right.as_ref()),
            };
            let exit = self.exit.last()?.point;

            let far = if enter.point[axis] < pivot {
                node = left;
                if exit[axis] < pivot {
                    continue;
                }
                right
            } else {
                node = right;
                if exit[axis] >= pivot {
                    continue;
                }
                left
            };

            let t = (pivot - self.ray.from[axis]) * self.inv_dir[axis];
            let mut point = self.ray.from + self.ray.dir * t;
            point[axis] = pivot;
            self.exit.push(Frame {
                node: Some(far),
                t,
                point,
            });
        }
    }

    /// Parameter where the ray leaves the current leaf.
    fn leaf_exit(&self) -> f64 {
        self.exit.last().map_or(f64::INFINITY, |f| f.t)
    }

    /// Move past the current leaf.
    fn pop(&mut self) {
        self.enter.clear();
        self.enter.extend_from_slice(&self.exit);
        self.current = self.exit.pop().and_then(|f| f.node);
    }
}

impl Intersecter for KdIntersecter {
    fn bound(&self) -> Bound {
        self.tree.bound()
    }

    fn intersect(&self, ray: &Ray, dist: f64) -> Option<Collision<'_>> {
        let mut f = Follower::new(&self.tree, ray, ray.tmin, dist);
        let mut best: Option<(usize, Hit)> = None;
        while let Some(indices) = f.find_leaf() {
            for (i, hit) in self.leaf_hits(indices, ray) {
                if in_range(hit.depth, f.min_dist, f.max_dist) {
                    f.max_dist = hit.depth;
                    best = Some((i, hit));
                }
            }
            // A straddling primitive may be hit past this leaf; a nearer
            // hit could still be waiting in the next one.
            if best.is_some_and(|(_, hit)| hit.depth <= f.leaf_exit()) {
                break;
            }
            f.pop();
        }
        best.map(|(i, hit)| Collision::new(&*self.prims[i], *ray, hit))
    }

    fn shadowed(&self, ray: &Ray, dist: f64) -> bool {
        let mut f = Follower::new(&self.tree, ray, ray.tmin, dist);
        while let Some(indices) = f.find_leaf() {
            if self
                .leaf_hits(indices, ray)
                .any(|(_, hit)| in_range(hit.depth, f.min_dist, f.max_dist))
            {
                return true;
            }
            f.pop();
        }
        false
    }

    fn transparent_shadow(&self, state: &RenderState, ray: &Ray, max_depth: u32, dist: f64) -> (Rgb, bool) {
        let mut f = Follower::new(&self.tree, ray, ray.tmin, dist);
        let mut seen = HashSet::new();
        let mut pending: Vec<usize> = Vec::new();
        let mut filter = ShadowFilter::new(state, max_depth);

        loop {
            while pending.is_empty() {
                let Some(indices) = f.find_leaf() else {
                    return filter.passed();
                };
                pending.extend(indices.iter().copied().filter(|&i| seen.insert(i)));
                f.pop();
            }
            let Some(i) = pending.pop() else {
                continue;
            };
            let prim = &*self.prims[i];
            let Some(hit) = prim.intersect(ray).filter(|h| in_range(h.depth, f.min_dist, f.max_dist)) else {
                continue;
            };
            if !filter.pass(&Collision::new(prim, *ray, hit)) {
                return BLOCKED;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intersect::SimpleIntersecter;
    use crate::mesh::Mesh;
    use crate::object::Object3d;
    use crate::sphere::Sphere;
    use rand::{Rng, SeedableRng};

    fn sphere_grid() -> Vec<Arc<dyn Primitive>> {
        let mut prims: Vec<Arc<dyn Primitive>> = Vec::new();
        for x in -3i32..=3 {
            for y in -3i32..=3 {
                let c = Vector::new(f64::from(x), f64::from(y), f64::from((x + y).rem_euclid(2)));
                prims.push(Arc::new(Sphere::new(c, 0.3, None)));
            }
        }
        prims
    }

    fn terrain() -> Vec<Arc<dyn Primitive>> {
        let mut mesh = Mesh::new(false);
        let n = 12;
        for j in 0..=n {
            for i in 0..=n {
                let (x, y) = (f64::from(i) - 6.0, f64::from(j) - 6.0);
                mesh.add_vertex(Vector::new(x, y, (x * 0.7).sin() * (y * 0.5).cos()));
            }
        }
        let row = (n + 1) as usize;
        for j in 0..n as usize {
            for i in 0..n as usize {
                let a = j * row + i;
                mesh.add_triangle(a, a + 1, a + row, None).unwrap();
                mesh.add_triangle(a + 1, a + row + 1, a + row, None).unwrap();
            }
        }
        mesh.primitives()
    }

    fn assert_agrees(prims: Vec<Arc<dyn Primitive>>, seed: u64) {
        let simple = SimpleIntersecter::new(prims.clone());
        let kd = KdIntersecter::new(prims);
        assert_eq!(simple.bound(), kd.bound());
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        for _ in 0..500 {
            let from = Vector::new(rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0), rng.gen_range(-4.0..4.0));
            let target = Vector::new(rng.gen_range(-4.0..4.0), rng.gen_range(-4.0..4.0), rng.gen_range(-1.0..1.0));
            let ray = Ray::new(from, (target - from).normalize());
            let a = simple.intersect(&ray, f64::INFINITY).map(|c| c.depth);
            let b = kd.intersect(&ray, f64::INFINITY).map(|c| c.depth);
            match (a, b) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-9, "{ray:?}: {a} vs {b}"),
                (None, None) => {}
                _ => panic!("{ray:?}: simple {a:?}, kd {b:?}"),
            }
            assert_eq!(simple.shadowed(&ray, 5.0), kd.shadowed(&ray, 5.0), "{ray:?}");
        }
    }

    #[test]
    fn test_spheres_match_linear_scan() {
        assert_agrees(sphere_grid(), 7);
    }

    #[test]
    fn test_triangles_match_linear_scan() {
        let prims = terrain();
        assert!(prims.len() > 200);
        assert_agrees(prims, 11);
    }

    #[test]
    fn test_axis_aligned_rays() {
        let kd = KdIntersecter::new(sphere_grid());
        // Parallel to two slabs; passes through the centre row.
        let ray = Ray::new(Vector::new(-10.0, 0.0, 0.0), Vector::X);
        let coll = kd.intersect(&ray, f64::INFINITY).unwrap();
        assert!((coll.point().x - -2.3).abs() < 1e-9);
        let ray = Ray::new(Vector::new(-10.0, 0.5, 0.0), Vector::X);
        assert!(kd.intersect(&ray, f64::INFINITY).is_none());
    }

    #[test]
    fn test_empty() {
        let kd = KdIntersecter::new(Vec::new());
        let ray = Ray::new(Vector::ZERO, Vector::X);
        assert!(kd.intersect(&ray, f64::INFINITY).is_none());
        assert!(!kd.shadowed(&ray, f64::INFINITY));
    }
}
