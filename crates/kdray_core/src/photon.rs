//! Photon storage and nearest-neighbour gathering.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f64::consts::PI;

use kdray_math::{Axis, Rgb, Vector};

use crate::kdtree::{KdData, KdTree, Node, Options};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Photon {
    pub position: Vector,
    /// Direction the photon arrived from
    pub direction: Vector,
    pub color: Rgb,
}

impl Photon {
    pub fn new(position: Vector, direction: Vector, color: Rgb) -> Self {
        Self {
            position,
            direction,
            color,
        }
    }
}

/// A photon found by [`PhotonMap::gather`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatherResult {
    pub photon: Photon,
    /// Squared distance to the lookup point
    pub distance_sq: f64,
}

impl Eq for GatherResult {}

impl PartialOrd for GatherResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GatherResult {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_sq.total_cmp(&other.distance_sq)
    }
}

/// Density estimation kernel for a photon at squared distance `photon_sq`
/// inside a gather radius whose square is `gather_sq`.
pub fn kernel(photon_sq: f64, gather_sq: f64) -> f64 {
    let s = 1.0 - photon_sq / gather_sq;
    3.0 / (gather_sq * PI) * s * s
}

struct PhotonPositions<'a>(&'a [Photon]);

impl KdData for PhotonPositions<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn dimension(&self, i: usize, axis: Axis) -> (f64, f64) {
        let v = axis.of(self.0[i].position);
        (v, v)
    }
}

/// A photon list with a kd-tree over the positions.
///
/// Lookups see the photons as of the last [`update`](Self::update).
#[derive(Debug, Default)]
pub struct PhotonMap {
    photons: Vec<Photon>,
    paths: usize,
    fresh: bool,
    tree: Option<KdTree>,
}

impl PhotonMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of light paths shot to fill the map.
    pub fn num_paths(&self) -> usize {
        self.paths
    }

    pub fn set_num_paths(&mut self, paths: usize) {
        self.paths = paths;
    }

    pub fn add_photon(&mut self, photon: Photon) {
        self.photons.push(photon);
        self.fresh = false;
    }

    pub fn photons(&self) -> &[Photon] {
        &self.photons
    }

    pub fn len(&self) -> usize {
        self.photons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photons.is_empty()
    }

    pub fn clear(&mut self) {
        self.photons.clear();
        self.tree = None;
        self.fresh = false;
    }

    /// Whether the tree reflects every added photon.
    pub fn ready(&self) -> bool {
        self.fresh
    }

    /// Rebuild the lookup tree.
    pub fn update(&mut self) {
        self.tree = None;
        if self.photons.is_empty() {
            return;
        }
        let opts = Options {
            leaf_size: 1,
            ..Default::default()
        };
        self.tree = Some(KdTree::build(&PhotonPositions(&self.photons), &opts));
        self.fresh = true;
    }

    /// Up to `n_lookup` photons nearest to `p` with squared distance below
    /// `max_dist_sq`, in no particular order.
    pub fn gather(&self, p: Vector, n_lookup: usize, max_dist_sq: f64) -> Vec<GatherResult> {
        let mut heap = BinaryHeap::with_capacity(n_lookup + 1);
        if n_lookup == 0 {
            return Vec::new();
        }
        let mut max_dist_sq = max_dist_sq;
        self.lookup(p, &mut max_dist_sq, |result, max| {
            heap.push(result);
            if heap.len() > n_lookup {
                heap.pop();
            }
            if heap.len() == n_lookup {
                if let Some(top) = heap.peek() {
                    *max = top.distance_sq;
                }
            }
        });
        heap.into_vec()
    }

    /// Nearest photon to `p` arriving from the side `n` faces.
    pub fn find_nearest(&self, p: Vector, n: Vector, max_dist_sq: f64) -> Option<Photon> {
        let mut nearest = None;
        let mut max_dist_sq = max_dist_sq;
        self.lookup(p, &mut max_dist_sq, |result, max| {
            if result.photon.direction.dot(n) > 0.0 {
                nearest = Some(result.photon);
                *max = result.distance_sq;
            }
        });
        nearest
    }

    /// Visit every photon closer than `max_dist_sq`. The visitor may
    /// shrink the radius as it goes.
    fn lookup<F>(&self, p: Vector, max_dist_sq: &mut f64, mut visit: F)
    where
        F: FnMut(GatherResult, &mut f64),
    {
        let Some(tree) = &self.tree else {
            return;
        };
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf(indices) => {
                    for &i in indices {
                        let photon = self.photons[i];
                        let distance_sq = (photon.position - p).length_squared();
                        if distance_sq < *max_dist_sq {
                            visit(GatherResult { photon, distance_sq }, max_dist_sq);
                        }
                    }
                }
                Node::Interior {
                    axis,
                    pivot,
                    left,
                    right,
                } => {
                    let d = axis.of(p) - pivot;
                    let (primary, alternate) = if d > 0.0 { (right, left) } else { (left, right) };
                    if d * d < *max_dist_sq {
                        stack.push(alternate);
                    }
                    stack.push(primary);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn random_map(n: usize) -> PhotonMap {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let mut map = PhotonMap::new();
        for _ in 0..n {
            let p = Vector::new(rng.gen(), rng.gen(), rng.gen());
            let dir = if rng.gen_bool(0.5) { Vector::Z } else { Vector::NEG_Z };
            map.add_photon(Photon::new(p, dir, Rgb::WHITE));
        }
        map.set_num_paths(n);
        map.update();
        map
    }

    #[test]
    fn test_freshness() {
        let mut map = PhotonMap::new();
        assert!(!map.ready());
        map.add_photon(Photon::new(Vector::ZERO, Vector::Z, Rgb::WHITE));
        map.update();
        assert!(map.ready());
        map.add_photon(Photon::new(Vector::ONE, Vector::Z, Rgb::WHITE));
        assert!(!map.ready());
        map.clear();
        assert!(map.is_empty());
        assert!(map.gather(Vector::ZERO, 4, 1.0).is_empty());
    }

    #[test]
    fn test_gather_matches_brute_force() {
        let map = random_map(500);
        let p = Vector::splat(0.5);
        let mut found: Vec<f64> = map.gather(p, 10, 0.25).iter().map(|r| r.distance_sq).collect();
        found.sort_by(f64::total_cmp);

        let mut all: Vec<f64> = map
            .photons()
            .iter()
            .map(|ph| (ph.position - p).length_squared())
            .filter(|&d| d < 0.25)
            .collect();
        all.sort_by(f64::total_cmp);
        all.truncate(10);
        assert_eq!(found, all);
    }

    #[test]
    fn test_gather_radius_limits() {
        let map = random_map(200);
        let results = map.gather(Vector::splat(0.5), 1000, 0.01);
        assert!(results.iter().all(|r| r.distance_sq < 0.01));
        let expected = map
            .photons()
            .iter()
            .filter(|ph| (ph.position - Vector::splat(0.5)).length_squared() < 0.01)
            .count();
        assert_eq!(results.len(), expected);
    }

    #[test]
    fn test_find_nearest_respects_side() {
        let map = random_map(300);
        let p = Vector::splat(0.5);
        let nearest = map.find_nearest(p, Vector::Z, 1.0).unwrap();
        assert!(nearest.direction.dot(Vector::Z) > 0.0);
        let best = map
            .photons()
            .iter()
            .filter(|ph| ph.direction.dot(Vector::Z) > 0.0)
            .map(|ph| (ph.position - p).length_squared())
            .fold(f64::INFINITY, f64::min);
        assert_eq!((nearest.position - p).length_squared(), best);
    }

    #[test]
    fn test_kernel() {
        assert!((kernel(0.0, 1.0) - 3.0 / PI).abs() < 1e-12);
        assert_eq!(kernel(1.0, 1.0), 0.0);
    }
}
