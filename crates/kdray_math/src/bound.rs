use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::{largest_axis, Axis};

/// Axis-aligned bounding box with inclusive `min` and `max` corners.
///
/// The kd-tree, the clipper and the scene all reason in terms of bounds,
/// so the type stays `Copy` and every operation returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bound {
    pub min: DVec3,
    pub max: DVec3,
}

impl Bound {
    /// Create a bound from two corners. `min` must not exceed `max` on any axis.
    #[inline]
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Smallest bound containing every point in `points`.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Bound::new(first, first), |b, p| b.include(p)))
    }

    /// True when both corners are the origin. This is not the same as empty.
    pub fn is_zero(&self) -> bool {
        self.min == DVec3::ZERO && self.max == DVec3::ZERO
    }

    /// The axis-wise extreme of two bounds.
    pub fn union(a: &Bound, b: &Bound) -> Bound {
        Bound {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Ray-slab crossing test.
    ///
    /// Returns `(t_near, t_far, hit)` with both distances clipped to
    /// `[0, dist]`. A zero direction component is a miss when `from` lies
    /// outside that slab and is ignored otherwise.
    pub fn cross(&self, from: DVec3, dir: DVec3, dist: f64) -> (f64, f64, bool) {
        let p = from - self.min;
        let extent = self.max - self.min;
        let mut lmin = f64::NEG_INFINITY;
        let mut lmax = f64::INFINITY;

        for axis in 0..3 {
            if dir[axis] != 0.0 {
                let mut tmp1 = -p[axis] / dir[axis];
                let mut tmp2 = (extent[axis] - p[axis]) / dir[axis];
                if tmp1 > tmp2 {
                    std::mem::swap(&mut tmp1, &mut tmp2);
                }
                if tmp1 > lmin {
                    lmin = tmp1;
                }
                if tmp2 < lmax {
                    lmax = tmp2;
                }
                if lmax < 0.0 || lmin > dist {
                    return (0.0, 0.0, false);
                }
            } else if p[axis] < 0.0 || p[axis] > extent[axis] {
                return (0.0, 0.0, false);
            }
        }

        if lmin > lmax || lmax < 0.0 || lmin > dist {
            return (0.0, 0.0, false);
        }
        (lmin.max(0.0), lmax.min(dist), true)
    }

    pub fn volume(&self) -> f64 {
        let s = self.size();
        s.x * s.y * s.z
    }

    /// Extent along each axis.
    #[inline]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    pub fn half_size(&self) -> DVec3 {
        self.size() * 0.5
    }

    pub fn center(&self) -> DVec3 {
        (self.max + self.min) * 0.5
    }

    pub fn largest_axis(&self) -> Axis {
        let s = self.size();
        largest_axis(s.x, s.y, s.z)
    }

    /// Grow the bound so that it contains `p`.
    pub fn include(self, p: DVec3) -> Bound {
        Bound {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Whether `p` lies inside the bound (boundary inclusive).
    pub fn includes(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Expand by `d` on every side, keeping the centre.
    pub fn grow(self, d: f64) -> Bound {
        Bound {
            min: self.min - DVec3::splat(d),
            max: self.max + DVec3::splat(d),
        }
    }

    /// Lower edge of the bound on `axis`.
    #[inline]
    pub fn lo(&self, axis: Axis) -> f64 {
        self.min[axis.index()]
    }

    /// Upper edge of the bound on `axis`.
    #[inline]
    pub fn hi(&self, axis: Axis) -> f64 {
        self.max[axis.index()]
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bound{{min: {}, max: {}}}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Bound {
        Bound::new(DVec3::splat(-1.0), DVec3::splat(1.0))
    }

    #[test]
    fn test_cross_cases() {
        let b = unit_box();
        let cases = [
            (DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0), true),
            (DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0), true),
            (DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 0.0, 1.0), true),
            (DVec3::new(2.0, 0.0, 0.0), DVec3::new(-1.0, 0.0, 0.0), true),
            (DVec3::new(0.0, -2.0, 0.0), DVec3::new(0.0, 1.0, 0.0), true),
            (DVec3::new(2.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0), false),
            (DVec3::new(0.0, 0.0, -2.0), DVec3::new(0.0, 0.0, -1.0), false),
            (DVec3::new(2.0, 2.0, 2.0), DVec3::new(-1.0, -1.0, -1.0), true),
            (DVec3::new(2.0, 2.0, 2.0), DVec3::new(1.0, 1.0, 1.0), false),
            (DVec3::new(-2.0, -2.0, -2.0), DVec3::new(1.0, 1.0, 1.0), true),
        ];
        for (from, dir, expected) in cases {
            let (_, _, hit) = b.cross(from, dir, f64::INFINITY);
            assert_eq!(hit, expected, "from={from} dir={dir}");
        }
    }

    #[test]
    fn test_cross_parallel_slab() {
        let b = unit_box();
        // Parallel to the Y and Z slabs, inside both.
        let (near, far, hit) = b.cross(DVec3::new(-5.0, 0.5, 0.5), DVec3::X, f64::INFINITY);
        assert!(hit);
        assert_eq!(near, 4.0);
        assert_eq!(far, 6.0);
        // Parallel to the Y slab but outside it.
        let (_, _, hit) = b.cross(DVec3::new(-5.0, 2.0, 0.5), DVec3::X, f64::INFINITY);
        assert!(!hit);
    }

    #[test]
    fn test_real_cross() {
        let b = Bound::new(
            DVec3::new(-1.367188, -0.046875, 0.257812),
            DVec3::new(-0.859375, 0.984375, 0.851562),
        );
        let from = DVec3::new(0.0, 0.0, 5.0);
        let dir = DVec3::new(-0.23640189135082473, 0.2234736629175765, -0.9456075654032989);
        let (a, b, hit) = b.cross(from, dir, f64::INFINITY);
        assert!(hit);
        assert_eq!(a, 4.387060924402294);
        assert_eq!(b, 4.404881484235866);
    }

    #[test]
    fn test_cross_segment_inside() {
        let b = unit_box();
        let from = DVec3::new(3.0, -2.5, 1.5);
        let dir = DVec3::new(-1.0, 0.9, -0.4).normalize();
        let (t0, t1, hit) = b.cross(from, dir, f64::INFINITY);
        assert!(hit);
        for i in 0..=10 {
            let t = t0 + (t1 - t0) * i as f64 / 10.0;
            let p = from + dir * t;
            assert!(b.grow(1e-9).includes(p), "{p} outside at t={t}");
        }
    }

    #[test]
    fn test_cross_respects_distance() {
        let b = unit_box();
        let (_, _, hit) = b.cross(DVec3::new(-5.0, 0.0, 0.0), DVec3::X, 3.0);
        assert!(!hit);
        let (near, far, hit) = b.cross(DVec3::new(-5.0, 0.0, 0.0), DVec3::X, 5.0);
        assert!(hit);
        assert_eq!((near, far), (4.0, 5.0));
    }

    #[test]
    fn test_volume_and_size() {
        let b = Bound::new(DVec3::new(15.0, -27.0, 3.0), DVec3::new(20.0, -24.0, 7.0));
        assert_eq!(b.volume(), 60.0);
        assert_eq!(b.size(), DVec3::new(5.0, 3.0, 4.0));
        assert_eq!(b.largest_axis(), Axis::X);
        assert_eq!(b.center(), DVec3::new(17.5, -25.5, 5.0));
    }

    #[test]
    fn test_union_and_include() {
        let a = Bound::new(DVec3::ZERO, DVec3::ONE);
        let b = Bound::new(DVec3::splat(-1.0), DVec3::splat(0.5));
        let u = Bound::union(&a, &b);
        assert_eq!(u, Bound::new(DVec3::splat(-1.0), DVec3::ONE));
        assert!(u.includes(DVec3::splat(-1.0)));
        assert!(!u.includes(DVec3::splat(1.5)));
        let grown = a.include(DVec3::new(2.0, 0.5, -1.0));
        assert_eq!(grown.max, DVec3::new(2.0, 1.0, 1.0));
        assert_eq!(grown.min, DVec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_from_points() {
        assert!(Bound::from_points(Vec::new()).is_none());
        let b = Bound::from_points([DVec3::X, DVec3::Y, -DVec3::Z]).unwrap();
        assert_eq!(b, Bound::new(DVec3::new(0.0, 0.0, -1.0), DVec3::new(1.0, 1.0, 0.0)));
    }
}
