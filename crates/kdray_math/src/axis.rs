use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A coordinate axis. The discriminant doubles as the component index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

/// All three axes in index order.
pub const AXES: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

impl Axis {
    /// Component index of this axis.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The next axis, wrapping after Z.
    #[inline]
    pub fn next(self) -> Axis {
        AXES[(self.index() + 1) % 3]
    }

    /// The previous axis, wrapping before X.
    #[inline]
    pub fn prev(self) -> Axis {
        AXES[(self.index() + 2) % 3]
    }

    /// Read this axis' component from a vector.
    #[inline]
    pub fn of(self, v: DVec3) -> f64 {
        v[self.index()]
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Returns which of the three values is the largest. Ties favour X, then Y.
pub fn largest_axis(x: f64, y: f64, z: f64) -> Axis {
    if z > x && z > y {
        Axis::Z
    } else if y > x && y > z {
        Axis::Y
    } else {
        Axis::X
    }
}

/// Builds two unit vectors orthogonal to `normal` (and each other).
///
/// Used for shading frames and UV-less tangent spaces.
pub fn create_cs(normal: DVec3) -> (DVec3, DVec3) {
    if normal.x == 0.0 && normal.y == 0.0 {
        let u = if normal.z < 0.0 {
            DVec3::new(-1.0, 0.0, 0.0)
        } else {
            DVec3::new(1.0, 0.0, 0.0)
        };
        (u, DVec3::new(0.0, 1.0, 0.0))
    } else {
        let d = 1.0 / (normal.y * normal.y + normal.x * normal.x).sqrt();
        let u = DVec3::new(normal.y * d, -normal.x * d, 0.0);
        (u, normal.cross(u))
    }
}

/// Componentwise reciprocal where zero components stay zero.
pub fn component_inverse(v: DVec3) -> DVec3 {
    let inv = |c: f64| if c != 0.0 { 1.0 / c } else { 0.0 };
    DVec3::new(inv(v.x), inv(v.y), inv(v.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_cycle() {
        assert_eq!(Axis::X.next(), Axis::Y);
        assert_eq!(Axis::Z.next(), Axis::X);
        assert_eq!(Axis::X.prev(), Axis::Z);
        assert_eq!(Axis::Y.prev(), Axis::X);
        assert_eq!(Axis::Z.of(DVec3::new(1.0, 2.0, 3.0)), 3.0);
    }

    #[test]
    fn test_largest_axis() {
        assert_eq!(largest_axis(1.0, 2.0, 3.0), Axis::Z);
        assert_eq!(largest_axis(1.0, 3.0, 2.0), Axis::Y);
        assert_eq!(largest_axis(3.0, 1.0, 2.0), Axis::X);
        assert_eq!(largest_axis(1.0, 1.0, 1.0), Axis::X);
    }

    #[test]
    fn test_create_cs_orthonormal() {
        for n in [
            DVec3::Z,
            -DVec3::Z,
            DVec3::new(1.0, 2.0, 3.0).normalize(),
            DVec3::new(-0.3, 0.1, 0.0).normalize(),
        ] {
            let (u, v) = create_cs(n);
            assert!((u.length() - 1.0).abs() < 1e-12);
            assert!((v.length() - 1.0).abs() < 1e-12);
            assert!(u.dot(n).abs() < 1e-12);
            assert!(v.dot(n).abs() < 1e-12);
            assert!(u.dot(v).abs() < 1e-12);
        }
    }

    #[test]
    fn test_component_inverse_zero() {
        let inv = component_inverse(DVec3::new(2.0, 0.0, -4.0));
        assert_eq!(inv, DVec3::new(0.5, 0.0, -0.25));
    }
}
