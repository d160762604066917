//! Ray types.
//!
//! A [`Ray`] carries its valid parametric interval `[tmin, tmax]`; a
//! negative `tmax` means the ray is unbounded.

use glam::DVec3;

/// A ray with origin, direction, parametric range and time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin point of the ray
    pub from: DVec3,
    /// Direction vector (normalised for shading, not required for intersection)
    pub dir: DVec3,
    /// Nearest valid distance
    pub tmin: f64,
    /// Farthest valid distance, negative when unbounded
    pub tmax: f64,
    /// Time value for motion blur
    pub time: f64,
}

impl Ray {
    /// Create an unbounded ray starting at `from`.
    #[inline]
    pub fn new(from: DVec3, dir: DVec3) -> Self {
        Self {
            from,
            dir,
            tmin: 0.0,
            tmax: -1.0,
            time: 0.0,
        }
    }

    /// Set the parametric range.
    #[inline]
    pub fn with_range(mut self, tmin: f64, tmax: f64) -> Self {
        self.tmin = tmin;
        self.tmax = tmax;
        self
    }

    /// Point along the ray at parameter `t`.
    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.from + self.dir * t
    }

    /// Whether the ray has a finite far limit.
    #[inline]
    pub fn is_bounded(&self) -> bool {
        self.tmax >= 0.0
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(DVec3::ZERO, DVec3::Z)
    }
}

/// A ray plus the origins and directions of the rays through the
/// neighbouring pixels, used to estimate the ray's footprint.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DifferentialRay {
    pub ray: Ray,
    pub from_x: DVec3,
    pub from_y: DVec3,
    pub dir_x: DVec3,
    pub dir_y: DVec3,
    pub has_differentials: bool,
}

impl DifferentialRay {
    /// Wrap a ray that has no differentials.
    pub fn from_ray(ray: Ray) -> Self {
        Self {
            ray,
            ..Default::default()
        }
    }

    /// Build a differential ray from a primary ray and its x/y neighbours.
    pub fn new(ray: Ray, x: &Ray, y: &Ray) -> Self {
        Self {
            ray,
            from_x: x.from,
            from_y: y.from,
            dir_x: x.dir,
            dir_y: y.dir,
            has_differentials: true,
        }
    }
}

impl From<Ray> for DifferentialRay {
    fn from(ray: Ray) -> Self {
        Self::from_ray(ray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, 2.0, 0.0));
        assert_eq!(ray.at(0.0), DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(ray.at(1.5), DVec3::new(1.0, 3.0, 0.0));
    }

    #[test]
    fn test_ray_unbounded_by_default() {
        let ray = Ray::new(DVec3::ZERO, DVec3::X);
        assert!(!ray.is_bounded());
        assert!(ray.with_range(0.1, 4.0).is_bounded());
    }

    #[test]
    fn test_differential_ray_neighbours() {
        let primary = Ray::new(DVec3::ZERO, DVec3::Z);
        let x = Ray::new(DVec3::X, DVec3::Z);
        let y = Ray::new(DVec3::Y, DVec3::Z);
        let d = DifferentialRay::new(primary, &x, &y);
        assert!(d.has_differentials);
        assert_eq!(d.from_x, DVec3::X);
        assert_eq!(d.from_y, DVec3::Y);
        assert!(!DifferentialRay::from(primary).has_differentials);
    }
}
