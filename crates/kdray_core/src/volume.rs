//! Participating media. The scene stores regions; no integrator here
//! marches through them yet.

use std::f64::consts::PI;

use kdray_math::{Bound, Ray, Rgb, Vector};
use serde::{Deserialize, Serialize};

/// A region of space with volumetric effects.
pub trait VolumeRegion: Send + Sync {
    /// Absorption coefficient at `p` looking along `v`.
    fn sigma_a(&self, p: Vector, v: Vector) -> Rgb;
    /// Scattering coefficient.
    fn sigma_s(&self, p: Vector, v: Vector) -> Rgb;
    fn emission(&self, p: Vector, v: Vector) -> Rgb;

    /// Extinction, the sum of absorption and scattering.
    fn sigma_t(&self, p: Vector, v: Vector) -> Rgb {
        self.sigma_a(p, v) + self.sigma_s(p, v)
    }

    /// Phase function value for light direction `l` and scatter direction `s`.
    fn phase(&self, l: Vector, s: Vector) -> f64;

    /// Optical thickness along the part of `ray` inside the region.
    fn tau(&self, ray: &Ray, step: f64, offset: f64) -> Rgb;

    /// Parametric interval where `ray` is inside the region.
    fn intersect(&self, ray: &Ray) -> Option<(f64, f64)> {
        let dist = if ray.tmax < 0.0 { f64::INFINITY } else { ray.tmax };
        let (t0, t1, hit) = self.bound().cross(ray.from, ray.dir, dist);
        hit.then_some((t0, t1))
    }

    fn bound(&self) -> Bound;
}

/// Henyey-Greenstein phase function with asymmetry `g`.
pub fn henyey_greenstein(g: f64, cos_theta: f64) -> f64 {
    let k = 1.0 + g * g - 2.0 * g * cos_theta;
    (1.0 - g * g) / (4.0 * PI * k * k.sqrt())
}

/// Homogeneous medium filling a box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformVolume {
    pub bound: Bound,
    pub sigma_a: Rgb,
    pub sigma_s: Rgb,
    pub emission: Rgb,
    /// Phase asymmetry in `(-1, 1)`
    pub g: f64,
}

impl UniformVolume {
    pub fn new(bound: Bound, sigma_a: Rgb, sigma_s: Rgb, emission: Rgb, g: f64) -> Self {
        Self {
            bound,
            sigma_a,
            sigma_s,
            emission,
            g,
        }
    }
}

impl VolumeRegion for UniformVolume {
    fn sigma_a(&self, p: Vector, _v: Vector) -> Rgb {
        if self.bound.includes(p) {
            self.sigma_a
        } else {
            Rgb::BLACK
        }
    }

    fn sigma_s(&self, p: Vector, _v: Vector) -> Rgb {
        if self.bound.includes(p) {
            self.sigma_s
        } else {
            Rgb::BLACK
        }
    }

    fn emission(&self, p: Vector, _v: Vector) -> Rgb {
        if self.bound.includes(p) {
            self.emission
        } else {
            Rgb::BLACK
        }
    }

    fn phase(&self, l: Vector, s: Vector) -> f64 {
        henyey_greenstein(self.g, l.dot(s))
    }

    fn tau(&self, ray: &Ray, _step: f64, _offset: f64) -> Rgb {
        match self.intersect(ray) {
            Some((t0, t1)) => (self.sigma_a + self.sigma_s) * ((t1 - t0) * ray.dir.length()),
            None => Rgb::BLACK,
        }
    }

    fn bound(&self) -> Bound {
        self.bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_fog() -> UniformVolume {
        UniformVolume::new(
            Bound::new(Vector::ZERO, Vector::ONE),
            Rgb::gray(0.5),
            Rgb::gray(0.25),
            Rgb::BLACK,
            0.0,
        )
    }

    #[test]
    fn test_isotropic_phase() {
        let p = henyey_greenstein(0.0, 0.3);
        assert!((p - 1.0 / (4.0 * PI)).abs() < 1e-12);
    }

    #[test]
    fn test_tau_through_box() {
        let vol = unit_fog();
        let ray = Ray::new(Vector::new(-1.0, 0.5, 0.5), Vector::X);
        let tau = vol.tau(&ray, 0.1, 0.0);
        assert!((tau.r - 0.75).abs() < 1e-12);

        let miss = Ray::new(Vector::new(-1.0, 2.0, 0.5), Vector::X);
        assert!(vol.tau(&miss, 0.1, 0.0).is_black());
        assert!(vol.sigma_t(Vector::splat(0.5), Vector::X) == Rgb::gray(0.75));
        assert!(vol.sigma_a(Vector::splat(2.0), Vector::X).is_black());
    }
}
