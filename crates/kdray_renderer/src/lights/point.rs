use std::f64::consts::PI;

use kdray_core::light::{DiracLight, Light, LightFlags, LightSample};
use kdray_core::sampling;
use kdray_core::SurfacePoint;
use kdray_math::{Ray, Rgb, Vector};

/// An isotropic point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    position: Vector,
    color: Rgb,
    intensity: f64,
}

impl PointLight {
    pub fn new(position: Vector, color: Rgb, intensity: f64) -> Self {
        let color = color * intensity;
        Self {
            position,
            color,
            intensity: color.energy(),
        }
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }
}

impl Light for PointLight {
    fn flags(&self) -> LightFlags {
        LightFlags::SINGULAR
    }

    fn total_energy(&self) -> Rgb {
        self.color * (4.0 * PI)
    }

    fn emit_photon(&self, s1: f64, s2: f64, _s3: f64, _s4: f64) -> (Rgb, Ray, f64) {
        let ray = Ray::new(self.position, sampling::sphere(s1, s2));
        (self.color, ray, 4.0 * PI)
    }

    fn emit_sample(&self, s: &mut LightSample) -> (Vector, Rgb) {
        s.position = self.position;
        s.flags = self.flags();
        s.dir_pdf = 0.25;
        s.area_pdf = 1.0;
        (sampling::sphere(s.s1, s.s2), self.color)
    }

    fn emit_pdf(&self, _sp: &SurfacePoint<'_>, _wo: Vector) -> (f64, f64, f64) {
        (1.0, 0.25, 1.0)
    }

    fn illuminate_sample(&self, sp: &SurfacePoint<'_>, wi: &mut Ray, s: &mut LightSample) -> bool {
        if self.illuminate(sp, wi).is_none() {
            return false;
        }
        s.flags = self.flags();
        s.color = self.color;
        s.pdf = (self.position - sp.position).length_squared();
        s.position = self.position;
        true
    }

    fn as_dirac(&self) -> Option<&dyn DiracLight> {
        Some(self)
    }
}

impl DiracLight for PointLight {
    fn illuminate(&self, sp: &SurfacePoint<'_>, wi: &mut Ray) -> Option<Rgb> {
        let ldir = self.position - sp.position;
        let dist_sq = ldir.length_squared();
        let dist = dist_sq.sqrt();
        if dist == 0.0 {
            return None;
        }
        wi.tmax = dist;
        wi.dir = ldir / dist;
        Some(self.color / dist_sq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(p: Vector) -> SurfacePoint<'static> {
        SurfacePoint {
            position: p,
            normal: Vector::Z,
            ..Default::default()
        }
    }

    #[test]
    fn test_inverse_square() {
        let light = PointLight::new(Vector::new(0.0, 0.0, 2.0), Rgb::new(1.0, 0.5, 0.25), 4.0);
        let mut wi = Ray::default();
        let c = light.illuminate(&point_at(Vector::ZERO), &mut wi).unwrap();
        assert_eq!(c, Rgb::new(1.0, 0.5, 0.25));
        assert_eq!(wi.dir, Vector::Z);
        assert_eq!(wi.tmax, 2.0);
    }

    #[test]
    fn test_coincident_point_is_not_lit() {
        let light = PointLight::new(Vector::ONE, Rgb::WHITE, 1.0);
        let mut wi = Ray::default();
        assert!(light.illuminate(&point_at(Vector::ONE), &mut wi).is_none());
        let mut s = LightSample::new(0.5, 0.5);
        assert!(!light.illuminate_sample(&point_at(Vector::ONE), &mut wi, &mut s));
    }

    #[test]
    fn test_sample_and_energy() {
        let light = PointLight::new(Vector::new(3.0, 0.0, 0.0), Rgb::gray(0.5), 2.0);
        let mut wi = Ray::default();
        let mut s = LightSample::new(0.1, 0.9);
        assert!(light.illuminate_sample(&point_at(Vector::ZERO), &mut wi, &mut s));
        assert_eq!(s.pdf, 9.0);
        assert_eq!(s.color, Rgb::WHITE);
        assert!(s.flags.contains(LightFlags::SINGULAR));
        assert!((light.intensity() - 1.0).abs() < 1e-12);
        assert!((light.total_energy().r - 4.0 * PI).abs() < 1e-12);

        let (col, ray, ipdf) = light.emit_photon(0.3, 0.6, 0.0, 0.0);
        assert_eq!(col, Rgb::WHITE);
        assert_eq!(ray.from, light.position());
        assert!((ray.dir.length() - 1.0).abs() < 1e-12);
        assert_eq!(ipdf, 4.0 * PI);
    }
}
