use std::f64::consts::PI;

use kdray_core::light::{Light, LightFlags, LightIntersecter, LightSample};
use kdray_core::sampling;
use kdray_core::SurfacePoint;
use kdray_math::{create_cs, Ray, Rgb, Vector};

/// A one-sided parallelogram emitting uniform radiance.
///
/// The light spans `corner + s·to_x + t·to_y` for `s, t` in `[0, 1]` and
/// emits toward `to_x × to_y`.
#[derive(Debug, Clone)]
pub struct AreaLight {
    corner: Vector,
    to_x: Vector,
    to_y: Vector,
    /// Unnormalised `to_x × to_y`
    cross: Vector,
    normal: Vector,
    du: Vector,
    dv: Vector,
    area: f64,
    /// Emitted radiance
    color: Rgb,
    samples: u32,
}

impl AreaLight {
    pub fn new(corner: Vector, to_x: Vector, to_y: Vector, color: Rgb, power: f64, samples: u32) -> Self {
        let cross = to_x.cross(to_y);
        let area = cross.length();
        let normal = if area > 0.0 { cross / area } else { Vector::Z };
        let (du, dv) = create_cs(normal);
        Self {
            corner,
            to_x,
            to_y,
            cross,
            normal,
            du,
            dv,
            area,
            color: color * power,
            samples: samples.max(1),
        }
    }

    pub fn normal(&self) -> Vector {
        self.normal
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    fn point_at(&self, s: f64, t: f64) -> Vector {
        self.corner + self.to_x * s + self.to_y * t
    }
}

impl Light for AreaLight {
    fn flags(&self) -> LightFlags {
        LightFlags::empty()
    }

    fn num_samples(&self) -> u32 {
        self.samples
    }

    fn total_energy(&self) -> Rgb {
        self.color * (self.area * PI)
    }

    fn emit_photon(&self, s1: f64, s2: f64, s3: f64, s4: f64) -> (Rgb, Ray, f64) {
        let from = self.point_at(s3, s4);
        let dir = sampling::cos_hemisphere(self.normal, self.du, self.dv, s1, s2);
        (self.color, Ray::new(from, dir), self.area * PI)
    }

    fn emit_sample(&self, s: &mut LightSample) -> (Vector, Rgb) {
        s.area_pdf = 1.0 / self.area;
        s.position = self.point_at(s.s3, s.s4);
        s.normal = self.normal;
        s.flags = self.flags();
        let wo = sampling::cos_hemisphere(self.normal, self.du, self.dv, s.s1, s.s2);
        s.dir_pdf = self.normal.dot(wo).abs() / PI;
        (wo, self.color)
    }

    fn emit_pdf(&self, _sp: &SurfacePoint<'_>, wo: Vector) -> (f64, f64, f64) {
        let cos_wo = wo.dot(self.normal);
        let dir_pdf = if cos_wo > 0.0 { cos_wo / PI } else { 0.0 };
        (1.0 / self.area, dir_pdf, cos_wo)
    }

    fn can_illuminate(&self, p: Vector) -> bool {
        (p - self.corner).dot(self.normal) > 0.0
    }

    fn illuminate_sample(&self, sp: &SurfacePoint<'_>, wi: &mut Ray, s: &mut LightSample) -> bool {
        let p = self.point_at(s.s1, s.s2);
        let ldir = p - sp.position;
        let dist_sq = ldir.length_squared();
        let dist = dist_sq.sqrt();
        if dist == 0.0 {
            return false;
        }
        let ldir = ldir / dist;
        let cos_angle = -ldir.dot(self.normal);
        if cos_angle <= 0.0 {
            return false;
        }
        wi.tmax = dist;
        wi.dir = ldir;

        s.color = self.color;
        s.flags = self.flags();
        s.pdf = dist_sq / (self.area * cos_angle);
        s.position = p;
        s.normal = self.normal;
        true
    }

    fn illuminate_pdf(&self, sp: &SurfacePoint<'_>, light_point: &SurfacePoint<'_>) -> f64 {
        let wo = light_point.position - sp.position;
        let dist_sq = wo.length_squared();
        if dist_sq == 0.0 {
            return 0.0;
        }
        let cos_angle = -(wo / dist_sq.sqrt()).dot(self.normal);
        if cos_angle <= 0.0 {
            0.0
        } else {
            dist_sq / (self.area * cos_angle)
        }
    }

    fn as_intersecter(&self) -> Option<&dyn LightIntersecter> {
        Some(self)
    }
}

impl LightIntersecter for AreaLight {
    fn intersect(&self, ray: &Ray) -> Option<(f64, Rgb, f64)> {
        let dir_len = ray.dir.length();
        if dir_len == 0.0 || self.area == 0.0 {
            return None;
        }
        // Only the front face emits
        let cos_angle = -ray.dir.dot(self.normal) / dir_len;
        if cos_angle <= 0.0 {
            return None;
        }
        let t = (self.corner - ray.from).dot(self.cross) / ray.dir.dot(self.cross);
        if t.is_nan() || t <= 0.0 || (ray.tmax >= 0.0 && t > ray.tmax) {
            return None;
        }
        let p = ray.at(t) - self.corner;
        let nn = self.cross.length_squared();
        let s = p.cross(self.to_y).dot(self.cross) / nn;
        let u = self.to_x.cross(p).dot(self.cross) / nn;
        if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&u) {
            return None;
        }
        let dist = t * dir_len;
        Some((dist, self.color, self.area * cos_angle / (dist * dist)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit square centred above the origin at height 1, facing down.
    fn ceiling() -> AreaLight {
        AreaLight::new(Vector::new(-0.5, -0.5, 1.0), Vector::Y, Vector::X, Rgb::WHITE, 3.0, 4)
    }

    fn floor_point() -> SurfacePoint<'static> {
        SurfacePoint {
            normal: Vector::Z,
            ..Default::default()
        }
    }

    #[test]
    fn test_orientation() {
        let light = ceiling();
        assert_eq!(light.normal(), -Vector::Z);
        assert_eq!(light.area(), 1.0);
        assert_eq!(light.num_samples(), 4);
        assert!(light.can_illuminate(Vector::ZERO));
        assert!(!light.can_illuminate(Vector::new(0.0, 0.0, 2.0)));
    }

    #[test]
    fn test_illuminate_sample() {
        let light = ceiling();
        let mut wi = Ray::default();
        let mut s = LightSample::new(0.5, 0.5);
        assert!(light.illuminate_sample(&floor_point(), &mut wi, &mut s));
        assert_eq!(wi.dir, Vector::Z);
        assert_eq!(wi.tmax, 1.0);
        assert_eq!(s.pdf, 1.0);
        assert_eq!(s.color, Rgb::gray(3.0));

        // From above the light sees its back
        let above = SurfacePoint {
            position: Vector::new(0.0, 0.0, 2.0),
            ..Default::default()
        };
        assert!(!light.illuminate_sample(&above, &mut wi, &mut s));
    }

    #[test]
    fn test_intersect_matches_sample_pdf() {
        let light = ceiling();
        let dir = Vector::new(0.2, -0.1, 1.0).normalize();
        let (dist, col, ipdf) = light.intersect(&Ray::new(Vector::ZERO, dir)).unwrap();
        assert_eq!(col, Rgb::gray(3.0));

        let hit = dir * dist;
        assert!((hit.z - 1.0).abs() < 1e-12);
        let light_point = SurfacePoint {
            position: hit,
            ..Default::default()
        };
        let pdf = light.illuminate_pdf(&floor_point(), &light_point);
        assert!((pdf * ipdf - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_intersect_misses() {
        let light = ceiling();
        // Past the edge
        assert!(light.intersect(&Ray::new(Vector::ZERO, Vector::new(1.0, 0.0, 1.0))).is_none());
        // Back face
        assert!(light.intersect(&Ray::new(Vector::new(0.0, 0.0, 2.0), -Vector::Z)).is_none());
        // Too short
        let short = Ray::new(Vector::ZERO, Vector::Z).with_range(0.0, 0.5);
        assert!(light.intersect(&short).is_none());
    }

    #[test]
    fn test_energy() {
        let light = ceiling();
        assert!((light.total_energy().r - 3.0 * PI).abs() < 1e-12);
        let (col, ray, ipdf) = light.emit_photon(0.5, 0.5, 0.25, 0.75);
        assert_eq!(col, Rgb::gray(3.0));
        assert!(ray.dir.dot(light.normal()) > 0.0);
        assert_eq!(ipdf, PI);
    }
}
