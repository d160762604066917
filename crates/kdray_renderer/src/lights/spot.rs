use std::f64::consts::PI;

use kdray_core::light::{DiracLight, Light, LightFlags, LightSample};
use kdray_core::sampling::{self, Pdf1D};
use kdray_core::SurfacePoint;
use kdray_math::{create_cs, Ray, Rgb, Vector};

/// Table size for sampling the falloff band.
const FALLOFF_STEPS: usize = 65;

/// A cone of light with a smooth falloff at its rim.
#[derive(Debug, Clone)]
pub struct SpotLight {
    position: Vector,
    direction: Vector,
    du: Vector,
    dv: Vector,
    /// Cosine where the falloff begins
    cos_start: f64,
    /// Cosine of the full cone angle
    cos_end: f64,
    icos_diff: f64,
    color: Rgb,
    intensity: f64,
    /// Smoothstep over the falloff band
    falloff_pdf: Pdf1D,
    /// Share of emitted energy inside the full-strength cone
    interv1: f64,
    /// Share of emitted energy in the falloff band
    interv2: f64,
}

fn smoothstep(v: f64) -> f64 {
    v * v * (3.0 - 2.0 * v)
}

impl SpotLight {
    /// `angle` is the cone half-angle in degrees. `falloff` is the fraction
    /// of it, measured from the rim, over which the light fades out.
    pub fn new(from: Vector, to: Vector, color: Rgb, power: f64, angle: f64, falloff: f64) -> Self {
        let direction = (to - from).normalize();
        let (du, dv) = create_cs(direction);
        let rad = angle.to_radians();
        let cos_start = (rad * (1.0 - falloff)).cos();
        let cos_end = rad.cos();

        let f = (0..FALLOFF_STEPS)
            .map(|i| smoothstep(i as f64 / FALLOFF_STEPS as f64))
            .collect();

        // The smoothstep integrates to one half over the band, and equal
        // steps in cosine cover equal areas of the sphere.
        let mut interv1 = 1.0 - cos_start;
        let mut interv2 = 0.5 * (cos_start - cos_end);
        let sum = interv1 + interv2;
        if sum > 1e-10 {
            interv1 /= sum;
            interv2 /= sum;
        }

        Self {
            position: from,
            direction,
            du,
            dv,
            cos_start,
            cos_end,
            icos_diff: 1.0 / (cos_start - cos_end),
            color: color * power,
            intensity: power,
            falloff_pdf: Pdf1D::new(f),
            interv1,
            interv2,
        }
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn direction(&self) -> Vector {
        self.direction
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Strength factor for a direction whose cosine to the axis is `cosa`.
    fn falloff(&self, cosa: f64) -> Option<f64> {
        if cosa < self.cos_end {
            None
        } else if cosa >= self.cos_start {
            Some(1.0)
        } else {
            Some(smoothstep((cosa - self.cos_end) * self.icos_diff))
        }
    }

    /// Colour, direction and directional pdf of an emitted ray.
    fn emit(&self, s1: f64, s2: f64, s3: f64) -> (Rgb, Vector, f64) {
        if s3 <= self.interv1 {
            let wo = sampling::cone(self.direction, self.du, self.dv, self.cos_start, s1, s2);
            return (self.color, wo, self.interv1 / (2.0 * (1.0 - self.cos_start)));
        }
        let (sm2, spdf) = self.falloff_pdf.sample(s2);
        let sm2 = sm2 / self.falloff_pdf.len() as f64;
        let pdf = (self.interv2 * spdf) / (2.0 * (self.cos_start - self.cos_end));
        let cos_angle = self.cos_end + (self.cos_start - self.cos_end) * sm2;
        let sin_angle = (1.0 - cos_angle * cos_angle).max(0.0).sqrt();
        let t1 = 2.0 * PI * s1;
        let wo = (self.du * t1.cos() + self.dv * t1.sin()) * sin_angle + self.direction * cos_angle;
        // Colour follows the falloff
        (self.color * (spdf * self.falloff_pdf.integral()), wo, pdf)
    }
}

impl Light for SpotLight {
    fn flags(&self) -> LightFlags {
        LightFlags::SINGULAR
    }

    fn total_energy(&self) -> Rgb {
        self.color * (2.0 * PI * (1.0 - 0.5 * (self.cos_start + self.cos_end)))
    }

    fn emit_photon(&self, s1: f64, s2: f64, s3: f64, _s4: f64) -> (Rgb, Ray, f64) {
        let (col, dir, pdf) = self.emit(s1, s2, s3);
        (col, Ray::new(self.position, dir), PI / pdf)
    }

    fn emit_sample(&self, s: &mut LightSample) -> (Vector, Rgb) {
        let (col, wo, dir_pdf) = self.emit(s.s1, s.s2, s.s3);
        s.dir_pdf = dir_pdf;
        s.position = self.position;
        s.area_pdf = 1.0;
        s.flags = self.flags();
        (wo, col)
    }

    fn emit_pdf(&self, _sp: &SurfacePoint<'_>, wo: Vector) -> (f64, f64, f64) {
        let cosa = self.direction.dot(wo);
        let dir_pdf = if cosa < self.cos_end {
            0.0
        } else if cosa >= self.cos_start {
            self.interv1 / (2.0 * (1.0 - self.cos_start))
        } else {
            let v = smoothstep((cosa - self.cos_end) * self.icos_diff);
            self.interv2 * v / (self.cos_start - self.cos_end)
        };
        (1.0, dir_pdf, 1.0)
    }

    fn can_illuminate(&self, p: Vector) -> bool {
        let ldir = self.position - p;
        let dist = ldir.length();
        if dist == 0.0 {
            return false;
        }
        (-self.direction).dot(ldir / dist) >= self.cos_end
    }

    fn illuminate_sample(&self, sp: &SurfacePoint<'_>, wi: &mut Ray, s: &mut LightSample) -> bool {
        let Some(col) = self.illuminate(sp, wi) else {
            return false;
        };
        s.color = col;
        s.flags = self.flags();
        s.pdf = (self.position - sp.position).length_squared();
        s.position = self.position;
        true
    }

    fn as_dirac(&self) -> Option<&dyn DiracLight> {
        Some(self)
    }
}

impl DiracLight for SpotLight {
    fn illuminate(&self, sp: &SurfacePoint<'_>, wi: &mut Ray) -> Option<Rgb> {
        let ldir = self.position - sp.position;
        let dist_sq = ldir.length_squared();
        let dist = dist_sq.sqrt();
        if dist == 0.0 {
            return None;
        }
        let ldir = ldir / dist;
        let strength = self.falloff((-self.direction).dot(ldir))?;
        wi.tmax = dist;
        wi.dir = ldir;
        Some(self.color * (strength / dist_sq))
    }
}
