use kdray_core::material::{Bsdf, Material, MaterialSample};
use kdray_core::{RenderState, SurfacePoint};
use kdray_math::{Rgb, Vector};
use serde::{Deserialize, Serialize};

use super::common::reflect;

/// A flat colour that ignores lighting geometry. Handy for checking
/// which surfaces are hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebugMaterial {
    pub color: Rgb,
}

impl DebugMaterial {
    pub fn new(color: Rgb) -> Self {
        Self { color }
    }
}

impl Material for DebugMaterial {
    fn init_bsdf(&self, _state: &mut RenderState, _sp: &SurfacePoint<'_>) -> Bsdf {
        Bsdf::DIFFUSE
    }

    fn flags(&self) -> Bsdf {
        Bsdf::DIFFUSE
    }

    fn eval(&self, _state: &RenderState, _sp: &SurfacePoint<'_>, _wo: Vector, _wl: Vector, _types: Bsdf) -> Rgb {
        self.color
    }

    fn sample(&self, _state: &RenderState, sp: &SurfacePoint<'_>, wo: Vector, s: &mut MaterialSample) -> (Rgb, Vector) {
        s.pdf = 1.0;
        s.sampled_flags = Bsdf::DIFFUSE;
        (self.color, reflect(sp.normal, wo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_material() {
        let mat = DebugMaterial::new(Rgb::new(0.2, 0.4, 0.6));
        let mut state = RenderState::new();
        let sp = SurfacePoint {
            normal: Vector::Z,
            ..Default::default()
        };
        assert_eq!(mat.init_bsdf(&mut state, &sp), Bsdf::DIFFUSE);
        assert_eq!(mat.eval(&state, &sp, Vector::Z, Vector::X, Bsdf::ALL), mat.color);

        let mut s = MaterialSample::new(0.5, 0.5);
        let wo = Vector::new(1.0, 0.0, 1.0).normalize();
        let (c, wi) = mat.sample(&state, &sp, wo, &mut s);
        assert_eq!(c, mat.color);
        assert_eq!(s.pdf, 1.0);
        assert!((wi - Vector::new(-wo.x, 0.0, wo.z)).length() < 1e-12);
        assert_eq!(mat.pdf(&state, &sp, wo, wi, Bsdf::ALL), 0.0);
    }
}
