//! Helpers shared by the material implementations.

use kdray_math::Vector;

/// Fresnel reflectance and transmittance `(kr, kt)` for a dielectric with
/// relative index `ior`, seen from direction `i` about normal `n`.
pub fn fresnel(i: Vector, n: Vector, ior: f64) -> (f64, f64) {
    let mut c = i.dot(n);
    if c < 0.0 {
        c = -c;
    }
    let g2 = ior * ior + c * c - 1.0;
    let g = if g2 <= 0.0 { 0.0 } else { g2.sqrt() };
    let aux = c * (g + c);

    let kr = ((0.5 * (g - c) * (g - c)) / ((g + c) * (g + c))) * (1.0 + ((aux - 1.0) * (aux - 1.0)) / ((aux + 1.0) * (aux + 1.0)));
    let kt = if kr < 1.0 { 1.0 - kr } else { 0.0 };
    (kr, kt)
}

/// Mirror `wo` about `n`.
#[inline]
pub fn reflect(n: Vector, wo: Vector) -> Vector {
    n * (2.0 * wo.dot(n)) - wo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresnel_normal_incidence() {
        let (kr, kt) = fresnel(Vector::Z, Vector::Z, 1.5);
        assert!((kr - 0.02 * (1.0 + 2.25 / 12.25)).abs() < 1e-12, "kr = {kr}");
        assert!((kr + kt - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fresnel_matched_index_is_clear() {
        let (kr, kt) = fresnel(Vector::new(0.2, 0.5, 0.7).normalize(), Vector::Z, 1.0);
        assert!(kr.abs() < 1e-12);
        assert!((kt - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fresnel_is_side_independent() {
        let i = Vector::new(0.3, 0.0, 0.8).normalize();
        let a = fresnel(i, Vector::Z, 1.33);
        let b = fresnel(-i, Vector::Z, 1.33);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fresnel_grazing_reflects_more() {
        let steep = fresnel(Vector::new(0.1, 0.0, 1.0).normalize(), Vector::Z, 1.5).0;
        let grazing = fresnel(Vector::new(1.0, 0.0, 0.05).normalize(), Vector::Z, 1.5).0;
        assert!(grazing > steep);
    }

    #[test]
    fn test_reflect() {
        let wo = Vector::new(1.0, 0.0, 1.0).normalize();
        let r = reflect(Vector::Z, wo);
        assert!((r - Vector::new(-wo.x, 0.0, wo.z)).length() < 1e-12);
    }
}
