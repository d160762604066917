use std::f64::consts::{FRAC_PI_4, PI};

use kdray_math::{DVec2, Vector};

/// Cosine-weighted direction about `n`, with `(ru, rv)` completing the frame.
pub fn cos_hemisphere(n: Vector, ru: Vector, rv: Vector, s1: f64, s2: f64) -> Vector {
    let z1 = s1;
    let z2 = s2 * 2.0 * PI;
    (ru * z2.cos() + rv * z2.sin()) * (1.0 - z1).sqrt() + n * z1.sqrt()
}

/// Uniform direction on the unit sphere.
pub fn sphere(s1: f64, s2: f64) -> Vector {
    let z = 1.0 - 2.0 * s1;
    let r = 1.0 - z * z;
    if r > 0.0 {
        let r = r.sqrt();
        let a = 2.0 * PI * s2;
        Vector::new(a.cos() * r, a.sin() * r, z)
    } else {
        Vector::new(0.0, 0.0, z)
    }
}

/// Uniform direction inside the cone about `d` whose half-angle cosine is `max_cos`.
pub fn cone(d: Vector, u: Vector, v: Vector, max_cos: f64, s1: f64, s2: f64) -> Vector {
    let cos_angle = 1.0 - (1.0 - max_cos) * s2;
    let sin_angle = (1.0 - cos_angle * cos_angle).max(0.0).sqrt();
    let t1 = 2.0 * PI * s1;
    (u * t1.cos() + v * t1.sin()) * sin_angle + d * cos_angle
}

/// Add two numbers in `[0, 1)` modulo one.
pub fn add_mod1(a: f64, b: f64) -> f64 {
    let s = a + b;
    if s > 1.0 {
        s - 1.0
    } else {
        s
    }
}

/// Shirley's concentric mapping from the unit square to the unit disk.
pub fn shirley_disk(r1: f64, r2: f64) -> DVec2 {
    let a = 2.0 * r1 - 1.0;
    let b = 2.0 * r2 - 1.0;
    let (r, phi) = if a > -b {
        if a > b {
            (a, FRAC_PI_4 * (b / a))
        } else {
            (b, FRAC_PI_4 * (2.0 - a / b))
        }
    } else if a < b {
        (-a, FRAC_PI_4 * (4.0 + b / a))
    } else if b != 0.0 {
        (-b, FRAC_PI_4 * (6.0 - a / b))
    } else {
        (-b, 0.0)
    };
    DVec2::new(r * phi.cos(), r * phi.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cos_hemisphere_is_unit_and_above() {
        let n = Vector::Z;
        for i in 0..16 {
            for j in 0..16 {
                let w = cos_hemisphere(n, Vector::X, Vector::Y, i as f64 / 16.0, j as f64 / 16.0);
                assert!((w.length() - 1.0).abs() < 1e-12);
                assert!(w.z >= 0.0);
            }
        }
    }

    #[test]
    fn test_sphere_poles() {
        assert_eq!(sphere(0.0, 0.3), Vector::new(0.0, 0.0, 1.0));
        assert_eq!(sphere(1.0, 0.3), Vector::new(0.0, 0.0, -1.0));
        assert!((sphere(0.3, 0.7).length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cone_stays_inside() {
        let max_cos = 0.9;
        for i in 0..10 {
            let w = cone(Vector::Z, Vector::X, Vector::Y, max_cos, i as f64 / 10.0, 0.999);
            assert!(w.z >= max_cos - 1e-9);
            assert!((w.length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_shirley_disk_bounds() {
        assert_eq!(shirley_disk(0.5, 0.5), DVec2::ZERO);
        for i in 0..=8 {
            for j in 0..=8 {
                let p = shirley_disk(i as f64 / 8.0, j as f64 / 8.0);
                assert!(p.length() <= 1.0 + 1e-12);
            }
        }
        assert!((shirley_disk(1.0, 0.5) - DVec2::new(1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_add_mod1() {
        assert_eq!(add_mod1(0.25, 0.5), 0.75);
        assert_eq!(add_mod1(0.75, 0.5), 0.25);
    }
}
