use kdray_math::Vector;

/// Möller-Trumbore ray/triangle intersection.
///
/// Returns `(t, u, v)` where `u` and `v` are the barycentric weights of
/// `b` and `c`. `t` may be negative; range filtering is left to the caller.
pub fn moller_trumbore(a: Vector, b: Vector, c: Vector, from: Vector, dir: Vector) -> Option<(f64, f64, f64)> {
    let edge1 = b - a;
    let edge2 = c - a;
    let pvec = dir.cross(edge2);
    let det = edge1.dot(pvec);
    if det == 0.0 {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = from - a;
    let u = pvec.dot(tvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(edge1);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    Some((edge2.dot(qvec) * inv_det, u, v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(got: (f64, f64, f64), want: (f64, f64, f64)) {
        assert!((got.0 - want.0).abs() < 1e-12, "t: {} != {}", got.0, want.0);
        assert!((got.1 - want.1).abs() < 1e-12, "u: {} != {}", got.1, want.1);
        assert!((got.2 - want.2).abs() < 1e-12, "v: {} != {}", got.2, want.2);
    }

    #[test]
    fn test_axis_aligned_triangles() {
        let cases = [
            ([Vector::new(1.0, 0.0, 0.0), Vector::new(1.0, 1.0, 0.0), Vector::new(1.0, 0.0, 1.0)], Vector::X),
            ([Vector::new(0.0, 1.0, 0.0), Vector::new(1.0, 1.0, 0.0), Vector::new(0.0, 1.0, 1.0)], Vector::Y),
            ([Vector::new(0.0, 0.0, 1.0), Vector::new(0.0, 1.0, 1.0), Vector::new(1.0, 0.0, 1.0)], Vector::Z),
        ];
        for ([a, b, c], dir) in cases {
            let hit = moller_trumbore(a, b, c, Vector::ZERO, dir).expect("hit");
            assert_close(hit, (1.0, 0.0, 0.0));
        }
    }

    #[test]
    fn test_skewed_triangle() {
        let hit = moller_trumbore(
            Vector::new(1.565772, -0.227881, -0.856351),
            Vector::new(0.480624, 1.452136, -0.856351),
            Vector::new(2.433322, 0.332482, 0.856351),
            Vector::new(1.339351, 0.225915, -0.059020),
            Vector::new(0.211504, 0.558421, -0.802142),
        )
        .expect("hit");
        assert_close(hit, (0.44048257340316493, 0.3300573931174704, 0.2592403276257273));
    }

    #[test]
    fn test_miss_and_degenerate() {
        let (a, b, c) = (Vector::new(1.0, 0.0, 0.0), Vector::new(1.0, 1.0, 0.0), Vector::new(1.0, 0.0, 1.0));
        assert!(moller_trumbore(a, b, c, Vector::new(0.0, 2.0, 2.0), Vector::X).is_none());
        // Parallel to the triangle plane.
        assert!(moller_trumbore(a, b, c, Vector::ZERO, Vector::Y).is_none());
        // Zero-length direction.
        assert!(moller_trumbore(a, b, c, Vector::ZERO, Vector::ZERO).is_none());
    }
}
