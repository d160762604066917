//! Triangle/box overlap by the separating axis theorem (Akenine-Möller).

use kdray_math::{Bound, Vector};

/// Whether the plane `normal · x + d = 0` through `vert` crosses a box
/// centred on the origin with half extents `half`.
fn plane_box_overlap(normal: Vector, vert: Vector, half: Vector) -> bool {
    let mut vmin = Vector::ZERO;
    let mut vmax = Vector::ZERO;
    for q in 0..3 {
        if normal[q] > 0.0 {
            vmin[q] = -half[q] - vert[q];
            vmax[q] = half[q] - vert[q];
        } else {
            vmin[q] = half[q] - vert[q];
            vmax[q] = -half[q] - vert[q];
        }
    }
    if normal.dot(vmin) > 0.0 {
        return false;
    }
    normal.dot(vmax) >= 0.0
}

/// Project the triangle onto `axis` and compare against the box radius.
fn axis_separates(axis: Vector, v: &[Vector; 3], half: Vector) -> bool {
    let p0 = axis.dot(v[0]);
    let p1 = axis.dot(v[1]);
    let p2 = axis.dot(v[2]);
    let min = p0.min(p1).min(p2);
    let max = p0.max(p1).max(p2);
    let rad = half.dot(axis.abs());
    min > rad || max < -rad
}

/// Conservative triangle/box containment test used while building.
pub fn tri_box_overlap(bound: &Bound, verts: &[Vector; 3]) -> bool {
    let center = bound.center();
    let half = bound.half_size();
    let v = [verts[0] - center, verts[1] - center, verts[2] - center];
    let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];

    // Nine cross-product axes: each edge against each box axis.
    for e in edges {
        for unit in [Vector::X, Vector::Y, Vector::Z] {
            let axis = unit.cross(e);
            if axis != Vector::ZERO && axis_separates(axis, &v, half) {
                return false;
            }
        }
    }

    // Box face normals, i.e. the triangle's own AABB.
    let tmin = v[0].min(v[1]).min(v[2]);
    let tmax = v[0].max(v[1]).max(v[2]);
    if tmin.cmpgt(half).any() || tmax.cmplt(-half).any() {
        return false;
    }

    let normal = edges[0].cross(edges[1]);
    plane_box_overlap(normal, v[0], half)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Bound {
        Bound::new(Vector::ZERO, Vector::ONE)
    }

    #[test]
    fn test_triangle_inside_box() {
        let tri = [Vector::new(0.2, 0.2, 0.5), Vector::new(0.8, 0.2, 0.5), Vector::new(0.5, 0.8, 0.5)];
        assert!(tri_box_overlap(&unit_box(), &tri));
    }

    #[test]
    fn test_triangle_spanning_box() {
        let tri = [Vector::new(-5.0, -5.0, 0.5), Vector::new(5.0, -5.0, 0.5), Vector::new(0.0, 5.0, 0.5)];
        assert!(tri_box_overlap(&unit_box(), &tri));
    }

    #[test]
    fn test_triangle_disjoint_aabb() {
        let tri = [Vector::new(2.0, 2.0, 2.0), Vector::new(3.0, 2.0, 2.0), Vector::new(2.0, 3.0, 2.0)];
        assert!(!tri_box_overlap(&unit_box(), &tri));
    }

    #[test]
    fn test_triangle_separated_by_edge_axis() {
        // The AABBs overlap but the triangle passes beside the box corner.
        let tri = [Vector::new(2.2, 0.9, 0.5), Vector::new(0.9, 2.2, 0.5), Vector::new(2.2, 2.2, 0.5)];
        let aabb = Bound::from_points(tri).unwrap();
        assert!(aabb.min.cmplt(unit_box().max).all());
        assert!(!tri_box_overlap(&unit_box(), &tri));
    }

    #[test]
    fn test_triangle_plane_misses_box() {
        // Bounding boxes overlap, plane x + y + z = 4 does not reach the box.
        let tri = [Vector::new(4.0, 0.0, 0.0), Vector::new(0.0, 4.0, 0.0), Vector::new(0.0, 0.0, 4.0)];
        assert!(!tri_box_overlap(&unit_box(), &tri));
    }
}
