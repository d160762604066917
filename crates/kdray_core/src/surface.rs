//! Reconstructed hit records and ray differentials.

use kdray_math::{DVec3, DifferentialRay, Vector};

use crate::light::Light;
use crate::material::Material;
use crate::primitive::Primitive;

/// Everything the shading code needs to know about a point on a surface.
///
/// References to the primitive, its material and its light are borrowed
/// from the scene for the duration of a single integration call.
#[derive(Clone, Copy, Default)]
pub struct SurfacePoint<'a> {
    pub material: Option<&'a dyn Material>,
    pub light: Option<&'a dyn Light>,
    pub primitive: Option<&'a dyn Primitive>,

    /// Index of the primitive within its object, if it has one.
    pub primitive_number: Option<usize>,

    pub position: Vector,
    /// Shading normal (possibly interpolated)
    pub normal: Vector,
    pub geometric_normal: Vector,
    pub orco_position: Vector,
    pub orco_normal: Vector,
    pub has_orco: bool,
    pub has_uv: bool,
    /// Set when the point was produced by a successful intersection.
    pub available: bool,

    /// Texture coordinates
    pub u: f64,
    pub v: f64,

    /// Orthonormal frame around `normal`
    pub normal_u: Vector,
    pub normal_v: Vector,
    /// World-space surface tangents
    pub world_u: Vector,
    pub world_v: Vector,
    /// World tangents expressed in the `(normal_u, normal_v, normal)` frame
    pub shading_u: Vector,
    pub shading_v: Vector,

    /// Raw surface parametrics
    pub surface_u: f64,
    pub surface_v: f64,
}

impl SurfacePoint<'_> {
    /// Fill the shading frame and project the world tangents into it.
    pub fn set_shading_frame(&mut self) {
        let (nu, nv) = kdray_math::create_cs(self.normal);
        self.normal_u = nu;
        self.normal_v = nv;
        self.shading_u = DVec3::new(nu.dot(self.world_u), nv.dot(self.world_u), self.normal.dot(self.world_u));
        self.shading_v = DVec3::new(nu.dot(self.world_v), nv.dot(self.world_v), self.normal.dot(self.world_v));
    }
}

/// Surface footprint of a differential ray.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Differentials {
    pub dp_dx: Vector,
    pub dp_dy: Vector,
    position: Vector,
    normal: Vector,
}

impl Differentials {
    /// Intersect the neighbour rays of `ray` with the tangent plane at `sp`.
    ///
    /// Neighbour rays parallel to the plane contribute a zero offset.
    pub fn new(sp: &SurfacePoint<'_>, ray: &DifferentialRay) -> Self {
        let n = sp.normal;
        let d = -n.dot(sp.position);
        let offset = |from: Vector, dir: Vector| {
            let denom = n.dot(dir);
            if denom == 0.0 {
                return Vector::ZERO;
            }
            let t = -(n.dot(from) + d) / denom;
            from + dir * t - sp.position
        };
        Self {
            dp_dx: offset(ray.from_x, ray.dir_x),
            dp_dy: offset(ray.from_y, ray.dir_y),
            position: sp.position,
            normal: n,
        }
    }

    /// Propagate differentials through a mirror reflection.
    ///
    /// `out` must already hold the reflected primary ray.
    pub fn reflect_ray(&self, input: &DifferentialRay, out: &mut DifferentialRay) {
        let n = self.normal;
        out.from_x = self.position + self.dp_dx;
        out.from_y = self.position + self.dp_dy;
        let ix = input.ray.dir - input.dir_x;
        let iy = input.ray.dir - input.dir_y;
        out.dir_x = out.ray.dir - ix + n * (2.0 * ix.dot(n));
        out.dir_y = out.ray.dir - iy + n * (2.0 * iy.dot(n));
        out.has_differentials = true;
    }

    /// Propagate differentials through a refraction with relative index `ior`.
    pub fn refract_ray(&self, input: &DifferentialRay, out: &mut DifferentialRay, ior: f64) {
        let n = self.normal;
        out.from_x = self.position + self.dp_dx;
        out.from_y = self.position + self.dp_dy;
        let wo = -input.ray.dir;
        let dwo_dx = input.ray.dir - input.dir_x;
        let dwo_dy = input.ray.dir - input.dir_y;
        let cos_wo = wo.dot(n);
        let cos_wi = out.ray.dir.dot(n).abs();
        let ddn_dx = dwo_dx.dot(n);
        let ddn_dy = dwo_dy.dot(n);
        let scale = if cos_wi > 0.0 { ior * ior * cos_wo / cos_wi } else { 0.0 };
        let dmu_dx = (ior - scale) * ddn_dx;
        let dmu_dy = (ior - scale) * ddn_dy;
        out.dir_x = out.ray.dir + (dwo_dx * ior - n * dmu_dx);
        out.dir_y = out.ray.dir + (dwo_dy * ior - n * dmu_dy);
        out.has_differentials = true;
    }

    /// Approximate area covered by one pixel on the surface.
    pub fn projected_pixel_area(&self) -> f64 {
        self.dp_dx.cross(self.dp_dy).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kdray_math::Ray;

    fn plane_point() -> SurfacePoint<'static> {
        SurfacePoint {
            position: DVec3::ZERO,
            normal: DVec3::Z,
            ..Default::default()
        }
    }

    #[test]
    fn test_differentials_on_plane() {
        let sp = plane_point();
        let primary = Ray::new(DVec3::new(0.0, 0.0, 1.0), -DVec3::Z);
        let x = Ray::new(DVec3::new(0.1, 0.0, 1.0), -DVec3::Z);
        let y = Ray::new(DVec3::new(0.0, 0.2, 1.0), -DVec3::Z);
        let diff = Differentials::new(&sp, &DifferentialRay::new(primary, &x, &y));
        assert!((diff.dp_dx - DVec3::new(0.1, 0.0, 0.0)).length() < 1e-12);
        assert!((diff.dp_dy - DVec3::new(0.0, 0.2, 0.0)).length() < 1e-12);
        assert!((diff.projected_pixel_area() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_differentials_parallel_neighbour() {
        let sp = plane_point();
        let primary = Ray::new(DVec3::new(0.0, 0.0, 1.0), -DVec3::Z);
        let grazing = Ray::new(DVec3::new(0.0, 0.0, 1.0), DVec3::X);
        let diff = Differentials::new(&sp, &DifferentialRay::new(primary, &grazing, &grazing));
        assert_eq!(diff.dp_dx, DVec3::ZERO);
        assert!(diff.projected_pixel_area().is_finite());
    }

    #[test]
    fn test_reflect_keeps_parallel_bundle() {
        let sp = plane_point();
        let dir = DVec3::new(1.0, 0.0, -1.0).normalize();
        let primary = Ray::new(DVec3::new(-1.0, 0.0, 1.0), dir);
        let x = Ray::new(DVec3::new(-0.9, 0.0, 1.0), dir);
        let input = DifferentialRay::new(primary, &x, &x);
        let diff = Differentials::new(&sp, &input);
        let reflected = DVec3::new(dir.x, dir.y, -dir.z);
        let mut out = DifferentialRay::from_ray(Ray::new(sp.position, reflected));
        diff.reflect_ray(&input, &mut out);
        assert!(out.has_differentials);
        assert!((out.dir_x - reflected).length() < 1e-12);
        assert!((out.from_x - DVec3::new(0.1, 0.0, 0.0)).length() < 1e-12);
    }
}
