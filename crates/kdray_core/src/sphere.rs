use std::f64::consts::FRAC_1_PI;
use std::sync::Arc;

use kdray_math::{Bound, Ray, Vector};

use crate::material::Material;
use crate::primitive::{Collision, Hit, Primitive};
use crate::surface::SurfacePoint;

/// An analytic sphere.
#[derive(Clone)]
pub struct Sphere {
    center: Vector,
    radius: f64,
    material: Option<Arc<dyn Material>>,
}

impl Sphere {
    pub fn new(center: Vector, radius: f64, material: Option<Arc<dyn Material>>) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    pub fn center(&self) -> Vector {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl std::fmt::Debug for Sphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sphere")
            .field("center", &self.center)
            .field("radius", &self.radius)
            .finish_non_exhaustive()
    }
}

impl Primitive for Sphere {
    fn bound(&self) -> Bound {
        let r = Vector::splat(self.radius * 1.0001);
        Bound::new(self.center - r, self.center + r)
    }

    fn intersects_bound(&self, _bound: &Bound) -> bool {
        true
    }

    fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let vf = ray.from - self.center;
        let ea = ray.dir.length_squared();
        if ea == 0.0 {
            return None;
        }
        let eb = 2.0 * vf.dot(ray.dir);
        let ec = vf.length_squared() - self.radius * self.radius;
        let osc = eb * eb - 4.0 * ea * ec;
        if osc < 0.0 {
            return None;
        }
        let osc = osc.sqrt();
        let near = (-eb - osc) / (2.0 * ea);
        let far = (-eb + osc) / (2.0 * ea);
        let depth = if near >= ray.tmin { near } else { far };
        if depth < ray.tmin {
            return None;
        }
        Some(Hit::new(depth))
    }

    fn surface<'a>(&'a self, coll: &Collision<'a>) -> SurfacePoint<'a> {
        let position = coll.point();
        let offset = position - self.center;
        let normal = offset.normalize_or_zero();
        let (world_u, world_v) = kdray_math::create_cs(normal);
        let mut sp = SurfacePoint {
            material: self.material(),
            primitive: Some(coll.primitive),
            position,
            normal,
            geometric_normal: normal,
            has_orco: true,
            orco_position: offset,
            orco_normal: normal,
            u: normal.y.atan2(normal.x) * FRAC_1_PI + 1.0,
            v: 1.0 - normal.z.clamp(-1.0, 1.0).acos() * FRAC_1_PI,
            world_u,
            world_v,
            available: true,
            ..Default::default()
        };
        sp.surface_u = sp.u;
        sp.surface_v = sp.v;
        sp.set_shading_frame();
        sp
    }

    fn material(&self) -> Option<&dyn Material> {
        self.material.as_deref()
    }
}
