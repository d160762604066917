use std::fmt;
use std::sync::Arc;

use kdray_math::{Bound, Ray, Vector};

use super::clip::{tri_box_clip, tri_plane_clip};
use super::overlap::tri_box_overlap;
use super::{intersect::moller_trumbore, Face, MeshData};
use crate::material::Material;
use crate::primitive::{ClipPlane, Clipped, Collision, Hit, Primitive};
use crate::surface::SurfacePoint;

/// A single face of a mesh, usable as a primitive.
#[derive(Clone)]
pub struct Triangle {
    mesh: Arc<MeshData>,
    index: usize,
}

impl Triangle {
    pub(crate) fn new(mesh: Arc<MeshData>, index: usize) -> Self {
        Self { mesh, index }
    }

    fn face(&self) -> &Face {
        &self.mesh.faces[self.index]
    }

    pub fn vertices(&self) -> [Vector; 3] {
        self.mesh.face_vertices(self.face())
    }

    pub fn normal(&self) -> Vector {
        self.face().normal
    }

    pub fn surface_area(&self) -> f64 {
        let [a, b, c] = self.vertices();
        (b - a).cross(c - a).length() * 0.5
    }

    fn closed_outline(&self) -> Vec<Vector> {
        let [a, b, c] = self.vertices();
        vec![a, b, c, a]
    }

    fn clip_box(&self, bound: &Bound) -> Option<Clipped> {
        match tri_box_clip(bound, &self.closed_outline()) {
            Ok(Some((polygon, bound))) => Some(Clipped {
                bound,
                polygon: Some(polygon),
            }),
            Ok(None) => None,
            Err(err) => {
                log::debug!("Box clip of triangle {} failed ({err}), keeping full bound", self.index);
                Some(Clipped {
                    bound: self.bound(),
                    polygon: None,
                })
            }
        }
    }
}

impl fmt::Debug for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.vertices();
        write!(f, "Triangle{{{a} {b} {c} N:{}}}", self.normal())
    }
}

impl Primitive for Triangle {
    fn bound(&self) -> Bound {
        let [a, b, c] = self.vertices();
        Bound::new(a.min(b).min(c), a.max(b).max(c))
    }

    fn intersects_bound(&self, bound: &Bound) -> bool {
        tri_box_overlap(bound, &self.vertices())
    }

    fn intersect(&self, ray: &Ray) -> Option<Hit> {
        let [a, b, c] = self.vertices();
        let (depth, u, v) = moller_trumbore(a, b, c, ray.from, ray.dir)?;
        if depth < 0.0 {
            return None;
        }
        Some(Hit {
            depth,
            user_data: [u, v],
        })
    }

    fn surface<'a>(&'a self, coll: &Collision<'a>) -> SurfacePoint<'a> {
        let mesh = &*self.mesh;
        let face = self.face();
        let vert = self.vertices();
        // Intersection reports the weights of the second and third corner.
        let [v, w] = coll.user_data;
        let u = 1.0 - v - w;

        let mut sp = SurfacePoint {
            geometric_normal: face.normal,
            position: coll.point(),
            material: self.material(),
            light: mesh.light.as_deref(),
            primitive: Some(coll.primitive),
            primitive_number: Some(self.index),
            surface_u: u,
            surface_v: v,
            available: true,
            ..Default::default()
        };

        sp.normal = match face.n {
            Some(n) if !mesh.normals.is_empty() => {
                let [n0, n1, n2] = n.map(|i| mesh.normals[i]);
                (n0 * u + n1 * v + n2 * w).normalize_or_zero()
            }
            _ => face.normal,
        };

        sp.has_orco = mesh.has_orco;
        if mesh.has_orco {
            sp.orco_position = vert[0] * u + vert[1] * v + vert[2] * w;
            sp.orco_normal = (vert[1] - vert[0]).cross(vert[2] - vert[0]).normalize_or_zero();
        } else {
            sp.orco_position = sp.position;
            sp.orco_normal = sp.geometric_normal;
        }

        match face.uv {
            Some(uv) if !mesh.uvs.is_empty() => {
                let [t0, t1, t2] = uv.map(|i| mesh.uvs[i]);
                sp.has_uv = true;
                sp.u = u * t0.x + v * t1.x + w * t2.x;
                sp.v = u * t0.y + v * t1.y + w * t2.y;

                let (du1, du2) = (t0.x - t2.x, t1.x - t2.x);
                let (dv1, dv2) = (t0.y - t2.y, t1.y - t2.y);
                let det = du1 * dv2 - dv1 * du2;
                if det != 0.0 {
                    let invdet = 1.0 / det;
                    let dp1 = vert[0] - vert[2];
                    let dp2 = vert[1] - vert[2];
                    sp.world_u = dp1 * (dv2 * invdet) - dp2 * (dv1 * invdet);
                    sp.world_v = dp2 * (du1 * invdet) - dp1 * (du2 * invdet);
                }
            }
            _ => {
                sp.u = u;
                sp.v = v;
                sp.world_u = vert[1] - vert[0];
                sp.world_v = vert[2] - vert[0];
            }
        }

        sp.set_shading_frame();
        sp
    }

    fn material(&self) -> Option<&dyn Material> {
        self.face().material.as_deref()
    }

    fn clip(&self, bound: &Bound, plane: Option<ClipPlane>, previous: Option<&[Vector]>) -> Option<Clipped> {
        let (Some(plane), Some(previous)) = (plane, previous) else {
            return self.clip_box(bound);
        };
        let pos = if plane.lower { bound.lo(plane.axis) } else { bound.hi(plane.axis) };
        match tri_plane_clip(plane.axis, pos, plane.lower, previous) {
            Ok(Some((polygon, bound))) => Some(Clipped {
                bound,
                polygon: Some(polygon),
            }),
            Ok(None) => None,
            Err(err) => {
                log::debug!("Plane clip of triangle {} failed ({err}), retrying against box", self.index);
                self.clip_box(bound)
            }
        }
    }
}
