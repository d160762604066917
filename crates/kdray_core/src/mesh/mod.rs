//! Triangle meshes.
//!
//! A [`Mesh`] owns flat vertex, normal and UV arrays plus a face list.
//! Geometry lives behind an `Arc` so that each [`Triangle`] primitive can
//! refer back to its mesh for the whole render without owning it.

mod clip;
mod intersect;
mod overlap;
mod triangle;

use std::sync::Arc;

use kdray_math::{DVec2, Vector};
use thiserror::Error;

use crate::light::Light;
use crate::material::Material;
use crate::object::Object3d;
use crate::primitive::Primitive;

pub use clip::{poly_bound, tri_box_clip, tri_plane_clip, ClipError, MAX_POLYGON};
pub use intersect::moller_trumbore;
pub use overlap::tri_box_overlap;
pub use triangle::Triangle;

/// Errors raised while assembling a mesh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("vertex index {0} out of range")]
    VertexIndex(usize),

    #[error("normal index {0} out of range")]
    NormalIndex(usize),

    #[error("uv index {0} out of range")]
    UvIndex(usize),

    #[error("face {0} does not exist")]
    Face(usize),
}

/// One triangle of a mesh, as indices into the mesh arrays.
#[derive(Clone)]
pub struct Face {
    pub v: [usize; 3],
    /// Per-vertex normal indices, when smoothing is set up
    pub n: Option<[usize; 3]>,
    /// Per-vertex UV indices
    pub uv: Option<[usize; 3]>,
    normal: Vector,
    material: Option<Arc<dyn Material>>,
}

impl Face {
    /// Cached geometric normal.
    pub fn normal(&self) -> Vector {
        self.normal
    }

    pub fn material(&self) -> Option<&Arc<dyn Material>> {
        self.material.as_ref()
    }
}

/// Shared geometry of a mesh.
#[derive(Clone, Default)]
pub struct MeshData {
    pub(crate) vertices: Vec<Vector>,
    pub(crate) normals: Vec<Vector>,
    pub(crate) uvs: Vec<DVec2>,
    pub(crate) faces: Vec<Face>,
    pub(crate) has_orco: bool,
    pub(crate) light: Option<Arc<dyn Light>>,
}

impl MeshData {
    pub fn vertices(&self) -> &[Vector] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vector] {
        &self.normals
    }

    pub fn uvs(&self) -> &[DVec2] {
        &self.uvs
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn has_orco(&self) -> bool {
        self.has_orco
    }

    /// Corner positions of a face.
    pub fn face_vertices(&self, face: &Face) -> [Vector; 3] {
        face.v.map(|i| self.vertices[i])
    }
}

/// A triangle mesh object.
#[derive(Clone, Default)]
pub struct Mesh {
    data: Arc<MeshData>,
    hidden: bool,
}

impl Mesh {
    /// Create an empty mesh. `has_orco` enables original-coordinate shading.
    pub fn new(has_orco: bool) -> Self {
        Self {
            data: Arc::new(MeshData {
                has_orco,
                ..Default::default()
            }),
            hidden: false,
        }
    }

    pub fn data(&self) -> &MeshData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut MeshData {
        Arc::make_mut(&mut self.data)
    }

    pub fn add_vertex(&mut self, v: Vector) -> usize {
        let data = self.data_mut();
        data.vertices.push(v);
        data.vertices.len() - 1
    }

    pub fn add_normal(&mut self, n: Vector) -> usize {
        let data = self.data_mut();
        data.normals.push(n);
        data.normals.len() - 1
    }

    pub fn add_uv(&mut self, uv: DVec2) -> usize {
        let data = self.data_mut();
        data.uvs.push(uv);
        data.uvs.len() - 1
    }

    /// Add a face over three existing vertices and return its index.
    pub fn add_triangle(&mut self, a: usize, b: usize, c: usize, material: Option<Arc<dyn Material>>) -> Result<usize, MeshError> {
        let data = self.data_mut();
        let n = data.vertices.len();
        if let Some(&bad) = [a, b, c].iter().find(|&&i| i >= n) {
            return Err(MeshError::VertexIndex(bad));
        }
        let [va, vb, vc] = [a, b, c].map(|i| data.vertices[i]);
        data.faces.push(Face {
            v: [a, b, c],
            n: None,
            uv: None,
            normal: (vb - va).cross(vc - va).normalize_or_zero(),
            material,
        });
        Ok(data.faces.len() - 1)
    }

    /// Assign per-vertex normals to a face.
    pub fn set_face_normals(&mut self, face: usize, normals: [usize; 3]) -> Result<(), MeshError> {
        let data = self.data_mut();
        if let Some(&bad) = normals.iter().find(|&&i| i >= data.normals.len()) {
            return Err(MeshError::NormalIndex(bad));
        }
        data.faces.get_mut(face).ok_or(MeshError::Face(face))?.n = Some(normals);
        Ok(())
    }

    /// Assign per-vertex UVs to a face.
    pub fn set_face_uvs(&mut self, face: usize, uvs: [usize; 3]) -> Result<(), MeshError> {
        let data = self.data_mut();
        if let Some(&bad) = uvs.iter().find(|&&i| i >= data.uvs.len()) {
            return Err(MeshError::UvIndex(bad));
        }
        data.faces.get_mut(face).ok_or(MeshError::Face(face))?.uv = Some(uvs);
        Ok(())
    }

    /// Replace the normal array with area-weighted vertex normals and
    /// point every face at them.
    pub fn smooth_normals(&mut self) {
        let data = self.data_mut();
        let mut normals = vec![Vector::ZERO; data.vertices.len()];
        for face in &data.faces {
            let [a, b, c] = face.v.map(|i| data.vertices[i]);
            // Unnormalised cross product weights by area.
            let n = (b - a).cross(c - a);
            for &i in &face.v {
                normals[i] += n;
            }
        }
        data.normals = normals.into_iter().map(|n| n.normalize_or_zero()).collect();
        for face in &mut data.faces {
            face.n = Some(face.v);
        }
    }

    /// Bind an area light to the mesh so hits report it.
    pub fn set_light(&mut self, light: Option<Arc<dyn Light>>) {
        self.data_mut().light = light;
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn len(&self) -> usize {
        self.data.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.faces.is_empty()
    }
}

impl Object3d for Mesh {
    fn primitives(&self) -> Vec<Arc<dyn Primitive>> {
        (0..self.data.faces.len())
            .map(|index| Arc::new(Triangle::new(self.data.clone(), index)) as Arc<dyn Primitive>)
            .collect()
    }

    fn is_visible(&self) -> bool {
        !self.hidden
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        let mut mesh = Mesh::new(false);
        let a = mesh.add_vertex(Vector::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Vector::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Vector::new(1.0, 1.0, 0.0));
        let d = mesh.add_vertex(Vector::new(0.0, 1.0, 0.0));
        mesh.add_triangle(a, b, c, None).unwrap();
        mesh.add_triangle(a, c, d, None).unwrap();
        mesh
    }

    #[test]
    fn test_add_triangle_caches_normal() {
        let mesh = quad();
        assert_eq!(mesh.len(), 2);
        for face in mesh.data().faces() {
            assert_eq!(face.normal(), Vector::Z);
        }
    }

    #[test]
    fn test_add_triangle_rejects_bad_index() {
        let mut mesh = quad();
        assert_eq!(mesh.add_triangle(0, 1, 9, None), Err(MeshError::VertexIndex(9)));
        assert_eq!(mesh.set_face_uvs(0, [0, 0, 0]), Err(MeshError::UvIndex(0)));
        mesh.smooth_normals();
        assert_eq!(mesh.set_face_normals(7, [0, 1, 2]), Err(MeshError::Face(7)));
    }

    #[test]
    fn test_smooth_normals() {
        let mut mesh = quad();
        mesh.smooth_normals();
        assert_eq!(mesh.data().normals().len(), 4);
        assert!(mesh.data().normals().iter().all(|&n| (n - Vector::Z).length() < 1e-12));
        assert!(mesh.data().faces().iter().all(|f| f.n == Some(f.v)));
    }

    #[test]
    fn test_primitives_share_geometry() {
        let mut mesh = quad();
        let prims = mesh.primitives();
        assert_eq!(prims.len(), 2);
        // Editing after handing out primitives copies on write.
        mesh.add_vertex(Vector::splat(5.0));
        assert_eq!(mesh.data().vertices().len(), 5);
        assert_eq!(prims[0].bound().max, Vector::new(1.0, 1.0, 0.0));
        mesh.set_hidden(true);
        assert!(!mesh.is_visible());
    }
}
