//! kdray core - geometry, acceleration and the contracts between renderer parts.
//!
//! This crate provides:
//!
//! - **Geometry**: `Triangle`/`Mesh`, `Sphere`, surface reconstruction
//! - **Acceleration**: a SAH kd-tree with triangle clipping, kd and linear intersecters
//! - **Scene**: objects, lights, camera, background and the update protocol
//! - **Contracts**: `Material`, `Light`, `Camera`, `Background`, `VolumeRegion`
//! - **Shading support**: shader graphs, textures, image loading, sampling
//!
//! # Example
//!
//! ```ignore
//! use kdray_core::{Scene, Sphere};
//!
//! let mut scene = Scene::default();
//! scene.add_object(PrimitiveObject::new(Sphere::new(Vector::ZERO, 1.0, Some(material))));
//! scene.set_camera(camera);
//! scene.update()?;
//! ```

pub mod background;
pub mod camera;
pub mod framebuffer;
pub mod intersect;
pub mod kdtree;
pub mod light;
pub mod material;
pub mod mesh;
pub mod object;
pub mod photon;
pub mod primitive;
pub mod sampling;
pub mod scene;
pub mod shader;
pub mod sphere;
pub mod state;
pub mod surface;
pub mod texture;
pub mod volume;

// Re-export commonly used types
pub use background::Background;
pub use camera::Camera;
pub use framebuffer::{Fragment, Image};
pub use intersect::{Intersecter, IntersecterBuilder};
pub use light::{Light, LightFlags, LightSample};
pub use material::{Bsdf, Material, MaterialSample, PDF_CUTOFF};
pub use mesh::{Mesh, Triangle};
pub use object::{Object3d, ObjectId, PrimitiveObject};
pub use primitive::{Collision, Primitive};
pub use scene::{Scene, SceneError};
pub use shader::{ShaderError, ShaderGraph, ShaderNode, ShaderParams, ShaderResult};
pub use sphere::Sphere;
pub use state::RenderState;
pub use surface::{Differentials, SurfacePoint};
pub use texture::{ImageTexture, Texture, TextureError, TextureMapper};
