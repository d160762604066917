//! The built-in demo scene: three spheres on a ground plane under a point,
//! a spot and an area light.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use kdray_core::intersect;
use kdray_core::texture::{ClipMode, Coordinates, FileImageLoader, ImageLoader, Interpolation};
use kdray_core::{Camera, ImageTexture, Material, Mesh, PrimitiveObject, Scene, ShaderNode, Sphere, TextureMapper};
use kdray_math::{DVec2, Rgb, Vector};
use kdray_renderer::{
    AreaLight, ConstantBackground, OrthoCamera, PerspectiveCamera, PointLight, ShinyDiffuse, ShinyDiffuseParams,
    ShinyDiffuseShaders, SpotLight,
};

use crate::settings::{CameraKind, IntersecterKind, Settings};

/// Half the edge length of the ground plane.
const GROUND_EXTENT: f64 = 6.0;

/// Times the ground texture repeats along each edge.
const GROUND_REPEAT: u32 = 6;

pub fn build_scene(settings: &Settings) -> Result<Scene> {
    let mut scene = match settings.intersecter {
        IntersecterKind::Kd => Scene::new(intersect::new_kd),
        IntersecterKind::Simple => Scene::new(intersect::new_simple),
    };
    scene.set_camera(build_camera(settings));
    scene.set_background(Box::new(ConstantBackground::new(Rgb::new(0.05, 0.07, 0.1))));

    let ground = ground_material(settings.ground_texture.as_deref())?;
    scene.add_object(Box::new(ground_plane(ground)?));

    let red: Arc<dyn Material> = Arc::new(ShinyDiffuse::new(ShinyDiffuseParams {
        color: Rgb::new(0.8, 0.15, 0.1),
        ..Default::default()
    }));
    let mirror: Arc<dyn Material> = Arc::new(ShinyDiffuse::new(ShinyDiffuseParams {
        color: Rgb::gray(0.9),
        diffuse: 0.1,
        specular_reflect: 0.9,
        ..Default::default()
    }));
    let glass: Arc<dyn Material> = Arc::new(ShinyDiffuse::new(ShinyDiffuseParams {
        color: Rgb::new(0.7, 0.9, 1.0),
        diffuse: 0.0,
        specular_reflect: 1.0,
        transparency: 1.0,
        transmit_filter: 0.5,
        ior: 1.5,
        fresnel_effect: true,
        ..Default::default()
    }));
    scene.add_object(Box::new(PrimitiveObject::new(Sphere::new(Vector::new(-1.8, 1.0, -0.5), 1.0, Some(red)))));
    scene.add_object(Box::new(PrimitiveObject::new(Sphere::new(Vector::new(0.5, 0.8, -1.5), 0.8, Some(mirror)))));
    scene.add_object(Box::new(PrimitiveObject::new(Sphere::new(Vector::new(1.4, 0.6, 1.0), 0.6, Some(glass)))));

    scene.add_light(Box::new(PointLight::new(Vector::new(3.0, 5.0, 4.0), Rgb::WHITE, 30.0)));
    scene.add_light(Box::new(SpotLight::new(
        Vector::new(-4.0, 6.0, 3.0),
        Vector::new(-1.8, 0.0, -0.5),
        Rgb::new(1.0, 0.9, 0.7),
        40.0,
        25.0,
        0.3,
    )));
    // Facing down, toward `to_x × to_y`
    scene.add_light(Box::new(AreaLight::new(
        Vector::new(-1.0, 6.0, -1.0),
        Vector::new(2.0, 0.0, 0.0),
        Vector::new(0.0, 0.0, 2.0),
        Rgb::WHITE,
        6.0,
        4,
    )));

    log::debug!("Built demo scene with {} lights", scene.lights().len());
    Ok(scene)
}

fn build_camera(settings: &Settings) -> Box<dyn Camera> {
    let cam = &settings.camera;
    match cam.kind {
        CameraKind::Perspective => Box::new(
            PerspectiveCamera::new(cam.position, cam.look_at, cam.up, settings.width, settings.height, 1.0, cam.focal_distance)
                .with_aperture(cam.aperture, cam.dof_distance)
                .with_bokeh(cam.bokeh, cam.bias, cam.rotation),
        ),
        CameraKind::Ortho => Box::new(OrthoCamera::new(
            cam.position,
            cam.look_at,
            cam.up,
            settings.width,
            settings.height,
            1.0,
            cam.scale,
        )),
    }
}

/// Gray, or the given image tiled over the plane.
fn ground_material(texture: Option<&Path>) -> Result<Arc<dyn Material>> {
    let params = ShinyDiffuseParams {
        color: Rgb::gray(0.7),
        ..Default::default()
    };
    let Some(path) = texture else {
        return Ok(Arc::new(ShinyDiffuse::new(params)));
    };

    let name = path.to_str().context("Texture path is not valid UTF-8")?;
    let image = FileImageLoader::new(".")
        .load(name)
        .with_context(|| format!("Failed to load ground texture {}", path.display()))?;
    log::info!("Loaded ground texture {} ({}x{})", path.display(), image.width(), image.height());

    let texture = ImageTexture::new(Arc::new(image))
        .with_interpolation(Interpolation::Bilinear)
        .with_clip(ClipMode::Repeat)
        .with_repeat(GROUND_REPEAT, GROUND_REPEAT);
    let mapper: Arc<dyn ShaderNode> = Arc::new(TextureMapper::new(Arc::new(texture), Coordinates::Uv, false));
    let shaders = ShinyDiffuseShaders {
        diffuse_color: Some(mapper),
        ..Default::default()
    };
    Ok(Arc::new(ShinyDiffuse::with_shaders(params, shaders)?))
}

/// A square in the `y = 0` plane facing up, as two triangles with UVs.
fn ground_plane(material: Arc<dyn Material>) -> Result<Mesh> {
    let e = GROUND_EXTENT;
    let mut mesh = Mesh::new(false);
    let corners = [
        (Vector::new(-e, 0.0, -e), DVec2::new(0.0, 1.0)),
        (Vector::new(-e, 0.0, e), DVec2::new(0.0, 0.0)),
        (Vector::new(e, 0.0, e), DVec2::new(1.0, 0.0)),
        (Vector::new(e, 0.0, -e), DVec2::new(1.0, 1.0)),
    ];
    for (v, uv) in corners {
        mesh.add_vertex(v);
        mesh.add_uv(uv);
    }
    for tri in [[0, 1, 2], [0, 2, 3]] {
        let face = mesh.add_triangle(tri[0], tri[1], tri[2], Some(material.clone()))?;
        mesh.set_face_uvs(face, tri)?;
    }
    Ok(mesh)
}
