//! The scene: everything needed to render an image.

use std::collections::BTreeMap;
use std::sync::Arc;

use bitflags::bitflags;
use kdray_math::{Bound, Ray, Rgb};
use thiserror::Error;

use crate::background::Background;
use crate::camera::Camera;
use crate::intersect::{self, Intersecter, IntersecterBuilder};
use crate::light::Light;
use crate::object::{Object3d, ObjectId};
use crate::primitive::{Collision, Primitive};
use crate::state::RenderState;
use crate::volume::VolumeRegion;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene has no camera")]
    NoCamera,
    #[error("no object with id {0}")]
    InvalidObject(ObjectId),
}

bitflags! {
    /// Parts of the scene modified since the last update.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChangeSet: u32 {
        const OBJECTS = 1 << 0;
        const LIGHTS = 1 << 1;
        const OTHER = 1 << 2;
    }
}

/// Geometry, lights, camera and background of a render.
///
/// Mutate freely, then call [`update`](Scene::update) before querying; the
/// acceleration structure is only rebuilt for what changed.
pub struct Scene {
    changes: ChangeSet,
    next_id: u32,

    objects: BTreeMap<ObjectId, Box<dyn Object3d>>,
    volumes: Vec<Box<dyn VolumeRegion>>,
    lights: Vec<Box<dyn Light>>,
    camera: Option<Box<dyn Camera>>,
    background: Option<Box<dyn Background>>,

    intersecter: Option<Box<dyn Intersecter>>,
    builder: IntersecterBuilder,
    bound: Bound,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(intersect::new_kd)
    }
}

impl Scene {
    pub fn new(builder: IntersecterBuilder) -> Self {
        Self {
            changes: ChangeSet::all(),
            next_id: 1,
            objects: BTreeMap::new(),
            volumes: Vec::new(),
            lights: Vec::new(),
            camera: None,
            background: None,
            intersecter: None,
            builder,
            bound: Bound::default(),
        }
    }

    pub fn add_light(&mut self, light: Box<dyn Light>) {
        self.lights.push(light);
        self.changes |= ChangeSet::LIGHTS;
    }

    pub fn lights(&self) -> &[Box<dyn Light>] {
        &self.lights
    }

    /// Add an object and return its id.
    pub fn add_object(&mut self, object: Box<dyn Object3d>) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, object);
        self.changes |= ChangeSet::OBJECTS;
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<&dyn Object3d> {
        self.objects.get(&id).map(|o| o.as_ref())
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Result<Box<dyn Object3d>, SceneError> {
        let object = self.objects.remove(&id).ok_or(SceneError::InvalidObject(id))?;
        self.changes |= ChangeSet::OBJECTS;
        Ok(object)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &dyn Object3d)> + '_ {
        self.objects.iter().map(|(id, o)| (*id, o.as_ref()))
    }

    pub fn add_volume(&mut self, volume: Box<dyn VolumeRegion>) {
        self.volumes.push(volume);
        self.changes |= ChangeSet::OTHER;
    }

    pub fn volumes(&self) -> &[Box<dyn VolumeRegion>] {
        &self.volumes
    }

    pub fn camera(&self) -> Option<&dyn Camera> {
        self.camera.as_deref()
    }

    pub fn set_camera(&mut self, camera: Box<dyn Camera>) {
        self.camera = Some(camera);
        self.changes |= ChangeSet::OTHER;
    }

    pub fn background(&self) -> Option<&dyn Background> {
        self.background.as_deref()
    }

    pub fn set_background(&mut self, background: Box<dyn Background>) {
        self.background = Some(background);
        self.changes |= ChangeSet::LIGHTS;
    }

    /// Box around all geometry as of the last update.
    pub fn bound(&self) -> Bound {
        self.bound
    }

    /// Pending changes.
    pub fn changes(&self) -> ChangeSet {
        self.changes
    }

    /// Nearest collision along `ray`. A negative `dist` uses the ray's own
    /// range, or no limit for an unbounded ray.
    pub fn intersect(&self, ray: &Ray, dist: f64) -> Option<Collision<'_>> {
        let dist = match dist {
            d if d >= 0.0 => d,
            _ if ray.tmax >= 0.0 => ray.tmax,
            _ => f64::INFINITY,
        };
        let Some(isect) = &self.intersecter else {
            log::warn!("Intersect called without an update");
            return None;
        };
        isect.intersect(ray, dist)
    }

    /// Whether anything blocks `ray`. The origin is pushed forward by
    /// `ray.tmin` to avoid self-shadowing. A bounded ray tests its own
    /// range; otherwise a negative `dist` means no limit.
    pub fn shadowed(&self, ray: &Ray, dist: f64) -> bool {
        let Some(isect) = &self.intersecter else {
            log::warn!("Shadowed called without an update");
            return false;
        };
        let (ray, dist) = offset_shadow_ray(ray, dist);
        isect.shadowed(&ray, dist)
    }

    /// Filter colour along a shadow ray, see [`Intersecter::transparent_shadow`].
    pub fn transparent_shadow(&self, state: &RenderState, ray: &Ray, max_depth: u32, dist: f64) -> (Rgb, bool) {
        let Some(isect) = &self.intersecter else {
            log::warn!("Transparent shadow called without an update");
            return (Rgb::WHITE, false);
        };
        let (ray, dist) = offset_shadow_ray(ray, dist);
        isect.transparent_shadow(state, &ray, max_depth, dist)
    }

    /// Prepare the scene for rendering, rebuilding whatever changed.
    pub fn update(&mut self) -> Result<(), SceneError> {
        if self.changes.is_empty() {
            return Ok(());
        }
        if self.camera.is_none() {
            return Err(SceneError::NoCamera);
        }
        log::debug!("Performing scene update ({:?})", self.changes);

        if self.changes.contains(ChangeSet::OBJECTS) {
            self.intersecter = None;
            let prims: Vec<Arc<dyn Primitive>> = self
                .objects
                .values()
                .filter(|o| o.is_visible())
                .flat_map(|o| o.primitives())
                .collect();
            log::debug!("Geometry collected, {} primitives", prims.len());
            if prims.is_empty() {
                self.bound = Bound::default();
            } else {
                let isect = (self.builder)(prims);
                self.bound = isect.bound();
                self.intersecter = Some(isect);
            }
        }

        if self.changes.contains(ChangeSet::LIGHTS) {
            for light in &mut self.lights {
                light.set_scene(&self.bound);
            }
            if let Some(bg) = &mut self.background {
                bg.set_scene(&self.bound);
            }
            log::debug!("Set up {} lights", self.lights.len());
        }

        self.changes = ChangeSet::empty();
        Ok(())
    }
}

fn offset_shadow_ray(ray: &Ray, dist: f64) -> (Ray, f64) {
    let mut shifted = *ray;
    shifted.from += ray.dir * ray.tmin;
    let dist = match dist {
        _ if ray.tmax >= 0.0 => ray.tmax - 2.0 * ray.tmin,
        d if d >= 0.0 => d,
        _ => f64::INFINITY,
    };
    (shifted, dist)
}
