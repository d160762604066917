//! Cameras for primary ray generation.
//!
//! Both cameras are built from a position, a point to look at and a point
//! above the camera. Pixel `(0, 0)` is the top-left corner of the image.

use std::f64::consts::PI;

use kdray_core::sampling::shirley_disk;
use kdray_core::Camera;
use kdray_math::{Ray, Vector};
use serde::{Deserialize, Serialize};

/// Shape of out-of-focus highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bokeh {
    /// Concentric disk mapping
    #[default]
    Disk1,
    /// Polar disk mapping, honours the bias
    Disk2,
    Triangle,
    Square,
    Pentagon,
    Hexagon,
    /// Only the rim of the lens
    Ring,
}

impl Bokeh {
    fn sides(self) -> Option<usize> {
        match self {
            Bokeh::Triangle => Some(3),
            Bokeh::Square => Some(4),
            Bokeh::Pentagon => Some(5),
            Bokeh::Hexagon => Some(6),
            _ => None,
        }
    }
}

/// Radial distribution of lens samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BokehBias {
    #[default]
    Uniform,
    Center,
    Edge,
}

impl BokehBias {
    fn distance(self, r: f64) -> f64 {
        match self {
            BokehBias::Uniform => r.sqrt(),
            BokehBias::Center => (r.sqrt() * r).sqrt(),
            BokehBias::Edge => (1.0 - r * r).sqrt(),
        }
    }
}

/// Orthonormal-ish frame shared by both cameras.
///
/// `up` points down the image so pixel rows increase downward.
fn view_frame(position: Vector, look_at: Vector, up: Vector) -> (Vector, Vector, Vector) {
    let up = up - position;
    let look = look_at - position;
    let right = up.cross(look);
    let up = right.cross(look).normalize();
    let right = -right.normalize();
    (look.normalize(), up, right)
}

/// A pinhole camera with optional thin-lens depth of field.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    width: usize,
    height: usize,
    eye: Vector,
    /// Unit right and up vectors for lens offsets
    lens_right: Vector,
    lens_up: Vector,
    /// Per-pixel steps and the direction to pixel `(0, 0)`
    right: Vector,
    up: Vector,
    look: Vector,
    focal_distance: f64,
    aspect_ratio: f64,

    aperture: f64,
    dof_distance: f64,
    bokeh: Bokeh,
    bias: BokehBias,
    /// Polygon corners as `(cos, sin)` pairs, first corner repeated
    lens: Vec<f64>,
}

impl PerspectiveCamera {
    /// `aspect` is the pixel aspect ratio; `focal_distance` sets the field
    /// of view (1 gives 90 degrees across the image width).
    pub fn new(
        position: Vector,
        look_at: Vector,
        up: Vector,
        width: usize,
        height: usize,
        aspect: f64,
        focal_distance: f64,
    ) -> Self {
        let (look, unit_up, unit_right) = view_frame(position, look_at, up);
        let width = width.max(1);
        let height = height.max(1);
        let aspect_ratio = aspect * height as f64 / width as f64;
        let up = unit_up * aspect_ratio;
        let look = look * focal_distance - (up + unit_right) * 0.5;

        Self {
            width,
            height,
            eye: position,
            lens_right: unit_right,
            lens_up: unit_up,
            right: unit_right / width as f64,
            up: up / height as f64,
            look,
            focal_distance,
            aspect_ratio,
            aperture: 0.0,
            dof_distance: 0.0,
            bokeh: Bokeh::default(),
            bias: BokehBias::default(),
            lens: Vec::new(),
        }
    }

    /// Enable depth of field. Points at `dof_distance` along each ray stay
    /// in focus.
    pub fn with_aperture(mut self, aperture: f64, dof_distance: f64) -> Self {
        self.aperture = aperture;
        self.dof_distance = dof_distance;
        self
    }

    /// Set the lens shape. `rotation` turns polygonal shapes, in degrees.
    pub fn with_bokeh(mut self, bokeh: Bokeh, bias: BokehBias, rotation: f64) -> Self {
        self.bokeh = bokeh;
        self.bias = bias;
        self.lens.clear();
        if let Some(sides) = bokeh.sides() {
            let step = 2.0 * PI / sides as f64;
            let mut w = rotation.to_radians();
            for _ in 0..sides + 2 {
                self.lens.push(w.cos());
                self.lens.push(w.sin());
                w += step;
            }
        }
        self
    }

    pub fn position(&self) -> Vector {
        self.eye
    }

    pub fn focal_distance(&self) -> f64 {
        self.focal_distance
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Point on a polygonal lens: pick a wedge, then a point in it.
    fn sample_polygon(&self, sides: usize, r1: f64, r2: f64) -> (f64, f64) {
        let n = sides as f64;
        let idx = ((r1 * n) as usize).min(sides - 1);
        let r1 = self.bias.distance((r1 - idx as f64 / n) * n);
        let b1 = r1 * r2;
        let b0 = r1 - b1;
        let i = idx * 2;
        let u = self.lens[i] * b0 + self.lens[i + 2] * b1;
        let v = self.lens[i + 1] * b0 + self.lens[i + 3] * b1;
        (u, v)
    }

    /// Map a unit-square sample onto the lens.
    fn lens_uv(&self, r1: f64, r2: f64) -> (f64, f64) {
        if let Some(sides) = self.bokeh.sides() {
            return self.sample_polygon(sides, r1, r2);
        }
        match self.bokeh {
            Bokeh::Disk2 | Bokeh::Ring => {
                let w = 2.0 * PI * r2;
                let r = if self.bokeh == Bokeh::Ring { 1.0 } else { self.bias.distance(r1) };
                (r * w.cos(), r * w.sin())
            }
            _ => {
                let d = shirley_disk(r1, r2);
                (d.x, d.y)
            }
        }
    }
}

impl Camera for PerspectiveCamera {
    fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn shoot_ray(&self, x: f64, y: f64, u: f64, v: f64) -> (Ray, f64) {
        let dir = (self.right * x + self.up * y + self.look).normalize();
        let mut ray = Ray::new(self.eye, dir);
        if self.sample_lens() {
            let (lu, lv) = self.lens_uv(u, v);
            let li = (self.lens_right * lu + self.lens_up * lv) * self.aperture;
            ray.from += li;
            ray.dir = (dir * self.dof_distance - li).normalize();
        }
        (ray, 1.0)
    }

    fn sample_lens(&self) -> bool {
        self.aperture != 0.0 && self.dof_distance > 0.0
    }
}

/// A parallel projection camera.
#[derive(Debug, Clone)]
pub struct OrthoCamera {
    width: usize,
    height: usize,
    /// Corner of the view rectangle at pixel `(0, 0)`
    position: Vector,
    look: Vector,
    up: Vector,
    right: Vector,
}

impl OrthoCamera {
    /// `scale` is the world-space width of the view.
    pub fn new(position: Vector, look_at: Vector, up: Vector, width: usize, height: usize, aspect: f64, scale: f64) -> Self {
        let (look, unit_up, right) = view_frame(position, look_at, up);
        let width = width.max(1);
        let height = height.max(1);
        let up = unit_up * (aspect * height as f64 / width as f64);
        Self {
            width,
            height,
            position: position - (up + right) * (0.5 * scale),
            look,
            up: up * (scale / height as f64),
            right: right * (scale / width as f64),
        }
    }
}

impl Camera for OrthoCamera {
    fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn shoot_ray(&self, x: f64, y: f64, _u: f64, _v: f64) -> (Ray, f64) {
        (Ray::new(self.position + self.right * x + self.up * y, self.look), 1.0)
    }
}
