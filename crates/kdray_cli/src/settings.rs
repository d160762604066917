//! Render settings, read from a JSON file and overridden from the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use kdray_math::Vector;
use kdray_renderer::{Bokeh, BokehBias, DirectLightConfig, RenderConfig, DEFAULT_GAMMA};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IntegratorKind {
    #[default]
    Direct,
    Trivial,
}

/// Acceleration structure used for scene intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntersecterKind {
    #[default]
    Kd,
    /// Test every primitive; only sensible for tiny scenes
    Simple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraKind {
    #[default]
    Perspective,
    Ortho,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub kind: CameraKind,
    pub position: Vector,
    pub look_at: Vector,
    /// A point above `position`, not a direction
    pub up: Vector,
    pub focal_distance: f64,
    pub aperture: f64,
    pub dof_distance: f64,
    pub bokeh: Bokeh,
    pub bias: BokehBias,
    /// Bokeh rotation in degrees
    pub rotation: f64,
    /// Width of the view for orthographic cameras
    pub scale: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            kind: CameraKind::Perspective,
            position: Vector::new(0.0, 1.5, 7.0),
            look_at: Vector::new(0.0, 0.6, 0.0),
            up: Vector::new(0.0, 2.5, 7.0),
            focal_distance: 1.4,
            aperture: 0.0,
            dof_distance: 0.0,
            bokeh: Bokeh::default(),
            bias: BokehBias::default(),
            rotation: 0.0,
            scale: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub width: usize,
    pub height: usize,
    pub gamma: f64,
    pub integrator: IntegratorKind,
    pub intersecter: IntersecterKind,
    pub render: RenderConfig,
    pub direct: DirectLightConfig,
    pub camera: CameraSettings,
    /// Image mapped onto the ground plane, relative to the settings file
    pub ground_texture: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            gamma: DEFAULT_GAMMA,
            integrator: IntegratorKind::default(),
            intersecter: IntersecterKind::default(),
            render: RenderConfig::default(),
            direct: DirectLightConfig::default(),
            camera: CameraSettings::default(),
            ground_texture: None,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid settings")
    }

    /// Load settings from `path`. A relative `ground_texture` is resolved
    /// against the directory holding the file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let mut settings = Self::from_json(&json).with_context(|| format!("Failed to parse {}", path.display()))?;
        if let (Some(tex), Some(dir)) = (&settings.ground_texture, path.parent()) {
            if tex.is_relative() {
                settings.ground_texture = Some(dir.join(tex));
            }
        }
        Ok(settings)
    }
}
