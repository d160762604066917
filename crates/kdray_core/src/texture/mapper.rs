//! Shader node that looks a texture up at a surface point.

use std::fmt;
use std::sync::Arc;

use kdray_math::{largest_axis, Axis, DMat4, Vector};
use serde::{Deserialize, Serialize};

use super::Texture;
use crate::shader::{ShaderNode, ShaderParams, ShaderResult};

const DEFAULT_DELTA: f64 = 2.0e-4;

/// Which space the lookup point is taken from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coordinates {
    Uv,
    Global,
    /// Original (untransformed) object coordinates
    Orco,
    /// Global coordinates through a matrix
    Transform(DMat4),
    /// Screen position of the current pixel
    Window,
}

/// How 3D points are wrapped onto the texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Flat,
    Tube,
    Sphere,
    Cube,
}

impl Projection {
    pub fn project(self, p: Vector, n: Vector) -> Vector {
        match self {
            Projection::Flat => p,
            Projection::Tube => {
                let mut res = Vector::new(0.0, p.z, 0.0);
                let d = p.x * p.x + p.y * p.y;
                if d > 0.0 {
                    res.z = 1.0 / d.sqrt();
                    res.x = -p.x.atan2(p.y) / std::f64::consts::PI;
                }
                res
            }
            Projection::Sphere => {
                let mut res = Vector::ZERO;
                let d = p.length_squared();
                if d > 0.0 {
                    res.z = d.sqrt();
                    if p.x != 0.0 && p.y != 0.0 {
                        res.x = -p.x.atan2(p.y) / std::f64::consts::PI;
                    }
                    res.y = 1.0 - 2.0 * (p.z / res.z).acos() / std::f64::consts::PI;
                }
                res
            }
            Projection::Cube => {
                let axis = largest_axis(n.x.abs(), n.y.abs(), n.z.abs());
                Vector::new(axis.next().of(p), axis.prev().of(p), axis.of(p))
            }
        }
    }
}

/// Applies a texture to geometry.
///
/// Evaluates to the texture colour, or to `[scalar, 0, 0, 0]` when
/// `scalar` is set. The derivative is the bump-map gradient in the
/// shading frame.
pub struct TextureMapper {
    texture: Arc<dyn Texture>,
    pub coordinates: Coordinates,
    pub projection: Projection,
    /// Source axis for each output axis; `None` yields zero.
    pub axes: [Option<Axis>; 3],
    pub scale: Vector,
    pub offset: Vector,
    pub scalar: bool,
    pub bump_strength: f64,
    delta: f64,
    delta_u: f64,
    delta_v: f64,
}

impl TextureMapper {
    pub fn new(texture: Arc<dyn Texture>, coordinates: Coordinates, scalar: bool) -> Self {
        let (delta, delta_u, delta_v) = match texture.resolution() {
            Some((u, v, w)) if u > 0 && v > 0 => {
                let du = 1.0 / u as f64;
                let dv = 1.0 / v as f64;
                let dw = if texture.is_3d() && w > 0 { 1.0 / w as f64 } else { 0.0 };
                ((du * du + dv * dv + dw * dw).sqrt(), du, dv)
            }
            _ => (DEFAULT_DELTA, DEFAULT_DELTA, DEFAULT_DELTA),
        };
        Self {
            texture,
            coordinates,
            projection: Projection::Flat,
            axes: [Some(Axis::X), Some(Axis::Y), Some(Axis::Z)],
            scale: Vector::ONE,
            offset: Vector::ZERO,
            scalar,
            bump_strength: 0.02,
            delta,
            delta_u,
            delta_v,
        }
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn texture(&self) -> &dyn Texture {
        &*self.texture
    }

    fn texture_coordinates(&self, params: &ShaderParams<'_, '_>) -> (Vector, Vector) {
        let sp = params.surface;
        match self.coordinates {
            Coordinates::Uv => (Vector::new(sp.u, sp.v, 0.0), sp.geometric_normal),
            Coordinates::Global => (sp.position, sp.geometric_normal),
            Coordinates::Orco => (sp.orco_position, sp.orco_normal),
            Coordinates::Transform(m) => (m.transform_point3(sp.position), sp.geometric_normal),
            Coordinates::Window => (params.state.screen_pos, sp.geometric_normal),
        }
    }

    fn mapping(&self, p: Vector, n: Vector) -> Vector {
        let p = match self.coordinates {
            Coordinates::Uv => Vector::new(2.0 * p.x - 1.0, 2.0 * p.y - 1.0, p.z),
            _ => p,
        };
        let pick = |a: Option<Axis>| a.map_or(0.0, |a| a.of(p));
        let p = Vector::new(pick(self.axes[0]), pick(self.axes[1]), pick(self.axes[2]));
        self.projection.project(p, n) * self.scale + self.offset
    }

    fn scalar_at(&self, p: Vector, n: Vector) -> f64 {
        self.texture.scalar_at(self.mapping(p, n))
    }
}

impl fmt::Debug for TextureMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextureMapper")
            .field("coordinates", &self.coordinates)
            .field("projection", &self.projection)
            .field("scalar", &self.scalar)
            .finish_non_exhaustive()
    }
}

impl ShaderNode for TextureMapper {
    fn eval(&self, _inputs: &[ShaderResult], params: &ShaderParams<'_, '_>) -> ShaderResult {
        let (p, n) = self.texture_coordinates(params);
        let p = self.mapping(p, n);
        if self.scalar {
            ShaderResult::from_scalar(self.texture.scalar_at(p))
        } else {
            ShaderResult::from_color(self.texture.color_at(p))
        }
    }

    fn eval_derivative(&self, _inputs: &[ShaderResult], params: &ShaderParams<'_, '_>) -> ShaderResult {
        let sp = params.surface;
        let scale = self.scale.length();
        let bstr = self.bump_strength / scale;

        if let Coordinates::Uv = self.coordinates {
            let n = sp.geometric_normal;
            let (du, dv) = (self.delta_u, self.delta_v);
            let dfdu = (self.scalar_at(Vector::new(sp.u + du, sp.v, 0.0), n)
                - self.scalar_at(Vector::new(sp.u - du, sp.v, 0.0), n))
                / du;
            let dfdv = (self.scalar_at(Vector::new(sp.u, sp.v + dv, 0.0), n)
                - self.scalar_at(Vector::new(sp.u, sp.v - dv, 0.0), n))
                / dv;

            // Plane through (1, 0, dfdu) and (0, 1, dfdv) in shading space
            let vec_u = Vector::new(sp.shading_u.x, sp.shading_u.y, dfdu);
            let vec_v = Vector::new(sp.shading_v.x, sp.shading_v.y, dfdv);
            let norm = vec_u.cross(vec_v);
            if norm.z.abs() > 1e-30 {
                let nf = bstr / norm.z;
                return ShaderResult([norm.x * nf, norm.y * nf, 0.0, 0.0]);
            }
            return ShaderResult::default();
        }

        let (p, n) = self.texture_coordinates(params);
        let delta = self.delta / scale;
        let du = sp.normal_u * delta;
        let dv = sp.normal_v * delta;
        let dfdu = (self.scalar_at(p + du, n) - self.scalar_at(p - du, n)) / delta;
        let dfdv = (self.scalar_at(p + dv, n) - self.scalar_at(p - dv, n)) / delta;
        ShaderResult([-bstr * dfdu, -bstr * dfdv, 0.0, 0.0])
    }
}
