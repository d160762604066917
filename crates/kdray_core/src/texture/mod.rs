//! Textures and the loaders that feed them.
//!
//! Texture space runs from -1 to 1 on each axis. Image textures map that
//! square onto the whole image, with `+y` at the top row.

mod loader;
mod mapper;

pub use loader::{FileImageLoader, ImageLoader};
pub use mapper::{Coordinates, Projection, TextureMapper};

use std::sync::Arc;

use kdray_math::{Rgba, Vector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::framebuffer::Image;

/// Errors that can occur while loading a texture image.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Image name must not be empty")]
    EmptyName,

    #[error("Failed to load texture: {0}")]
    LoadError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageError(#[from] image::ImageError),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Something that can be sampled in texture space.
pub trait Texture: Send + Sync {
    fn color_at(&self, p: Vector) -> Rgba;

    fn scalar_at(&self, p: Vector) -> f64 {
        self.color_at(p).rgb().energy()
    }

    /// Whether the texture varies along z.
    fn is_3d(&self) -> bool;

    fn is_normal_map(&self) -> bool {
        false
    }

    /// Sample counts along each axis for discrete textures.
    fn resolution(&self) -> Option<(usize, usize, usize)> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    None,
    Bilinear,
    Bicubic,
}

/// What happens to lookups outside the unit square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipMode {
    /// Clamp to the nearest edge pixel
    #[default]
    Extend,
    /// Transparent outside the image
    Clip,
    /// Like `Clip`, but also bounded in z
    CubeClip,
    /// Tile the image `repeat_x` by `repeat_y` times
    Repeat,
}

/// A 2D texture backed by an [`Image`].
#[derive(Debug, Clone)]
pub struct ImageTexture {
    pub image: Arc<Image>,
    pub interpolation: Interpolation,
    pub use_alpha: bool,
    pub clip: ClipMode,
    pub repeat_x: u32,
    pub repeat_y: u32,
}

impl ImageTexture {
    pub fn new(image: Arc<Image>) -> Self {
        Self {
            image,
            interpolation: Interpolation::None,
            use_alpha: true,
            clip: ClipMode::Extend,
            repeat_x: 1,
            repeat_y: 1,
        }
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn with_clip(mut self, clip: ClipMode) -> Self {
        self.clip = clip;
        self
    }

    pub fn with_repeat(mut self, x: u32, y: u32) -> Self {
        self.clip = ClipMode::Repeat;
        self.repeat_x = x;
        self.repeat_y = y;
        self
    }

    /// Map a texture space point into `[0, 1]` image space. `None` means
    /// the point was clipped away.
    fn mapping(&self, p: Vector) -> Option<Vector> {
        let mut t = p * 0.5 + Vector::splat(0.5);
        match self.clip {
            ClipMode::Repeat => {
                if self.repeat_x > 1 {
                    t.x = map_repeat(t.x, self.repeat_x);
                }
                if self.repeat_y > 1 {
                    t.y = map_repeat(t.y, self.repeat_y);
                }
            }
            ClipMode::CubeClip => {
                if !(0.0..=1.0).contains(&t.x) || !(0.0..=1.0).contains(&t.y) || !(-1.0..=1.0).contains(&t.z) {
                    return None;
                }
            }
            ClipMode::Clip => {
                if !(0.0..=1.0).contains(&t.x) || !(0.0..=1.0).contains(&t.y) {
                    return None;
                }
            }
            ClipMode::Extend => {
                t.x = t.x.clamp(0.0, 1.0);
                t.y = t.y.clamp(0.0, 1.0);
            }
        }
        Some(t)
    }

    fn interpolate(&self, p: Vector) -> Rgba {
        let img = &*self.image;
        let mut xf = img.width() as f64 * wrap_unit(p.x);
        let mut yf = img.height() as f64 * wrap_unit(p.y);
        if self.interpolation != Interpolation::None {
            xf -= 0.5;
            yf -= 0.5;
        }
        let x = xf.floor() as isize;
        let y = yf.floor() as isize;
        let c1 = img.pixel_clamped(x, y);
        if self.interpolation == Interpolation::None {
            return c1;
        }

        let c2 = img.pixel_clamped(x + 1, y);
        let c3 = img.pixel_clamped(x, y + 1);
        let c4 = img.pixel_clamped(x + 1, y + 1);
        let dx = xf - xf.floor();
        let dy = yf - yf.floor();
        if self.interpolation == Interpolation::Bilinear {
            return c1 * ((1.0 - dx) * (1.0 - dy)) + c3 * ((1.0 - dx) * dy) + c2 * (dx * (1.0 - dy)) + c4 * (dx * dy);
        }

        let row = |yy: isize| {
            cubic_interpolate(
                img.pixel_clamped(x - 1, yy),
                img.pixel_clamped(x, yy),
                img.pixel_clamped(x + 1, yy),
                img.pixel_clamped(x + 2, yy),
                dx,
            )
        };
        cubic_interpolate(row(y - 1), row(y), row(y + 1), row(y + 2), dy)
    }
}

impl Texture for ImageTexture {
    fn color_at(&self, p: Vector) -> Rgba {
        let p = Vector::new(p.x, -p.y, p.z);
        let Some(t) = self.mapping(p) else {
            return Rgba::TRANSPARENT;
        };
        let mut c = self.interpolate(t);
        if !self.use_alpha {
            c.a = 1.0;
        }
        c
    }

    fn is_3d(&self) -> bool {
        false
    }

    fn resolution(&self) -> Option<(usize, usize, usize)> {
        Some((self.image.width(), self.image.height(), 0))
    }
}

fn map_repeat(x: f64, repeat: u32) -> f64 {
    let x = x * repeat as f64;
    if x > 1.0 {
        x - x.trunc()
    } else if x < 0.0 {
        x + 1.0 - x.trunc()
    } else {
        x
    }
}

/// Wrap into `[0, 1]`, leaving values already inside untouched so the
/// right and bottom edges stay on the last pixel.
fn wrap_unit(v: f64) -> f64 {
    if (0.0..=1.0).contains(&v) {
        v
    } else {
        v - v.floor()
    }
}

/// Four-tap cubic through `c2` (at 0) and `c3` (at 1).
fn cubic_interpolate(c1: Rgba, c2: Rgba, c3: Rgba, c4: Rgba, x: f64) -> Rgba {
    let x2 = x * x;
    let x3 = x2 * x;
    c1 * (-x3 / 3.0 + 0.8 * x2 - 7.0 / 15.0 * x)
        + c2 * (x3 - 1.8 * x2 - 0.2 * x + 1.0)
        + c3 * (-x3 + 1.2 * x2 + 0.8 * x)
        + c4 * (x3 / 3.0 - 0.2 * x2 - 2.0 / 15.0 * x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Rgba, b: Rgba) -> bool {
        (a.r - b.r).abs() < 1e-9 && (a.g - b.g).abs() < 1e-9 && (a.b - b.b).abs() < 1e-9 && (a.a - b.a).abs() < 1e-9
    }

    const RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);
    const GREEN: Rgba = Rgba::new(0.0, 1.0, 0.0, 1.0);
    const BLUE: Rgba = Rgba::new(0.0, 0.0, 1.0, 0.5);
    const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);

    /// Red top left, green top right, blue bottom left, white bottom right.
    fn checker() -> Arc<Image> {
        Arc::new(Image::from_pixels(2, 2, vec![RED, GREEN, BLUE, WHITE]).unwrap())
    }

    #[test]
    fn test_nearest_quadrants() {
        let tex = ImageTexture::new(checker());
        assert!(approx(tex.color_at(Vector::new(-0.5, 0.5, 0.0)), RED));
        assert!(approx(tex.color_at(Vector::new(0.5, 0.5, 0.0)), GREEN));
        assert!(approx(tex.color_at(Vector::new(-0.5, -0.5, 0.0)), BLUE));
        assert!(approx(tex.color_at(Vector::new(0.5, -0.5, 0.0)), WHITE));
    }

    #[test]
    fn test_extend_and_clip() {
        let tex = ImageTexture::new(checker());
        assert!(approx(tex.color_at(Vector::new(3.0, 3.0, 0.0)), GREEN));
        assert!(approx(tex.color_at(Vector::new(1.0, -1.0, 0.0)), WHITE));

        let tex = tex.with_clip(ClipMode::Clip);
        assert_eq!(tex.color_at(Vector::new(3.0, 0.0, 0.0)), Rgba::TRANSPARENT);
        assert!(approx(tex.color_at(Vector::new(-0.5, 0.5, 5.0)), RED));

        let tex = tex.with_clip(ClipMode::CubeClip);
        assert_eq!(tex.color_at(Vector::new(-0.5, 0.5, 5.0)), Rgba::TRANSPARENT);
    }

    #[test]
    fn test_repeat() {
        let tex = ImageTexture::new(checker()).with_repeat(2, 2);
        // With two tiles the left half of the square covers a whole image.
        assert!(approx(tex.color_at(Vector::new(-0.75, 0.75, 0.0)), RED));
        assert!(approx(tex.color_at(Vector::new(-0.25, 0.75, 0.0)), GREEN));
        assert!(approx(tex.color_at(Vector::new(0.25, 0.75, 0.0)), RED));
        assert_eq!(map_repeat(0.75, 2), 0.5);
        assert_eq!(map_repeat(-0.25, 1), 0.75);
    }

    #[test]
    fn test_bilinear_center_is_average() {
        let tex = ImageTexture::new(checker()).with_interpolation(Interpolation::Bilinear);
        let c = tex.color_at(Vector::ZERO);
        let avg = (RED + GREEN + BLUE + WHITE) * 0.25;
        assert!(approx(c, avg));
    }

    #[test]
    fn test_bicubic_preserves_flat_image() {
        let gray = Rgba::new(0.4, 0.4, 0.4, 1.0);
        let img = Arc::new(Image::from_pixels(3, 3, vec![gray; 9]).unwrap());
        let tex = ImageTexture::new(img).with_interpolation(Interpolation::Bicubic);
        for p in [Vector::new(0.1, 0.3, 0.0), Vector::new(-0.7, 0.9, 0.0)] {
            assert!(approx(tex.color_at(p), gray));
        }
    }

    #[test]
    fn test_cubic_endpoints() {
        assert!(approx(cubic_interpolate(RED, GREEN, BLUE, WHITE, 0.0), GREEN));
        assert!(approx(cubic_interpolate(RED, GREEN, BLUE, WHITE, 1.0), BLUE));
    }

    #[test]
    fn test_alpha_and_scalar() {
        let tex = ImageTexture::new(checker());
        let p = Vector::new(-0.5, -0.5, 0.0);
        assert_eq!(tex.color_at(p).a, 0.5);
        let mut opaque = tex.clone();
        opaque.use_alpha = false;
        assert_eq!(opaque.color_at(p).a, 1.0);
        assert!((tex.scalar_at(p) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(tex.resolution(), Some((2, 2, 0)));
        assert!(!tex.is_3d());
    }
}
