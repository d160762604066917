//! Floating point RGBA framebuffer.
//!
//! Used both as the render target and as the pixel store behind image
//! textures.

use kdray_math::Rgba;

/// A single rendered pixel on its way to the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub x: usize,
    pub y: usize,
    pub color: Rgba,
}

/// Linear RGBA image, stored row-major with `(0, 0)` at the top left.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl Image {
    /// A transparent black image.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width * height],
        }
    }

    /// Wrap existing pixels. Returns `None` if the count does not match.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Rgba>) -> Option<Self> {
        (pixels.len() == width * height).then_some(Self { width, height, pixels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    /// Pixel at `(x, y)` with coordinates clamped to the image.
    pub(crate) fn pixel_clamped(&self, x: isize, y: isize) -> Rgba {
        if self.pixels.is_empty() {
            return Rgba::TRANSPARENT;
        }
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.pixels[y * self.width + x]
    }

    /// Write a pixel. Writes outside the image are ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Write every fragment from `fragments` into the image, returning the
    /// number written. Finishes when the source is exhausted, so a channel
    /// receiver blocks until all senders are dropped.
    pub fn acquire(&mut self, fragments: impl IntoIterator<Item = Fragment>) -> usize {
        let mut count = 0;
        for f in fragments {
            if f.x < self.width && f.y < self.height {
                self.pixels[f.y * self.width + f.x] = f.color;
                count += 1;
            } else {
                log::warn!("Dropping fragment outside the image at ({}, {})", f.x, f.y);
            }
        }
        count
    }

    /// Convert to 8-bit RGBA with the given display gamma (1.0 for none).
    pub fn to_rgba8(&self, gamma: f64) -> image::RgbaImage {
        let inv = if gamma > 0.0 { 1.0 / gamma } else { 1.0 };
        let encode = |v: f64| -> u8 {
            let v = if v > 0.0 { v.powf(inv) } else { 0.0 };
            (v.min(1.0) * 255.0).round() as u8
        };
        let mut raw = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            raw.extend_from_slice(&[encode(p.r), encode(p.g), encode(p.b), (p.a.clamp(0.0, 1.0) * 255.0).round() as u8]);
        }
        image::RgbaImage::from_raw(self.width as u32, self.height as u32, raw)
            .unwrap_or_else(|| image::RgbaImage::new(self.width as u32, self.height as u32))
    }

    /// Convert a decoded image, mapping sRGB colour channels to linear.
    pub fn from_dynamic(img: &image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = rgba
            .pixels()
            .map(|p| {
                Rgba::new(
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                    p[3] as f64 / 255.0,
                )
            })
            .collect();
        Self {
            width: width as usize,
            height: height as usize,
            pixels,
        }
    }
}

/// Convert an sRGB byte to a linear value.
fn srgb_to_linear(value: u8) -> f64 {
    let v = value as f64 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
