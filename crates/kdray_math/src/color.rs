//! Linear-space colours.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Sub};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Linear RGB colour.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// A grey with every channel set to `v`.
    #[inline]
    pub const fn gray(v: f64) -> Self {
        Self::new(v, v, v)
    }

    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }

    /// Average of the three channels.
    pub fn energy(&self) -> f64 {
        (self.r + self.g + self.b) / 3.0
    }

    /// Per-channel reciprocal; zero channels stay zero.
    pub fn invert(&self) -> Rgb {
        let inv = |c: f64| if c != 0.0 { 1.0 / c } else { 0.0 };
        Rgb::new(inv(self.r), inv(self.g), inv(self.b))
    }

    pub fn abs(&self) -> Rgb {
        Rgb::new(self.r.abs(), self.g.abs(), self.b.abs())
    }

    /// Clamp negative channels to zero.
    pub fn clamp_positive(&self) -> Rgb {
        Rgb::new(self.r.max(0.0), self.g.max(0.0), self.b.max(0.0))
    }

    pub fn max_channel(&self) -> f64 {
        self.r.max(self.g).max(self.b)
    }

    /// `a·t + b·(1 − t)`, returning `a` past 1 and `b` below 0.
    pub fn mix(a: Rgb, b: Rgb, t: f64) -> Rgb {
        if t < 0.0 {
            b
        } else if t > 1.0 {
            a
        } else {
            a * t + b * (1.0 - t)
        }
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

impl Add for Rgb {
    type Output = Rgb;
    #[inline]
    fn add(self, o: Rgb) -> Rgb {
        Rgb::new(self.r + o.r, self.g + o.g, self.b + o.b)
    }
}

impl AddAssign for Rgb {
    #[inline]
    fn add_assign(&mut self, o: Rgb) {
        *self = *self + o;
    }
}

impl Sub for Rgb {
    type Output = Rgb;
    #[inline]
    fn sub(self, o: Rgb) -> Rgb {
        Rgb::new(self.r - o.r, self.g - o.g, self.b - o.b)
    }
}

impl Mul for Rgb {
    type Output = Rgb;
    #[inline]
    fn mul(self, o: Rgb) -> Rgb {
        Rgb::new(self.r * o.r, self.g * o.g, self.b * o.b)
    }
}

impl MulAssign for Rgb {
    #[inline]
    fn mul_assign(&mut self, o: Rgb) {
        *self = *self * o;
    }
}

impl Mul<f64> for Rgb {
    type Output = Rgb;
    #[inline]
    fn mul(self, f: f64) -> Rgb {
        Rgb::new(self.r * f, self.g * f, self.b * f)
    }
}

impl MulAssign<f64> for Rgb {
    #[inline]
    fn mul_assign(&mut self, f: f64) {
        *self = *self * f;
    }
}

impl Div<f64> for Rgb {
    type Output = Rgb;
    #[inline]
    fn div(self, f: f64) -> Rgb {
        Rgb::new(self.r / f, self.g / f, self.b / f)
    }
}

/// Linear RGB colour with alpha. Not premultiplied unless stated.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub fn from_rgb(c: Rgb, a: f64) -> Self {
        Self::new(c.r, c.g, c.b, a)
    }

    /// Drop the alpha channel.
    #[inline]
    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// Multiply the colour channels by alpha.
    pub fn alpha_premultiply(&self) -> Rgba {
        Rgba::new(self.r * self.a, self.g * self.a, self.b * self.a, self.a)
    }

    pub fn mix(a: Rgba, b: Rgba, t: f64) -> Rgba {
        if t < 0.0 {
            b
        } else if t > 1.0 {
            a
        } else {
            a * t + b * (1.0 - t)
        }
    }
}

impl From<Rgb> for Rgba {
    fn from(c: Rgb) -> Self {
        Rgba::from_rgb(c, 1.0)
    }
}

impl Add for Rgba {
    type Output = Rgba;
    #[inline]
    fn add(self, o: Rgba) -> Rgba {
        Rgba::new(self.r + o.r, self.g + o.g, self.b + o.b, self.a + o.a)
    }
}

impl Mul for Rgba {
    type Output = Rgba;
    #[inline]
    fn mul(self, o: Rgba) -> Rgba {
        Rgba::new(self.r * o.r, self.g * o.g, self.b * o.b, self.a * o.a)
    }
}

impl Mul<f64> for Rgba {
    type Output = Rgba;
    #[inline]
    fn mul(self, f: f64) -> Rgba {
        Rgba::new(self.r * f, self.g * f, self.b * f, self.a * f)
    }
}

impl Div<f64> for Rgba {
    type Output = Rgba;
    #[inline]
    fn div(self, f: f64) -> Rgba {
        Rgba::new(self.r / f, self.g / f, self.b / f, self.a / f)
    }
}
