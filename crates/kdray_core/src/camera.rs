use kdray_math::Ray;

/// Generates primary rays.
pub trait Camera: Send + Sync {
    /// `(width, height)` in pixels.
    fn resolution(&self) -> (usize, usize);

    /// Ray through continuous pixel coordinates `(x, y)` with lens sample
    /// `(u, v)`, plus its weight.
    fn shoot_ray(&self, x: f64, y: f64, u: f64, v: f64) -> (Ray, f64);

    /// Whether `shoot_ray` uses the lens sample.
    fn sample_lens(&self) -> bool {
        false
    }
}
