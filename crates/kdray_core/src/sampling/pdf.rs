/// A piecewise-constant 1D distribution for importance sampling.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdf1D {
    f: Vec<f64>,
    cdf: Vec<f64>,
    integral: f64,
}

impl Pdf1D {
    /// Build the normalised CDF of `f`. An all-zero function yields a
    /// uniform CDF with zero density.
    pub fn new(f: Vec<f64>) -> Self {
        let n = f.len().max(1) as f64;
        let delta = 1.0 / n;
        let mut cdf = Vec::with_capacity(f.len() + 1);
        cdf.push(0.0);
        let mut integral = 0.0;
        for &v in &f {
            integral += v * delta;
            cdf.push(integral);
        }
        if integral > 0.0 {
            for c in &mut cdf {
                *c /= integral;
            }
        } else {
            for (i, c) in cdf.iter_mut().enumerate() {
                *c = i as f64 * delta;
            }
        }
        Self { f, cdf, integral }
    }

    pub fn len(&self) -> usize {
        self.f.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f.is_empty()
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn cdf(&self) -> &[f64] {
        &self.cdf
    }

    pub fn func(&self) -> &[f64] {
        &self.f
    }

    /// Bin containing `u`, skipping zero-width bins and clamped to the table.
    fn locate(&self, u: f64) -> usize {
        let after = self.cdf.partition_point(|&c| c <= u);
        after.saturating_sub(1).min(self.f.len().saturating_sub(1))
    }

    fn density(&self, index: usize) -> f64 {
        if self.integral > 0.0 {
            self.f[index] / self.integral
        } else {
            0.0
        }
    }

    /// Continuous sample: `(position in [0, len], pdf)`.
    pub fn sample(&self, u: f64) -> (f64, f64) {
        if self.f.is_empty() {
            return (0.0, 0.0);
        }
        let i = self.locate(u);
        let width = self.cdf[i + 1] - self.cdf[i];
        let delta = if width > 0.0 { ((u - self.cdf[i]) / width).clamp(0.0, 1.0) } else { 0.0 };
        (i as f64 + delta, self.density(i))
    }

    /// Discrete sample: `(bin, pdf)`.
    pub fn discrete_sample(&self, u: f64) -> (usize, f64) {
        if self.f.is_empty() {
            return (0, 0.0);
        }
        let i = self.locate(u);
        (i, self.density(i))
    }
}
