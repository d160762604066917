/// An incremental Halton sequence generator for one base.
#[derive(Debug, Clone, Copy)]
pub struct Halton {
    base: u32,
    inv_base: f64,
    value: f64,
}

impl Halton {
    pub fn new(base: u32) -> Self {
        Self {
            base,
            inv_base: 1.0 / f64::from(base),
            value: 0.0,
        }
    }

    /// Restart the sequence without changing the base.
    pub fn reset(&mut self) {
        self.value = 0.0;
    }

    /// Position the generator so the next value follows element `i`.
    pub fn set_start(&mut self, mut i: u32) {
        self.value = 0.0;
        let mut factor = self.inv_base;
        while i > 0 {
            self.value += f64::from(i % self.base) * factor;
            i /= self.base;
            factor *= self.inv_base;
        }
    }

    /// Advance by one using the right-digit carry.
    pub fn next_value(&mut self) -> f64 {
        let r = 1.0 - self.value - 1e-10;
        if self.inv_base < r {
            self.value += self.inv_base;
        } else {
            let mut hh = self.inv_base;
            let mut h = self.inv_base * self.inv_base;
            while h >= r {
                hh = h;
                h *= self.inv_base;
            }
            self.value += hh + h - 1.0;
        }
        self.value
    }
}

impl Iterator for Halton {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_value())
    }
}

/// Element `bits` of the van der Corput sequence, scrambled by XOR with `r`.
pub fn van_der_corput(bits: u32, r: u32) -> f64 {
    const MULT_RATIO: f64 = 1.0 / 4_294_967_296.0;
    f64::from(bits.reverse_bits() ^ r) * MULT_RATIO
}

/// 32-bit FNV-1a hash of `v`. Seeds per-pixel sample offsets so
/// neighbouring pixels do not share a sequence prefix.
pub fn fnv32a(v: u32) -> u32 {
    v.to_le_bytes()
        .iter()
        .fold(0x811c_9dc5, |h: u32, &b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halton_base_two() {
        let mut h = Halton::new(2);
        let seq: Vec<f64> = (0..5).map(|_| h.next_value()).collect();
        let want = [0.5, 0.25, 0.75, 0.125, 0.625];
        for (got, want) in seq.iter().zip(want) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
    }

    #[test]
    fn test_halton_set_start() {
        let mut seq = Halton::new(3);
        let first: Vec<f64> = seq.by_ref().take(6).collect();
        let mut h = Halton::new(3);
        h.set_start(3);
        assert!((h.next_value() - first[3]).abs() < 1e-9);
        assert!((h.next_value() - first[4]).abs() < 1e-9);
        h.reset();
        assert!((h.next_value() - first[0]).abs() < 1e-9);
    }

    #[test]
    fn test_van_der_corput() {
        assert_eq!(van_der_corput(0, 0), 0.0);
        assert_eq!(van_der_corput(1, 0), 0.5);
        assert_eq!(van_der_corput(2, 0), 0.25);
        assert_eq!(van_der_corput(3, 0), 0.75);
        assert_eq!(van_der_corput(0, 0x8000_0000), 0.5);
    }

    #[test]
    fn test_fnv32a() {
        assert_eq!(fnv32a(0), 0x4b95_f515);
        assert_eq!(fnv32a(1), 0xfb69_b604);
        let hashes: std::collections::HashSet<u32> = (0..3150).map(fnv32a).collect();
        assert_eq!(hashes.len(), 3150);
    }
}
