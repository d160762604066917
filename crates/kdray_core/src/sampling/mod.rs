//! Low-discrepancy sequences and warping functions.

mod halton;
mod pdf;
mod warp;

pub use halton::{fnv32a, van_der_corput, Halton};
pub use pdf::Pdf1D;
pub use warp::{add_mod1, cone, cos_hemisphere, shirley_disk, sphere};
