use kdray_core::{Background, RenderState};
use kdray_math::{Ray, Rgb};
use serde::{Deserialize, Serialize};

/// The same colour in every direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstantBackground {
    pub color: Rgb,
}

impl ConstantBackground {
    pub fn new(color: Rgb) -> Self {
        Self { color }
    }
}

impl Background for ConstantBackground {
    fn color(&self, _ray: &Ray, _state: &RenderState, _filtered: bool) -> Rgb {
        self.color
    }
}
