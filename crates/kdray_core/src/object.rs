//! Scene objects: named collections of primitives.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::primitive::Primitive;

/// Object handle. Issued from 1 upward; 0 is never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub trait Object3d: Send + Sync {
    fn primitives(&self) -> Vec<Arc<dyn Primitive>>;

    fn is_visible(&self) -> bool {
        true
    }
}

/// An object holding a single primitive.
pub struct PrimitiveObject {
    primitive: Arc<dyn Primitive>,
    hidden: bool,
}

impl PrimitiveObject {
    pub fn new(primitive: impl Primitive + 'static) -> Self {
        Self {
            primitive: Arc::new(primitive),
            hidden: false,
        }
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }
}

impl Object3d for PrimitiveObject {
    fn primitives(&self) -> Vec<Arc<dyn Primitive>> {
        vec![self.primitive.clone()]
    }

    fn is_visible(&self) -> bool {
        !self.hidden
    }
}
