//! Target contract: the opaque drawable surfaces the application layer hands
//! to the engine.
//!
//! The core never discovers targets itself; collaborators register them
//! explicitly and get back a [`TargetId`](crate::ids::TargetId). A target
//! exposes named numeric properties, accepts one batched write per frame, and
//! reports its document-space bounding box for trigger evaluation.

use serde::{Deserialize, Serialize};

/// Document-space bounding box of a target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

/// A drawable surface owned by the application layer.
///
/// The engine borrows it for the duration of an animation; all mutation goes
/// through [`apply`](AnimationTarget::apply) as one batch per frame.
pub trait AnimationTarget {
    /// Current value of a named property, or `None` if the property does not
    /// exist on this surface.
    fn get(&self, prop: &str) -> Option<f32>;

    /// Apply a batch of property writes atomically (one visual update).
    fn apply(&mut self, batch: &PropertyBatch);

    /// Current document-space bounding box, recomputed on demand so trigger
    /// evaluation always sees live geometry.
    fn bounds(&self) -> Rect;
}

/// One named-property write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyWrite {
    pub prop: String,
    pub value: f32,
}

impl PropertyWrite {
    pub fn new(prop: impl Into<String>, value: f32) -> Self {
        Self {
            prop: prop.into(),
            value,
        }
    }
}

/// A batch of property writes applied to one target in one frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyBatch(pub Vec<PropertyWrite>);

impl PropertyBatch {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, write: PropertyWrite) {
        self.0.push(write);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyWrite> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Value of `prop` within this batch, if present.
    pub fn value_of(&self, prop: &str) -> Option<f32> {
        self.0.iter().find(|w| w.prop == prop).map(|w| w.value)
    }
}

impl FromIterator<PropertyWrite> for PropertyBatch {
    fn from_iter<I: IntoIterator<Item = PropertyWrite>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
