//! Input contracts for the core engine.
//!
//! Adapters build one `Inputs` per frame and pass it into `Engine::update()`.
//! Only the latest viewport matters: a burst of scroll events between two
//! frames collapses to a single snapshot, which is what throttles trigger
//! evaluation to at most once per frame.

use serde::{Deserialize, Serialize};

use crate::ids::TargetId;

/// Scroll state of the host viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Document-space y of the viewport top edge.
    pub scroll_y: f32,
    /// Visible height.
    pub height: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PointerEventKind {
    /// Pointer moved over the bound region; coordinates are document-space.
    Move { x: f32, y: f32 },
    /// Pointer left the bound region.
    Leave,
}

/// A pointer event routed to the interaction binding(s) on `target`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub target: TargetId,
    pub kind: PointerEventKind,
}

impl PointerEvent {
    pub fn moved(target: TargetId, x: f32, y: f32) -> Self {
        Self {
            target,
            kind: PointerEventKind::Move { x, y },
        }
    }

    pub fn left(target: TargetId) -> Self {
        Self {
            target,
            kind: PointerEventKind::Leave,
        }
    }
}

/// Per-frame inputs. `viewport: None` keeps the previous snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Inputs {
    #[serde(default)]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub pointer: Vec<PointerEvent>,
}

impl Inputs {
    pub fn with_viewport(viewport: Viewport) -> Self {
        Self {
            viewport: Some(viewport),
            pointer: Vec::new(),
        }
    }
}
