//! Output contracts from the core engine.
//!
//! Outputs carry the property changes applied this tick plus a list of
//! semantic events. Property writes also go straight to the registered
//! targets; the change list exists for adapters and tests that want to
//! observe what the frame did.

use serde::{Deserialize, Serialize};

use crate::ids::{TargetId, TimelineId, TriggerId, TweenId};
use crate::trigger::{ToggleAction, TriggerDirection};

/// One applied property value this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub target: TargetId,
    pub prop: String,
    pub value: f32,
}

/// Discrete semantic signals emitted during stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreEvent {
    TweenCompleted {
        tween: TweenId,
    },
    TimelineCompleted {
        timeline: TimelineId,
    },
    TimelineReverted {
        timeline: TimelineId,
    },
    TriggerFired {
        trigger: TriggerId,
        direction: TriggerDirection,
        action: ToggleAction,
    },
    /// A registration referenced a target that is not present; the
    /// registration degraded to a no-op.
    TargetMissing {
        target: TargetId,
    },
    /// A collaborator callback panicked; it was caught at the scheduler
    /// boundary and the owning tween was killed.
    CallbackPanicked {
        message: String,
    },
}

/// Outputs returned by `Engine::update()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
    #[serde(skip)]
    max_events: usize,
}

impl Outputs {
    pub(crate) fn with_capacity(changes: usize, max_events: usize) -> Self {
        Self {
            changes: Vec::with_capacity(changes),
            events: Vec::new(),
            max_events,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Push an event, dropping it once the per-tick cap is reached.
    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        if self.max_events == 0 || self.events.len() < self.max_events {
            self.events.push(event);
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }
}
