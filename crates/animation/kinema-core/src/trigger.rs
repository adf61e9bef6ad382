//! Viewport trigger registry: maps scroll crossings to timeline actions.
//!
//! A trigger watches its target's live geometry against a viewport threshold
//! and fires a toggle action when the target's top edge crosses it: once on
//! the way down into view, once on the way back out. Geometry is recomputed
//! from `target.bounds()` inside `Engine::update` only, so any burst of
//! scroll events collapses to one evaluation per frame.

use serde::{Deserialize, Serialize};

use crate::error::AnimationError;
use crate::ids::{SectionId, TargetId, TimelineId, TriggerId};
use crate::inputs::Viewport;
use crate::target::Rect;

/// Action applied to the attached timeline on a crossing event.
/// `None` freezes the state machine once reached (one-shot reveals).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ToggleAction {
    #[default]
    Play,
    Reverse,
    None,
}

impl ToggleAction {
    /// Parse the stored-format spelling.
    pub fn from_name(name: &str) -> Result<Self, AnimationError> {
        match name {
            "play" => Ok(ToggleAction::Play),
            "reverse" => Ok(ToggleAction::Reverse),
            "none" => Ok(ToggleAction::None),
            _ => Err(AnimationError::InvalidTrigger {
                reason: format!("unknown toggle action '{name}'"),
            }),
        }
    }
}

/// Which way the threshold was crossed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum TriggerDirection {
    /// Scrolled down into view.
    Forward,
    /// Scrolled back up out of view.
    Backward,
}

/// Trigger configuration.
///
/// `threshold` is a fraction of viewport height: `0.85` fires when the
/// target's top edge rises above 85% of the viewport (the stored-format
/// `start: "top 85%"`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub target: TargetId,
    pub threshold: f32,
    pub on_enter_forward: ToggleAction,
    pub on_enter_backward: ToggleAction,
    pub timeline: TimelineId,
}

impl TriggerSpec {
    /// Play on downward entry, reverse on upward exit. The default reveal
    /// policy.
    pub fn play_reverse(target: TargetId, threshold: f32, timeline: TimelineId) -> Self {
        Self {
            target,
            threshold,
            on_enter_forward: ToggleAction::Play,
            on_enter_backward: ToggleAction::Reverse,
            timeline,
        }
    }

    /// Play once on downward entry and stay played.
    pub fn play_once(target: TargetId, threshold: f32, timeline: TimelineId) -> Self {
        Self {
            on_enter_backward: ToggleAction::None,
            ..Self::play_reverse(target, threshold, timeline)
        }
    }

    pub fn validate(&self) -> Result<(), AnimationError> {
        if !(self.threshold.is_finite() && (0.0..=1.0).contains(&self.threshold)) {
            return Err(AnimationError::InvalidTrigger {
                reason: format!(
                    "threshold must be a fraction of viewport height in [0, 1], got {}",
                    self.threshold
                ),
            });
        }
        Ok(())
    }
}

/// Trigger lifecycle: `Unarmed` until the first downward crossing, then
/// oscillating between `Played` and `Reverted` as the toggle policy allows.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum TriggerState {
    #[default]
    Unarmed,
    Played,
    Reverted,
}

pub(crate) struct Trigger {
    pub id: TriggerId,
    pub section: SectionId,
    pub spec: TriggerSpec,
    pub state: TriggerState,
    /// Whether the target was in view at the last evaluation; `None` before
    /// the first one so an initially-visible target still fires Forward.
    pub in_view: Option<bool>,
    /// Set when the target disappears; a disabled trigger never fires again.
    pub disabled: bool,
}

impl Trigger {
    pub fn new(id: TriggerId, section: SectionId, spec: TriggerSpec) -> Self {
        Self {
            id,
            section,
            spec,
            state: TriggerState::Unarmed,
            in_view: None,
            disabled: false,
        }
    }

    /// Evaluate against live geometry. Returns the crossing direction when
    /// the in-view state changed this frame. Exactly one `Forward` fires per
    /// continuous downward crossing because the edge is detected on the
    /// in-view flank, not on absolute position.
    pub fn evaluate(&mut self, bounds: Rect, viewport: Viewport) -> Option<TriggerDirection> {
        if self.disabled {
            return None;
        }
        let top_in_viewport = bounds.y - viewport.scroll_y;
        let now_in_view = top_in_viewport <= self.spec.threshold * viewport.height;
        let was_in_view = self.in_view.replace(now_in_view);
        match (was_in_view, now_in_view) {
            (None | Some(false), true) => Some(TriggerDirection::Forward),
            (Some(true), false) => Some(TriggerDirection::Backward),
            _ => None,
        }
    }

    /// Action configured for a crossing, honoring the frozen-state rule:
    /// `None` on the relevant flank freezes the machine once reached.
    pub fn action_for(&self, direction: TriggerDirection) -> ToggleAction {
        match direction {
            TriggerDirection::Forward => self.spec.on_enter_forward,
            TriggerDirection::Backward => self.spec.on_enter_backward,
        }
    }

    /// Record the state transition implied by an executed action.
    pub fn transition(&mut self, direction: TriggerDirection, action: ToggleAction) {
        match (direction, action) {
            (TriggerDirection::Forward, ToggleAction::Play) => self.state = TriggerState::Played,
            (TriggerDirection::Backward, ToggleAction::Reverse) => {
                if self.state == TriggerState::Played {
                    self.state = TriggerState::Reverted;
                }
            }
            // A `None` slot leaves the state frozen where it is.
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp(scroll_y: f32) -> Viewport {
        Viewport {
            scroll_y,
            height: 800.0,
        }
    }

    #[test]
    fn forward_fires_once_per_continuous_crossing() {
        let spec = TriggerSpec::play_reverse(TargetId(0), 0.85, TimelineId(0));
        let mut trig = Trigger::new(TriggerId(0), SectionId(0), spec);
        let bounds = Rect::new(0.0, 1500.0, 400.0, 300.0);

        // Far above the threshold line: not in view.
        assert_eq!(trig.evaluate(bounds, vp(0.0)), None);
        // Crosses: 1500 - 900 = 600 <= 0.85 * 800 = 680.
        assert_eq!(
            trig.evaluate(bounds, vp(900.0)),
            Some(TriggerDirection::Forward)
        );
        // Scrolling further down does not re-fire.
        assert_eq!(trig.evaluate(bounds, vp(1000.0)), None);
        assert_eq!(trig.evaluate(bounds, vp(1200.0)), None);
        // Back up out of view fires Backward once.
        assert_eq!(
            trig.evaluate(bounds, vp(0.0)),
            Some(TriggerDirection::Backward)
        );
        assert_eq!(trig.evaluate(bounds, vp(10.0)), None);
    }

    #[test]
    fn initially_visible_target_fires_forward_on_first_evaluation() {
        let spec = TriggerSpec::play_reverse(TargetId(0), 0.85, TimelineId(0));
        let mut trig = Trigger::new(TriggerId(0), SectionId(0), spec);
        let bounds = Rect::new(0.0, 100.0, 400.0, 300.0);
        assert_eq!(
            trig.evaluate(bounds, vp(0.0)),
            Some(TriggerDirection::Forward)
        );
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let mut spec = TriggerSpec::play_reverse(TargetId(0), 1.5, TimelineId(0));
        assert!(spec.validate().is_err());
        spec.threshold = f32::NAN;
        assert!(spec.validate().is_err());
        spec.threshold = 0.8;
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn none_action_freezes_state() {
        let spec = TriggerSpec::play_once(TargetId(0), 0.8, TimelineId(0));
        let mut trig = Trigger::new(TriggerId(0), SectionId(0), spec);
        trig.transition(TriggerDirection::Forward, ToggleAction::Play);
        assert_eq!(trig.state, TriggerState::Played);
        trig.transition(TriggerDirection::Backward, ToggleAction::None);
        assert_eq!(trig.state, TriggerState::Played);
    }
}
