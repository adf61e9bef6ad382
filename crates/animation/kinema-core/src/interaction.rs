//! Interaction tracker: pointer-driven transform offsets (tilt, parallax,
//! magnetic attraction).
//!
//! A binding owns a small set of offset properties on one target. Every
//! pointer-move retargets a short ease-out tween toward the freshly computed
//! deltas, killing the previous one first (last-move-wins; stale interaction
//! frames are never queued). Pointer-leave starts a longer elastic tween back
//! to the rest snapshot, so the target never stays displaced after the
//! interaction ends. All writes go to the Offset channel; the tracker never
//! touches trigger play/reverse state.

use hashbrown::HashMap;

use crate::compose::{Channel, FrameAccumulator};
use crate::easing::Easing;
use crate::error::AnimationError;
use crate::ids::{BindingId, SectionId, TargetId};
use crate::outputs::{CoreEvent, Outputs};
use crate::target::PropertyWrite;
use crate::tween::{run_guarded, Segment};

/// Maps the pointer offset from the target center to per-property deltas,
/// e.g. `|dx, dy| vec![rotateX: dy / 20.0, rotateY: -dx / 20.0]`.
pub type ResponseFn = Box<dyn FnMut(f32, f32) -> Vec<PropertyWrite> + 'static>;

/// Interaction binding configuration. Durations default from [`Config`]
/// (move ~0.3s ease-out, rest slightly longer with an elastic settle).
///
/// [`Config`]: crate::config::Config
pub struct InteractionSpec {
    pub target: TargetId,
    /// Offset properties this binding owns. Deltas for undeclared properties
    /// are ignored.
    pub props: Vec<String>,
    pub(crate) response: ResponseFn,
    pub move_duration: Option<f32>,
    pub move_easing: Easing,
    pub rest_duration: Option<f32>,
    pub rest_easing: Easing,
}

impl InteractionSpec {
    pub fn new(
        target: TargetId,
        props: Vec<impl Into<String>>,
        response: impl FnMut(f32, f32) -> Vec<PropertyWrite> + 'static,
    ) -> Self {
        Self {
            target,
            props: props.into_iter().map(Into::into).collect(),
            response: Box::new(response),
            move_duration: None,
            move_easing: Easing::QuadOut,
            rest_duration: None,
            rest_easing: Easing::elastic_out(),
        }
    }

    pub fn move_duration(mut self, seconds: f32) -> Self {
        self.move_duration = Some(seconds);
        self
    }

    pub fn rest_duration(mut self, seconds: f32) -> Self {
        self.rest_duration = Some(seconds);
        self
    }

    pub fn move_easing(mut self, easing: Easing) -> Self {
        self.move_easing = easing;
        self
    }

    pub fn rest_easing(mut self, easing: Easing) -> Self {
        self.rest_easing = easing;
        self
    }

    pub fn validate(&self) -> Result<(), AnimationError> {
        if self.props.is_empty() {
            return Err(AnimationError::InvalidTween {
                reason: "interaction binding declares no properties".to_string(),
            });
        }
        for d in [self.move_duration, self.rest_duration].into_iter().flatten() {
            if !(d.is_finite() && d > 0.0) {
                return Err(AnimationError::InvalidTween {
                    reason: format!("interaction duration must be positive and finite, got {d}"),
                });
            }
        }
        Ok(())
    }
}

/// A response or rest tween over the binding's offset lanes.
struct OffsetTween {
    lanes: Vec<Segment>,
    elapsed: f32,
    duration: f32,
    easing: Easing,
}

pub(crate) struct Binding {
    pub id: BindingId,
    pub section: SectionId,
    pub target: TargetId,
    response: ResponseFn,
    move_duration: f32,
    move_easing: Easing,
    rest_duration: f32,
    rest_easing: Easing,
    /// Current offset per declared property.
    offsets: HashMap<String, f32>,
    /// Snapshot taken at bind time; pointer-leave always converges here.
    rest: HashMap<String, f32>,
    active: Option<OffsetTween>,
    pub disabled: bool,
}

impl Binding {
    pub fn new(
        id: BindingId,
        section: SectionId,
        spec: InteractionSpec,
        default_move: f32,
        default_rest: f32,
    ) -> Self {
        let offsets: HashMap<String, f32> =
            spec.props.iter().map(|p| (p.clone(), 0.0_f32)).collect();
        Self {
            id,
            section,
            target: spec.target,
            response: spec.response,
            move_duration: spec.move_duration.unwrap_or(default_move),
            move_easing: spec.move_easing,
            rest_duration: spec.rest_duration.unwrap_or(default_rest),
            rest_easing: spec.rest_easing,
            rest: offsets.clone(),
            offsets,
            active: None,
            disabled: false,
        }
    }

    /// Pointer moved: recompute deltas and retarget. The previous response
    /// tween (or an in-flight rest tween) is killed first.
    pub fn on_move(&mut self, dx: f32, dy: f32, outputs: &mut Outputs) {
        if self.disabled {
            return;
        }
        let mut deltas: Vec<PropertyWrite> = Vec::new();
        let response = &mut self.response;
        if let Err(message) = run_guarded("interaction response", || {
            deltas = response(dx, dy);
        }) {
            outputs.push_event(CoreEvent::CallbackPanicked { message });
            self.disabled = true;
            self.active = None;
            return;
        }
        let lanes: Vec<Segment> = deltas
            .into_iter()
            .filter_map(|w| {
                let from = *self.offsets.get(&w.prop)?;
                Some(Segment::new(w.prop, from, w.value))
            })
            .collect();
        if lanes.is_empty() {
            return;
        }
        self.active = Some(OffsetTween {
            lanes,
            elapsed: 0.0,
            duration: self.move_duration,
            easing: self.move_easing,
        });
    }

    /// Pointer left: converge every declared property back to the rest
    /// snapshot. A rapid re-enter supersedes this via `on_move`.
    pub fn on_leave(&mut self) {
        if self.disabled {
            return;
        }
        let lanes: Vec<Segment> = self
            .offsets
            .iter()
            .map(|(prop, from)| Segment::new(prop.clone(), *from, self.rest[prop]))
            .collect();
        self.active = Some(OffsetTween {
            lanes,
            elapsed: 0.0,
            duration: self.rest_duration,
            easing: self.rest_easing,
        });
    }

    /// Advance the active tween and contribute this frame's offsets.
    /// Completion lands on exact lane end values, so a finished rest tween
    /// leaves zero residual offset. The completion frame itself still pushes,
    /// even when the landed offsets equal rest, so the target receives the
    /// exact final values instead of keeping the penultimate sample.
    pub fn advance(&mut self, dt: f32, accum: &mut FrameAccumulator) {
        if self.disabled {
            return;
        }
        let mut finished = false;
        if let Some(tween) = self.active.as_mut() {
            tween.elapsed += dt;
            let p = (tween.elapsed / tween.duration).clamp(0.0, 1.0);
            for lane in &tween.lanes {
                self.offsets
                    .insert(lane.prop.clone(), lane.sample(p, tween.easing));
            }
            if p >= 1.0 {
                self.active = None;
                finished = true;
            }
        }
        if finished
            || self.active.is_some()
            || self.offsets.iter().any(|(p, v)| *v != self.rest[p])
        {
            for (prop, value) in &self.offsets {
                accum.push(self.target, prop, *value, Channel::Offset);
            }
        }
    }

    /// Current offset of a declared property (tests and adapters).
    pub fn offset(&self, prop: &str) -> Option<f32> {
        self.offsets.get(prop).copied()
    }
}
