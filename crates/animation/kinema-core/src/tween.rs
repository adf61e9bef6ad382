//! Tween specification and clock math.
//!
//! A tween drives one or more properties of a single target from `from` to
//! `to` over `duration` seconds with an easing function. A multi-property
//! spec is exactly a set of parallel single-property tweens sharing one
//! clock. Runtime state lives in the engine; this module is data plus pure
//! time math.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compose::Channel;
use crate::easing::Easing;
use crate::error::AnimationError;
use crate::ids::TargetId;

/// One property lane of a tween.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub prop: String,
    pub from: f32,
    pub to: f32,
}

impl Segment {
    pub fn new(prop: impl Into<String>, from: f32, to: f32) -> Self {
        Self {
            prop: prop.into(),
            from,
            to,
        }
    }

    #[inline]
    pub fn value_at(&self, eased: f32) -> f32 {
        self.from + (self.to - self.from) * eased
    }

    /// Sample at pre-easing progress `p`. Endpoints are returned exactly so a
    /// completed tween lands on `to` and a fully reversed one restores `from`
    /// with no float drift, while overshooting easings still run free in
    /// between.
    #[inline]
    pub(crate) fn sample(&self, p: f32, easing: Easing) -> f32 {
        if p <= 0.0 {
            self.from
        } else if p >= 1.0 {
            self.to
        } else {
            self.value_at(easing.apply(p))
        }
    }
}

/// Repeat behavior. Ambient loops (float, breathe) run until killed and never
/// report completion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Repeat {
    #[default]
    Once,
    Infinite {
        yoyo: bool,
    },
}

/// Per-frame update callback, invoked with the raw interpolated value of the
/// first segment (callers that drive unrelated display state, e.g. a numeric
/// counter label, read it from here).
pub type UpdateFn = Box<dyn FnMut(f32) + 'static>;
/// Completion callback, invoked exactly once when the clock reaches
/// `duration`. Never invoked on kill.
pub type CompleteFn = Box<dyn FnOnce() + 'static>;

/// Specification for one tween.
pub struct TweenSpec {
    pub target: TargetId,
    pub segments: Vec<Segment>,
    /// Seconds; must be positive and finite.
    pub duration: f32,
    pub easing: Easing,
    pub channel: Channel,
    pub repeat: Repeat,
    pub(crate) on_update: Option<UpdateFn>,
    pub(crate) on_complete: Option<CompleteFn>,
}

impl TweenSpec {
    /// Single-property tween.
    pub fn new(target: TargetId, prop: impl Into<String>, from: f32, to: f32, duration: f32) -> Self {
        Self::multi(target, vec![Segment::new(prop, from, to)], duration)
    }

    /// Multi-property tween: parallel segments on one clock.
    pub fn multi(target: TargetId, segments: Vec<Segment>, duration: f32) -> Self {
        Self {
            target,
            segments,
            duration,
            easing: Easing::default(),
            channel: Channel::Base,
            repeat: Repeat::Once,
            on_update: None,
            on_complete: None,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn channel(mut self, channel: Channel) -> Self {
        self.channel = channel;
        self
    }

    /// Loop forever, reversing direction each cycle.
    pub fn repeat_yoyo(mut self) -> Self {
        self.repeat = Repeat::Infinite { yoyo: true };
        self
    }

    /// Loop forever, restarting from `from` each cycle.
    pub fn repeat_restart(mut self) -> Self {
        self.repeat = Repeat::Infinite { yoyo: false };
        self
    }

    pub fn on_update(mut self, f: impl FnMut(f32) + 'static) -> Self {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Structural validation; property existence is checked against the
    /// target at registration time.
    pub fn validate(&self) -> Result<(), AnimationError> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(AnimationError::InvalidTween {
                reason: format!("duration must be positive and finite, got {}", self.duration),
            });
        }
        if self.segments.is_empty() {
            return Err(AnimationError::InvalidTween {
                reason: "tween has no property segments".to_string(),
            });
        }
        for seg in &self.segments {
            if !(seg.from.is_finite() && seg.to.is_finite()) {
                return Err(AnimationError::InvalidTween {
                    reason: format!(
                        "segment '{}' endpoints must be finite, got {}..{}",
                        seg.prop, seg.from, seg.to
                    ),
                });
            }
        }
        Ok(())
    }

    /// Normalized clock position in [0, 1] before easing, respecting repeat
    /// behavior.
    pub(crate) fn cycle_progress(&self, elapsed: f32) -> f32 {
        match self.repeat {
            Repeat::Once => (elapsed / self.duration).clamp(0.0, 1.0),
            Repeat::Infinite { yoyo: true } => ping_pong(elapsed, self.duration) / self.duration,
            Repeat::Infinite { yoyo: false } => {
                let m = fmod(elapsed, self.duration);
                let m = if m < 0.0 { m + self.duration } else { m };
                m / self.duration
            }
        }
    }
}

impl fmt::Debug for TweenSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TweenSpec")
            .field("target", &self.target)
            .field("segments", &self.segments)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("channel", &self.channel)
            .field("repeat", &self.repeat)
            .field("on_update", &self.on_update.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Run a collaborator callback without letting a panic cross the scheduler
/// boundary. On panic the payload is logged and returned so the caller can
/// kill the owning tween.
pub(crate) fn run_guarded<F: FnOnce()>(what: &str, f: F) -> std::result::Result<(), String> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(()) => Ok(()),
        Err(payload) => {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "non-string panic payload".to_string()
            };
            log::error!("{what} callback panicked: {msg}");
            Err(msg)
        }
    }
}

pub(crate) fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Reflect t into [0, span] with ping-pong behavior (period = 2 * span).
pub(crate) fn ping_pong(t: f32, span: f32) -> f32 {
    if span <= 0.0 {
        return 0.0;
    }
    let period = 2.0 * span;
    let m = fmod(t, period);
    if m < 0.0 {
        let mm = m + period;
        if mm <= span {
            mm
        } else {
            period - mm
        }
    } else if m <= span {
        m
    } else {
        period - m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_bad_durations_and_endpoints() {
        let t = TargetId(0);
        assert!(TweenSpec::new(t, "opacity", 0.0, 1.0, 0.0).validate().is_err());
        assert!(TweenSpec::new(t, "opacity", 0.0, 1.0, -1.0).validate().is_err());
        assert!(TweenSpec::new(t, "opacity", 0.0, 1.0, f32::NAN).validate().is_err());
        assert!(TweenSpec::new(t, "opacity", f32::INFINITY, 1.0, 1.0)
            .validate()
            .is_err());
        assert!(TweenSpec::multi(t, vec![], 1.0).validate().is_err());
        assert!(TweenSpec::new(t, "opacity", 0.0, 1.0, 0.8).validate().is_ok());
    }

    #[test]
    fn yoyo_progress_reflects() {
        let spec = TweenSpec::new(TargetId(0), "y", 0.0, -15.0, 3.0).repeat_yoyo();
        assert_eq!(spec.cycle_progress(0.0), 0.0);
        assert_eq!(spec.cycle_progress(3.0), 1.0);
        assert_eq!(spec.cycle_progress(4.5), 0.5);
        assert_eq!(spec.cycle_progress(6.0), 0.0);
    }

    #[test]
    fn once_progress_clamps() {
        let spec = TweenSpec::new(TargetId(0), "y", 0.0, 1.0, 2.0);
        assert_eq!(spec.cycle_progress(5.0), 1.0);
    }
}
