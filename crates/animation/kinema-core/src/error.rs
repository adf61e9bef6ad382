//! Error types for the animation core.

use serde::{Deserialize, Serialize};

use crate::ids::{TargetId, TimelineId};

/// Error type for animation operations.
///
/// Structural errors (`InvalidTween`, `InvalidTrigger`, `UnknownEasing`,
/// `TimelineInUse`) are programmer errors and fail fast at construction or
/// registration time. `MissingTarget` is recoverable: sections are composed
/// independently, so registrations against a target that is not present
/// degrade to a no-op instead of breaking the page.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AnimationError {
    /// Bad tween parameters (non-positive duration, non-finite endpoints,
    /// unknown property on the target, empty segment list).
    #[error("invalid tween: {reason}")]
    InvalidTween { reason: String },

    /// Bad trigger parameters (threshold outside [0, 1]).
    #[error("invalid trigger: {reason}")]
    InvalidTrigger { reason: String },

    /// Easing name not recognized by `Easing::from_name`.
    #[error("unknown easing: {name}")]
    UnknownEasing { name: String },

    /// A tween, trigger or binding refers to a target that is not registered.
    #[error("target not registered: {target:?}")]
    MissingTarget { target: TargetId },

    /// The timeline is already owned by another trigger.
    #[error("timeline already owned by a trigger: {timeline:?}")]
    TimelineInUse { timeline: TimelineId },
}

pub type Result<T> = std::result::Result<T, AnimationError>;
