//! Kinema Core (host-agnostic)
//!
//! Scripted-motion orchestration: easings, tweens, offset-composed timelines,
//! viewport triggers and pointer interaction bindings, all stepped from one
//! cooperative per-frame clock. The crate owns scheduling and composition
//! only; hosts register opaque [`AnimationTarget`] surfaces, feed
//! [`Engine::update`] a frame delta plus input snapshot, and apply or observe
//! the resulting property batches.

pub mod compose;
pub mod config;
pub mod easing;
pub mod engine;
pub mod error;
pub mod ids;
pub mod inputs;
pub mod interaction;
pub mod outputs;
pub mod stored;
pub mod target;
pub mod timeline;
pub mod trigger;
pub mod tween;

// Re-exports for consumers (adapters)
pub use compose::Channel;
pub use config::Config;
pub use easing::Easing;
pub use engine::{Engine, MountedSection};
pub use error::{AnimationError, Result};
pub use ids::{BindingId, SectionId, TargetId, TimelineId, TriggerId, TweenId};
pub use inputs::{Inputs, PointerEvent, PointerEventKind, Viewport};
pub use interaction::InteractionSpec;
pub use outputs::{Change, CoreEvent, Outputs};
pub use stored::{parse_stored_section_json, SectionBlueprint, StoredSection};
pub use target::{AnimationTarget, PropertyBatch, PropertyWrite, Rect};
pub use timeline::{Offset, TimelineBuilder, TimelineState};
pub use trigger::{ToggleAction, TriggerDirection, TriggerSpec, TriggerState};
pub use tween::{Repeat, Segment, TweenSpec};
