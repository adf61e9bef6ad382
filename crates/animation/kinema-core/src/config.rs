//! Core configuration for kinema-core.

use serde::{Deserialize, Serialize};

/// Configuration for engine sizing and interaction defaults.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Initial capacity hints for the per-frame buffers.
    pub tween_capacity: usize,
    pub change_capacity: usize,

    /// Maximum events retained per tick; later events in the same tick are
    /// dropped once the cap is reached.
    pub max_events_per_tick: usize,

    /// Default duration in seconds for pointer-move response tweens.
    pub move_duration: f32,
    /// Default duration in seconds for the pointer-leave return-to-rest tween.
    /// Slightly longer than `move_duration` so the settle reads as a spring.
    pub rest_duration: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tween_capacity: 64,
            change_capacity: 256,
            max_events_per_tick: 1024,
            move_duration: 0.3,
            rest_duration: 0.5,
        }
    }
}
